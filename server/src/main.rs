mod config;
mod db;
mod error;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::services::notify::{LogNotifier, Notifier, ResendNotifier};
use crate::services::persistence::{MemoryStore, PgStore, SigningStore};
use crate::services::signing::SigningWorkflow;
use crate::services::token::TokenPolicy;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_file = match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => return Err(e.into()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("server=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Some(path) = env_file {
        info!(path = %path.display(), "loaded environment file");
    }

    let config = ServerConfig::from_env()?;

    let store: Arc<dyn SigningStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections).await?;
            info!(max_connections = config.db_max_connections, "postgres store ready");
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; contracts are kept in memory and lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.resend {
        Some(resend) => {
            info!(from = %resend.from, "email notifications enabled");
            Arc::new(ResendNotifier::new(resend))
        }
        None => {
            warn!("RESEND_API_KEY not set; signing links are logged instead of emailed");
            Arc::new(LogNotifier)
        }
    };

    let workflow = SigningWorkflow::new(store, notifier, TokenPolicy::new(config.token_ttl), &config.public_base_url);
    let app = routes::app(state::AppState::new(workflow));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, base_url = %config.public_base_url, "signing server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
