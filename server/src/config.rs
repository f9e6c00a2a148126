//! Server configuration loaded from environment variables.
//!
//! Every knob has a default so the server starts with an empty environment:
//! no `DATABASE_URL` means an in-memory store, no Resend credentials means
//! notifications are only logged.

use time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("PUBLIC_BASE_URL must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("RESEND_API_KEY is set but RESEND_FROM is missing")]
    MissingResendFrom,
}

/// Credentials for outbound email through Resend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendConfig {
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Origin signing links are built against, without a trailing slash.
    pub public_base_url: String,
    pub resend: Option<ResendConfig>,
    /// Lifetime of a signing token once its signer becomes pending. `None`
    /// means tokens never expire.
    pub token_ttl: Option<Duration>,
}

impl ServerConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for values that are present but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for values that are present but unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let public_base_url = var("PUBLIC_BASE_URL").unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_owned());
        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(public_base_url));
        }

        let resend = match (var("RESEND_API_KEY"), var("RESEND_FROM")) {
            (Some(api_key), Some(from)) => Some(ResendConfig { api_key, from }),
            (Some(_), None) => return Err(ConfigError::MissingResendFrom),
            (None, _) => None,
        };

        let ttl_hours: i64 = env_parse(var("SIGNING_TOKEN_TTL_HOURS"), 0);

        Ok(Self {
            port: env_parse(var("PORT"), DEFAULT_PORT),
            database_url: var("DATABASE_URL"),
            db_max_connections: env_parse(var("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS),
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
            resend,
            token_ttl: (ttl_hours > 0).then(|| Duration::hours(ttl_hours)),
        })
    }
}

/// Parse `raw`, falling back to `default` when missing or malformed.
fn env_parse<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match raw.map(|v| v.parse::<T>()) {
        Some(Ok(value)) => value,
        _ => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
