//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sender-facing contract routes live under `/api/contracts`; the signer's
//! link resolves at `/sign/{id}`. Every failure leaves as an [`ApiError`]
//! JSON body.

pub mod contracts;
pub mod sign;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::ApiError;
use crate::services::signing::SigningError;
use crate::state::AppState;

/// The full HTTP surface.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/contracts/{id}/fields",
            get(contracts::get_fields).post(contracts::save_fields),
        )
        .route("/api/contracts/{id}/send", post(contracts::send))
        .route("/api/contracts/{id}/signing", get(contracts::signing_status))
        .route("/api/contracts/{id}/signers/{index}/resend", post(contracts::resend))
        .route("/sign/{id}", get(sign::open_link).post(sign::submit_signature))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Pair a workflow error with its HTTP status.
pub(crate) fn signing_error(err: SigningError) -> ApiError {
    if let SigningError::Store(e) = &err {
        error!(error = %e, "signing store failure");
    }
    let status = match &err {
        SigningError::InvalidLink => StatusCode::FORBIDDEN,
        SigningError::NotFound(_) | SigningError::SignerNotFound(_) => StatusCode::NOT_FOUND,
        SigningError::AlreadyDispatched
        | SigningError::NotPending(_)
        | SigningError::InvalidTransition { .. }
        | SigningError::Conflict => StatusCode::CONFLICT,
        SigningError::InvalidSignerCount(_) | SigningError::InvalidSigner(_) | SigningError::InvalidSignature(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SigningError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        SigningError::Notify(_) => StatusCode::BAD_GATEWAY,
    };
    ApiError::new(status, &err)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
