//! Signer-facing routes behind the emailed link.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::signing_error;
use crate::services::signing::{Outcome, SignatureInput, SignerView, SigningError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LinkQuery {
    pub token: Option<String>,
}

impl LinkQuery {
    fn token(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or_else(|| signing_error(SigningError::InvalidLink))
    }
}

/// `GET /sign/:id?token=`: check the link and show the signer their fields.
pub async fn open_link(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Query(query): Query<LinkQuery>,
) -> Result<Json<SignerView>, ApiError> {
    let view = state
        .workflow
        .validate_link(contract_id, query.token()?)
        .await
        .map_err(signing_error)?;
    Ok(Json(view))
}

/// `POST /sign/:id?token=`: record the signer's typed signature.
pub async fn submit_signature(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Query(query): Query<LinkQuery>,
    Json(input): Json<SignatureInput>,
) -> Result<Json<Outcome>, ApiError> {
    let outcome = state
        .workflow
        .complete(contract_id, query.token()?, input)
        .await
        .map_err(signing_error)?;
    Ok(Json(outcome))
}

#[cfg(test)]
#[path = "sign_test.rs"]
mod tests;
