//! Sender-facing contract routes: field list, dispatch, status, resend.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use canvas::doc::FieldRecord;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::signing_error;
use crate::services::signing::{Outcome, SignerInvite, SigningStatus};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SendBody {
    #[serde(default)]
    pub title: String,
    pub signers: Vec<SignerInvite>,
}

/// `GET /api/contracts/:id/fields`
pub async fn get_fields(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Vec<FieldRecord>>, ApiError> {
    let fields = state.workflow.fields(contract_id).await.map_err(signing_error)?;
    Ok(Json(fields))
}

/// `POST /api/contracts/:id/fields`: replace the field list; returns it normalized.
pub async fn save_fields(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(fields): Json<Vec<FieldRecord>>,
) -> Result<Json<Vec<FieldRecord>>, ApiError> {
    let saved = state.workflow.save_fields(contract_id, fields).await.map_err(signing_error)?;
    Ok(Json(saved))
}

/// `POST /api/contracts/:id/send`: send for signature.
pub async fn send(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(body): Json<SendBody>,
) -> Result<(StatusCode, Json<Outcome>), ApiError> {
    let outcome = state
        .workflow
        .dispatch(contract_id, &body.title, body.signers)
        .await
        .map_err(signing_error)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /api/contracts/:id/signing`
pub async fn signing_status(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<SigningStatus>, ApiError> {
    let status = state.workflow.status(contract_id).await.map_err(signing_error)?;
    Ok(Json(status))
}

/// `POST /api/contracts/:id/signers/:index/resend`
pub async fn resend(
    State(state): State<AppState>,
    Path((contract_id, index)): Path<(Uuid, usize)>,
) -> Result<Json<Outcome>, ApiError> {
    let outcome = state.workflow.resend(contract_id, index).await.map_err(signing_error)?;
    Ok(Json(outcome))
}

#[cfg(test)]
#[path = "contracts_test.rs"]
mod tests;
