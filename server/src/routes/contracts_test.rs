use axum::http::StatusCode;
use canvas::camera::Point;
use canvas::doc::{Field, FieldKind};
use serde_json::json;
use uuid::Uuid;

use crate::services::token::TokenPolicy;
use crate::state::test_helpers::{call, send_body, test_app};

#[tokio::test]
async fn fields_round_trip() {
    let (app, _, _) = test_app(TokenPolicy::default());
    let id = Uuid::new_v4();
    let record = Field::new(FieldKind::Signature, Point::new(40.0, 60.0)).to_record(id);

    let (status, saved) = call(&app, "POST", &format!("/api/contracts/{id}/fields"), Some(json!([record]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved[0]["field_type"], "signature");
    assert_eq!(saved[0]["contract_id"], json!(id));

    let (status, loaded) = call(&app, "GET", &format!("/api/contracts/{id}/fields"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded, saved);
}

#[tokio::test]
async fn send_then_status() {
    let (app, _, notifier) = test_app(TokenPolicy::default());
    let id = Uuid::new_v4();

    let (status, body) = call(&app, "POST", &format!("/api/contracts/{id}/send"), Some(send_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["signing"]["status"], "pending_first_signature");
    assert_eq!(body["notified"], 0);
    assert_eq!(notifier.sent().len(), 1);

    let (status, body) = call(&app, "GET", &format!("/api/contracts/{id}/signing"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["signers"][0]["status"], "pending");
    assert_eq!(body["signers"][1]["status"], "waiting");
    assert!(body["signers"][0].get("token").is_none());
}

#[tokio::test]
async fn send_twice_conflicts() {
    let (app, _, _) = test_app(TokenPolicy::default());
    let id = Uuid::new_v4();
    call(&app, "POST", &format!("/api/contracts/{id}/send"), Some(send_body())).await;

    let (status, body) = call(&app, "POST", &format!("/api/contracts/{id}/send"), Some(send_body())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "E_ALREADY_SENT");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn send_with_one_signer_is_unprocessable() {
    let (app, _, _) = test_app(TokenPolicy::default());
    let id = Uuid::new_v4();
    let mut body = send_body();
    body["signers"].as_array_mut().unwrap().pop();

    let (status, body) = call(&app, "POST", &format!("/api/contracts/{id}/send"), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "E_INVALID_SIGNERS");
}

#[tokio::test]
async fn resend_pending_and_waiting() {
    let (app, _, notifier) = test_app(TokenPolicy::default());
    let id = Uuid::new_v4();
    call(&app, "POST", &format!("/api/contracts/{id}/send"), Some(send_body())).await;

    let (status, _) = call(&app, "POST", &format!("/api/contracts/{id}/signers/0/resend"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notifier.sent().len(), 2);

    let (status, body) = call(&app, "POST", &format!("/api/contracts/{id}/signers/1/resend"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "E_NOT_PENDING");
}

#[tokio::test]
async fn resend_unknown_contract_is_not_found() {
    let (app, _, _) = test_app(TokenPolicy::default());
    let (status, _) = call(&app, "POST", &format!("/api/contracts/{}/signers/0/resend", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
