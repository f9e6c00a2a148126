//! Fixtures shared by service and route tests.

use std::sync::Mutex;

use async_trait::async_trait;
use canvas::doc::{ContractId, FieldRecord};
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

use super::*;
use crate::services::notify::{Notification, Notifier, NotifyError};
use crate::services::persistence::{MemoryStore, SigningStore, StoreError};
use crate::services::signing::{SignerInvite, SignerRecord};
use crate::services::token::TokenPolicy;

pub const BASE_URL: &str = "https://sign.example.com";
pub const T0: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

/// Captures notifications instead of delivering them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Always fails delivery.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp unavailable".into()))
    }
}

/// Always fails with a database error.
pub struct FailingStore;

#[async_trait]
impl SigningStore for FailingStore {
    async fn load_signers(&self, _id: ContractId) -> Result<Option<SignerRecord>, StoreError> {
        Err(StoreError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn save_signers(&self, _id: ContractId, _r: &SignerRecord, _v: i64) -> Result<(), StoreError> {
        Err(StoreError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn load_fields(&self, _id: ContractId) -> Result<Vec<FieldRecord>, StoreError> {
        Err(StoreError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn save_fields(&self, _id: ContractId, _f: &[FieldRecord]) -> Result<(), StoreError> {
        Err(StoreError::Db(sqlx::Error::PoolTimedOut))
    }
}

/// A settable clock starting at [`T0`].
#[derive(Clone)]
pub struct TestClock(pub Arc<Mutex<OffsetDateTime>>);

impl TestClock {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(T0)))
    }

    pub fn advance(&self, by: time::Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }

    pub fn as_clock(&self) -> crate::services::signing::Clock {
        let inner = Arc::clone(&self.0);
        Arc::new(move || *inner.lock().unwrap())
    }
}

pub struct Harness {
    pub workflow: SigningWorkflow,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: TestClock,
}

pub fn harness(policy: TokenPolicy) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = TestClock::new();
    let workflow = SigningWorkflow::new(store.clone(), notifier.clone(), policy, BASE_URL)
        .with_clock(clock.as_clock());
    Harness { workflow, store, notifier, clock }
}

pub fn invites() -> Vec<SignerInvite> {
    vec![
        SignerInvite { client_id: Uuid::new_v4(), email: "ada@example.com".into(), name: "Ada".into() },
        SignerInvite { client_id: Uuid::new_v4(), email: "grace@example.com".into(), name: "Grace".into() },
    ]
}

/// Token of the signer at `index`.
pub async fn token_of(store: &MemoryStore, document_id: ContractId, index: usize) -> String {
    store.load_signers(document_id).await.unwrap().unwrap().signers[index].token.clone()
}

// =============================================================================
// HTTP
// =============================================================================

/// Route-test app backed by a fresh harness.
pub fn test_app(policy: TokenPolicy) -> (axum::Router, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let Harness { workflow, store, notifier, .. } = harness(policy);
    (crate::routes::app(AppState::new(workflow)), store, notifier)
}

/// Issue one request and decode the JSON response body (`Null` when empty).
pub async fn call(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let builder = axum::http::Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

pub fn send_body() -> serde_json::Value {
    let people = invites();
    serde_json::json!({
        "title": "Lease",
        "signers": people.iter().map(|p| serde_json::json!({
            "client_id": p.client_id,
            "email": p.email,
            "name": p.name,
        })).collect::<Vec<_>>(),
    })
}
