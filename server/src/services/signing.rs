//! Two-party signing workflow.
//!
//! DESIGN
//! ======
//! A contract moves `draft → pending_first_signature →
//! pending_second_signature → completed`. The document status is never set
//! directly: it is derived from the signer statuses after every transition,
//! so the two can't disagree. Signer statuses only move forward
//! (`waiting → pending → completed`).
//!
//! Every transition reads the signer record, computes the next record in
//! memory, and writes it back with the version it read. A concurrent writer
//! bumps the version first and the losing write is rejected as a retryable
//! conflict; nothing is partially applied.
//!
//! ERROR HANDLING
//! ==============
//! Any bad token (unknown, out of turn, already used, expired) surfaces as
//! [`SigningError::InvalidLink`]. Notification failures after a successful
//! write are logged and reported as a warning on the outcome; the signature
//! is authoritative and is never rolled back.

use std::sync::Arc;

use canvas::doc::{ClientId, ContractId, Field, FieldRecord};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::services::notify::{Notification, Notifier, NotifyError};
use crate::services::persistence::{SigningStore, StoreError};
use crate::services::token::{TokenPolicy, generate_tokens, signing_link, tokens_match};

/// Signers per contract.
pub const SIGNER_COUNT: usize = 2;

// =============================================================================
// STATUS
// =============================================================================

/// A signer's place in the signing order. Ordered: later variants are further along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerStatus {
    /// Not their turn yet.
    Waiting,
    /// Their link is live.
    Pending,
    /// Signed.
    Completed,
}

impl SignerStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Status only ever moves forward.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        next > self
    }
}

/// Contract signing status, derived from its signers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    PendingFirstSignature,
    PendingSecondSignature,
    Completed,
}

impl DocumentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingFirstSignature => "pending_first_signature",
            Self::PendingSecondSignature => "pending_second_signature",
            Self::Completed => "completed",
        }
    }

    /// The only status consistent with `signers`.
    #[must_use]
    pub fn derive(signers: &[Signer]) -> Self {
        if signers.is_empty() {
            return Self::Draft;
        }
        let completed = signers.iter().filter(|s| s.status == SignerStatus::Completed).count();
        if completed == signers.len() {
            Self::Completed
        } else if completed == 0 {
            Self::PendingFirstSignature
        } else {
            Self::PendingSecondSignature
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// What a signer submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub typed_signature: String,
    #[serde(with = "time::serde::rfc3339")]
    pub signed_at: OffsetDateTime,
}

/// One participant in the signing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub client_id: ClientId,
    pub email: String,
    pub name: String,
    pub token: String,
    pub status: SignerStatus,
    /// When the signer last became pending; the expiry clock starts here.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub issued_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub signature: Option<Signature>,
}

impl Signer {
    /// Move to `next`, refusing to stand still or go backwards.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidTransition`] for a non-forward move.
    pub fn advance(&mut self, next: SignerStatus) -> Result<(), SigningError> {
        if !self.status.can_advance_to(next) {
            return Err(SigningError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }
}

/// The signer list stored under a contract's field data, with its revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRecord {
    /// Incremented on every write; `0` means never written.
    pub version: i64,
    pub title: String,
    pub status: DocumentStatus,
    pub signers: Vec<Signer>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl SignerRecord {
    /// Index and entry of the signer holding `token`.
    #[must_use]
    pub fn signer_by_token(&self, token: &str) -> Option<(usize, &Signer)> {
        self.signers.iter().enumerate().find(|(_, s)| tokens_match(&s.token, token))
    }

    /// Whether the stored status matches what the signers imply.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.status == DocumentStatus::derive(&self.signers)
    }
}

// =============================================================================
// REQUESTS / VIEWS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignerInvite {
    pub client_id: ClientId,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignatureInput {
    pub name: String,
    pub typed_signature: String,
}

/// Signer as shown to the sender. Tokens are never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignerSummary {
    pub index: usize,
    pub client_id: ClientId,
    pub name: String,
    pub email: String,
    pub status: SignerStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub signed_at: Option<OffsetDateTime>,
    /// When the pending signer's link stops working, if links expire.
    #[serde(with = "time::serde::rfc3339::option")]
    pub link_expires_at: Option<OffsetDateTime>,
}

/// Sender-facing snapshot of a contract's signing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningStatus {
    pub document_id: ContractId,
    pub title: String,
    pub status: DocumentStatus,
    pub version: i64,
    pub signers: Vec<SignerSummary>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl SigningStatus {
    fn draft(document_id: ContractId) -> Self {
        Self {
            document_id,
            title: String::new(),
            status: DocumentStatus::Draft,
            version: 0,
            signers: Vec::new(),
            completed_at: None,
        }
    }

    fn from_record(document_id: ContractId, record: &SignerRecord, policy: TokenPolicy) -> Self {
        Self {
            document_id,
            title: record.title.clone(),
            status: record.status,
            version: record.version,
            signers: record
                .signers
                .iter()
                .enumerate()
                .map(|(index, s)| SignerSummary {
                    index,
                    client_id: s.client_id,
                    name: s.name.clone(),
                    email: s.email.clone(),
                    status: s.status,
                    signed_at: s.signature.as_ref().map(|sig| sig.signed_at),
                    link_expires_at: match (s.status, s.issued_at) {
                        (SignerStatus::Pending, Some(issued_at)) => policy.expires_at(issued_at),
                        _ => None,
                    },
                })
                .collect(),
            completed_at: record.completed_at,
        }
    }
}

/// What a signer sees after opening a valid link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignerView {
    pub document_id: ContractId,
    pub title: String,
    pub signer_index: usize,
    pub client_id: ClientId,
    pub name: String,
    pub status: SignerStatus,
    /// Fields assigned to this signer or to nobody in particular.
    pub fields: Vec<FieldRecord>,
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub signing: SigningStatus,
    /// Index of the signer who was sent a link, if any.
    pub notified: Option<usize>,
    /// Non-fatal problem the operator should know about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("invalid or expired link")]
    InvalidLink,
    #[error("contract {0} has not been sent for signature")]
    NotFound(ContractId),
    #[error("contract has already been sent for signature")]
    AlreadyDispatched,
    #[error("expected {expected} signers, got {0}", expected = SIGNER_COUNT)]
    InvalidSignerCount(usize),
    #[error("invalid signer: {0}")]
    InvalidSigner(&'static str),
    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),
    #[error("no signer at position {0}")]
    SignerNotFound(usize),
    #[error("signer {0} is not awaiting a signature")]
    NotPending(usize),
    #[error("signer status cannot move from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition { from: SignerStatus, to: SignerStatus },
    #[error("signing record changed concurrently; retry")]
    Conflict,
    #[error("storage unavailable: {0}")]
    Store(StoreError),
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
}

impl From<StoreError> for SigningError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionMismatch { .. } => Self::Conflict,
            other => Self::Store(other),
        }
    }
}

impl ErrorCode for SigningError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidLink => "E_INVALID_LINK",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::AlreadyDispatched => "E_ALREADY_SENT",
            Self::InvalidSignerCount(_) | Self::InvalidSigner(_) => "E_INVALID_SIGNERS",
            Self::InvalidSignature(_) => "E_INVALID_SIGNATURE",
            Self::SignerNotFound(_) => "E_SIGNER_NOT_FOUND",
            Self::NotPending(_) => "E_NOT_PENDING",
            Self::InvalidTransition { .. } => "E_INVALID_TRANSITION",
            Self::Conflict => "E_CONFLICT",
            Self::Store(_) => "E_STORE",
            Self::Notify(_) => "E_NOTIFY",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Conflict | Self::Store(_) | Self::Notify(_))
    }
}

/// Reject blank names and signatures.
///
/// # Errors
///
/// Returns [`SigningError::InvalidSignature`] naming the offending input.
pub fn validate_typed_signature(input: &SignatureInput) -> Result<(), SigningError> {
    if input.name.trim().is_empty() {
        return Err(SigningError::InvalidSignature("name must not be empty"));
    }
    if input.typed_signature.is_empty() {
        return Err(SigningError::InvalidSignature("typed signature must not be empty"));
    }
    if input.typed_signature.trim().is_empty() {
        return Err(SigningError::InvalidSignature("typed signature must not be only whitespace"));
    }
    Ok(())
}

fn validate_invites(invites: &[SignerInvite]) -> Result<(), SigningError> {
    if invites.len() != SIGNER_COUNT {
        return Err(SigningError::InvalidSignerCount(invites.len()));
    }
    for invite in invites {
        let email = invite.email.trim();
        let valid = email.split_once('@').is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !valid {
            return Err(SigningError::InvalidSigner("email address is invalid"));
        }
        if invite.name.trim().is_empty() {
            return Err(SigningError::InvalidSigner("name must not be empty"));
        }
    }
    if invites[0].client_id == invites[1].client_id {
        return Err(SigningError::InvalidSigner("signers must be distinct"));
    }
    Ok(())
}

// =============================================================================
// WORKFLOW
// =============================================================================

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// The signing state machine bound to its store and notifier.
pub struct SigningWorkflow {
    store: Arc<dyn SigningStore>,
    notifier: Arc<dyn Notifier>,
    policy: TokenPolicy,
    base_url: String,
    clock: Clock,
}

impl SigningWorkflow {
    #[must_use]
    pub fn new(
        store: Arc<dyn SigningStore>,
        notifier: Arc<dyn Notifier>,
        policy: TokenPolicy,
        base_url: impl Into<String>,
    ) -> Self {
        Self { store, notifier, policy, base_url: base_url.into(), clock: Arc::new(OffsetDateTime::now_utc) }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    // --- Fields ---

    /// Replace a contract's field list. Geometry is clamped back into the
    /// field invariants; every row is stamped with `document_id`.
    ///
    /// # Errors
    ///
    /// [`SigningError::AlreadyDispatched`] once the contract has been sent.
    pub async fn save_fields(
        &self,
        document_id: ContractId,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, SigningError> {
        if self.store.load_signers(document_id).await?.is_some() {
            return Err(SigningError::AlreadyDispatched);
        }
        let normalized: Vec<FieldRecord> =
            records.iter().map(|r| Field::from_record(r).to_record(document_id)).collect();
        self.store.save_fields(document_id, &normalized).await?;
        info!(%document_id, fields = normalized.len(), "field list saved");
        Ok(normalized)
    }

    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn fields(&self, document_id: ContractId) -> Result<Vec<FieldRecord>, SigningError> {
        Ok(self.store.load_fields(document_id).await?)
    }

    // --- Transitions ---

    /// `draft → pending_first_signature`: create both signers, issue their
    /// tokens, persist, and send signer 0 their link.
    ///
    /// # Errors
    ///
    /// Invalid invites, a contract already sent, a concurrent dispatch
    /// ([`SigningError::Conflict`]), or a store failure.
    pub async fn dispatch(
        &self,
        document_id: ContractId,
        title: &str,
        invites: Vec<SignerInvite>,
    ) -> Result<Outcome, SigningError> {
        validate_invites(&invites)?;
        if self.store.load_signers(document_id).await?.is_some() {
            return Err(SigningError::AlreadyDispatched);
        }

        let now = self.now();
        let tokens = generate_tokens(invites.len());
        let signers: Vec<Signer> = invites
            .into_iter()
            .zip(tokens)
            .enumerate()
            .map(|(index, (invite, token))| {
                let first = index == 0;
                Signer {
                    client_id: invite.client_id,
                    email: invite.email.trim().to_owned(),
                    name: invite.name.trim().to_owned(),
                    token,
                    status: if first { SignerStatus::Pending } else { SignerStatus::Waiting },
                    issued_at: first.then_some(now),
                    signature: None,
                }
            })
            .collect();

        let title = if title.trim().is_empty() { "Untitled contract" } else { title.trim() };
        let record = SignerRecord {
            version: 1,
            title: title.to_owned(),
            status: DocumentStatus::derive(&signers),
            signers,
            completed_at: None,
        };
        self.store.save_signers(document_id, &record, 0).await?;
        info!(%document_id, status = record.status.as_str(), "contract sent for signature");

        let warning = self.notify_or_warn(document_id, &record, 0).await;
        Ok(Outcome { signing: SigningStatus::from_record(document_id, &record, self.policy), notified: Some(0), warning })
    }

    /// Check a signing link and return what the signer should see.
    ///
    /// # Errors
    ///
    /// [`SigningError::InvalidLink`] unless `token` belongs to the pending,
    /// unexpired signer.
    pub async fn validate_link(&self, document_id: ContractId, token: &str) -> Result<SignerView, SigningError> {
        let record = self.store.load_signers(document_id).await?.ok_or(SigningError::InvalidLink)?;
        let index = self.authorize(document_id, &record, token)?;
        let signer = &record.signers[index];
        let fields = self
            .store
            .load_fields(document_id)
            .await?
            .into_iter()
            .filter(|f| f.client_id.is_none_or(|c| c == signer.client_id))
            .collect();
        Ok(SignerView {
            document_id,
            title: record.title.clone(),
            signer_index: index,
            client_id: signer.client_id,
            name: signer.name.clone(),
            status: signer.status,
            fields,
        })
    }

    /// Record a signature for the signer holding `token`.
    ///
    /// Signer 0 completing promotes signer 1 to pending and sends their link;
    /// the last signer completing completes the contract.
    ///
    /// # Errors
    ///
    /// Blank input, an invalid link, a concurrent transition
    /// ([`SigningError::Conflict`]), or a store failure. Nothing is written
    /// on error.
    pub async fn complete(
        &self,
        document_id: ContractId,
        token: &str,
        input: SignatureInput,
    ) -> Result<Outcome, SigningError> {
        validate_typed_signature(&input)?;
        let current = self.store.load_signers(document_id).await?.ok_or(SigningError::InvalidLink)?;
        let index = self.authorize(document_id, &current, token)?;
        let now = self.now();

        let mut next = current.clone();
        let signer = &mut next.signers[index];
        signer.advance(SignerStatus::Completed)?;
        signer.signature = Some(Signature {
            name: input.name.trim().to_owned(),
            typed_signature: input.typed_signature,
            signed_at: now,
        });

        let promoted = if next.signers.iter().any(|s| s.status == SignerStatus::Pending) {
            None
        } else {
            next.signers.iter().position(|s| s.status == SignerStatus::Waiting)
        };
        if let Some(p) = promoted {
            next.signers[p].advance(SignerStatus::Pending)?;
            next.signers[p].issued_at = Some(now);
        }

        next.status = DocumentStatus::derive(&next.signers);
        if next.status == DocumentStatus::Completed {
            next.completed_at = Some(now);
        }
        next.version = current.version + 1;
        self.store.save_signers(document_id, &next, current.version).await?;
        info!(%document_id, signer = index, status = next.status.as_str(), "signature recorded");

        let warning = match promoted {
            Some(p) => self.notify_or_warn(document_id, &next, p).await,
            None => None,
        };
        Ok(Outcome { signing: SigningStatus::from_record(document_id, &next, self.policy), notified: promoted, warning })
    }

    /// Re-send the pending signer's link. With an expiry policy the link's
    /// lifetime restarts.
    ///
    /// # Errors
    ///
    /// Unknown contract or signer, a signer not currently pending, a store
    /// failure, or a notification failure.
    pub async fn resend(&self, document_id: ContractId, signer_index: usize) -> Result<Outcome, SigningError> {
        let mut record = self.store.load_signers(document_id).await?.ok_or(SigningError::NotFound(document_id))?;
        let signer = record.signers.get(signer_index).ok_or(SigningError::SignerNotFound(signer_index))?;
        if signer.status != SignerStatus::Pending {
            return Err(SigningError::NotPending(signer_index));
        }

        if self.policy.ttl.is_some() {
            let expected = record.version;
            record.signers[signer_index].issued_at = Some(self.now());
            record.version = expected + 1;
            self.store.save_signers(document_id, &record, expected).await?;
        }

        self.notify_signer(document_id, &record, signer_index).await?;
        info!(%document_id, signer = signer_index, "signing link resent");
        Ok(Outcome {
            signing: SigningStatus::from_record(document_id, &record, self.policy),
            notified: Some(signer_index),
            warning: None,
        })
    }

    /// Read-only snapshot. A contract never sent reports `draft`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn status(&self, document_id: ContractId) -> Result<SigningStatus, SigningError> {
        Ok(match self.store.load_signers(document_id).await? {
            Some(record) => SigningStatus::from_record(document_id, &record, self.policy),
            None => SigningStatus::draft(document_id),
        })
    }

    // --- Internals ---

    fn authorize(&self, document_id: ContractId, record: &SignerRecord, token: &str) -> Result<usize, SigningError> {
        let now = self.now();
        match record.signer_by_token(token) {
            Some((index, signer)) if self.policy.is_valid(signer, now) => Ok(index),
            Some((index, signer)) => {
                warn!(%document_id, signer = index, status = signer.status.as_str(), "signing link rejected");
                Err(SigningError::InvalidLink)
            }
            None => {
                warn!(%document_id, "signing link rejected: unknown token");
                Err(SigningError::InvalidLink)
            }
        }
    }

    async fn notify_signer(
        &self,
        document_id: ContractId,
        record: &SignerRecord,
        index: usize,
    ) -> Result<(), NotifyError> {
        let Some(signer) = record.signers.get(index) else {
            return Err(NotifyError::Delivery(format!("no signer at position {index}")));
        };
        let notification = Notification {
            document_id,
            signer_index: index,
            signer_id: signer.client_id,
            to_email: signer.email.clone(),
            to_name: signer.name.clone(),
            document_title: record.title.clone(),
            signing_link: signing_link(&self.base_url, document_id, &signer.token),
        };
        self.notifier.notify(&notification).await
    }

    async fn notify_or_warn(&self, document_id: ContractId, record: &SignerRecord, index: usize) -> Option<String> {
        match self.notify_signer(document_id, record, index).await {
            Ok(()) => None,
            Err(e) => {
                warn!(%document_id, signer = index, error = %e, "signing notification failed; operator can resend");
                Some(e.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "signing_test.rs"]
mod tests;
