//! Signing-request delivery.
//!
//! The workflow hands a [`Notification`] to whichever [`Notifier`] the server
//! was started with: [`ResendNotifier`] when email is configured, otherwise
//! [`LogNotifier`], which writes the link to the log for local development.

use async_trait::async_trait;
use canvas::doc::{ClientId, ContractId};
use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;
use tracing::info;

use crate::config::ResendConfig;

const SIGNING_REQUEST_TEMPLATE: &str = include_str!("../../templates/signing_request.html");

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A request for one signer to open their link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub document_id: ContractId,
    pub signer_index: usize,
    pub signer_id: ClientId,
    pub to_email: String,
    pub to_name: String,
    pub document_title: String,
    pub signing_link: String,
}

impl Notification {
    #[must_use]
    pub fn subject(&self) -> String {
        format!("Signature requested: {}", self.document_title)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

// =============================================================================
// RESEND
// =============================================================================

/// Sends signing requests as email through Resend.
pub struct ResendNotifier {
    client: Resend,
    from: String,
}

impl ResendNotifier {
    #[must_use]
    pub fn new(config: &ResendConfig) -> Self {
        Self { client: Resend::new(&config.api_key), from: config.from.clone() }
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let to = [notification.to_email.as_str()];
        let subject = notification.subject();
        let html = render_signing_request(notification);

        let email = CreateEmailBaseOptions::new(&self.from, to, &subject).with_html(&html);
        self.client
            .emails
            .send(email)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        info!(document_id = %notification.document_id, signer = notification.signer_index, "signing request emailed");
        Ok(())
    }
}

// =============================================================================
// LOG
// =============================================================================

/// Logs the signing link instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            document_id = %notification.document_id,
            signer = notification.signer_index,
            signer_id = %notification.signer_id,
            to = %notification.to_email,
            link = %notification.signing_link,
            "signing request (email disabled)"
        );
        Ok(())
    }
}

// =============================================================================
// TEMPLATE
// =============================================================================

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn render_signing_request(notification: &Notification) -> String {
    SIGNING_REQUEST_TEMPLATE
        .replace("{{NAME}}", &escape_html(&notification.to_name))
        .replace("{{TITLE}}", &escape_html(&notification.document_title))
        .replace("{{LINK}}", &escape_html(&notification.signing_link))
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
