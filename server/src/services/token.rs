//! Signing tokens, links, and the expiry policy.
//!
//! Tokens are opaque 32-byte hex strings. They are stored as issued so an
//! operator can resend the same link; possession of the token is what grants
//! a signer access at their turn.

use std::fmt::Write;

use rand::Rng;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::services::signing::{Signer, SignerStatus};

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing into a String cannot fail.
        if write!(s, "{b:02x}").is_err() {
            break;
        }
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Generate `n` pairwise-distinct tokens.
#[must_use]
pub fn generate_tokens(n: usize) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::with_capacity(n);
    while tokens.len() < n {
        let token = generate_token();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// The externally addressable signing link: `{base}/sign/{documentId}?token={token}`.
#[must_use]
pub fn signing_link(base_url: &str, document_id: Uuid, token: &str) -> String {
    format!("{}/sign/{document_id}?token={token}", base_url.trim_end_matches('/'))
}

/// Compare two tokens without short-circuiting on the first differing byte.
#[must_use]
pub fn tokens_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// When a signer's token stops being accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenPolicy {
    /// Lifetime measured from the moment the signer became pending.
    /// `None` disables expiry.
    pub ttl: Option<Duration>,
}

impl TokenPolicy {
    #[must_use]
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { ttl }
    }

    #[must_use]
    pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
        self.ttl.map(|ttl| issued_at + ttl)
    }

    /// A token is valid only for a `pending` signer whose link has not expired.
    #[must_use]
    pub fn is_valid(&self, signer: &Signer, now: OffsetDateTime) -> bool {
        if signer.status != SignerStatus::Pending {
            return false;
        }
        match (self.ttl, signer.issued_at) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(ttl), Some(issued_at)) => now < issued_at + ttl,
        }
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
