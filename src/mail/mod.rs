//! Outbound transactional email.
//!
//! [`EmailTransport`] is the seam between the dispatcher and the provider.
//! [`BrevoClient`] speaks the provider's JSON API over reqwest.

mod brevo;
pub mod templates;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use brevo::{BrevoClient, DEFAULT_ENDPOINT};

/// Name and address pair used for senders and recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }
}

/// A fully rendered email ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub sender: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<Mailbox>,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// Error body returned by the provider on a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// Errors from sending through a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Provider rejected message (HTTP {}): {}", .0.status, .0.message)]
    Rejected(ApiError),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Request timed out")]
    Timeout,
}

/// Something that can deliver an [`EmailMessage`].
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, TransportError>;
}
