//! Brevo transactional email client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ApiError, EmailMessage, EmailTransport, Mailbox, SendReceipt, TransportError};

/// Default transactional email endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

/// Header carrying the provider API key.
const API_KEY_HEADER: &str = "api-key";

/// Connect timeout, kept shorter than the overall request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Provider request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: &'a Mailbox,
    to: &'a [Mailbox],
    subject: &'a str,
    html_content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a Mailbox>,
}

/// Provider success response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailResponse {
    message_id: Option<String>,
}

/// Provider error response format.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Client for the provider's send endpoint.
pub struct BrevoClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl BrevoClient {
    /// Create a client. No retries are performed; `timeout` bounds each call.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for BrevoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrevoClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmailTransport for BrevoClient {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, TransportError> {
        let request = SendEmailRequest {
            sender: &message.sender,
            to: &message.to,
            subject: &message.subject,
            html_content: &message.html,
            reply_to: message.reply_to.as_ref(),
        };

        debug!("Sending \"{}\" via {}", message.subject, self.endpoint);
        let resp = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<ProviderErrorBody>(&body).ok();
            let (code, message) = match parsed {
                Some(err) => (err.code, err.message),
                None => (None, None),
            };
            let api_error = ApiError {
                status: status.as_u16(),
                code,
                message: message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| format!("Failed to send email (HTTP {})", status.as_u16())),
            };
            warn!(
                "Email provider returned HTTP {}: {}",
                api_error.status, api_error.message
            );
            return Err(TransportError::Rejected(api_error));
        }

        match serde_json::from_str::<SendEmailResponse>(&body) {
            Ok(parsed) => Ok(SendReceipt {
                message_id: parsed.message_id,
            }),
            Err(e) => {
                debug!("Unreadable success body from provider: {}", e);
                Ok(SendReceipt::default())
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(e.to_string())
    }
}
