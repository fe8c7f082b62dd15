//! In-memory transport for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{EmailMessage, EmailTransport, SendReceipt, TransportError};

/// Records every message and replays queued outcomes, then succeeds.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<EmailMessage>>,
    outcomes: Mutex<VecDeque<Result<SendReceipt, TransportError>>>,
}

impl RecordingTransport {
    pub fn with_outcomes(outcomes: Vec<Result<SendReceipt, TransportError>>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes.into()),
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, TransportError> {
        self.sent.lock().unwrap().push(message.clone());
        self.outcomes.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(SendReceipt {
                message_id: Some("abc".to_string()),
            })
        })
    }
}
