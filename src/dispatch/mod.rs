//! Submission dispatch pipeline.
//!
//! A dispatch runs rate limiting, configuration checks, validation,
//! sanitization and delivery in that order. Every failure is converted into a
//! [`DispatchResult`] here; callers never see an error type.

mod result;

pub use result::{
    DispatchError, DispatchResult, ResultDetails, MISCONFIGURED_MESSAGE, UNEXPECTED_MESSAGE,
    VALIDATION_MESSAGE,
};

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{ConfigError, MailCredentials, MailSettings, Settings};
use crate::mail::{templates, BrevoClient, EmailMessage, EmailTransport, Mailbox, TransportError};
use crate::models::{Submission, SubmissionForm};
use crate::rate_limit::{Clock, RateLimitStats, SubmissionRateLimiter, SystemClock};
use crate::validation::{self, BookingRules};

/// Progress of a single dispatch, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Pending,
    RateChecked,
    Validated,
    Sanitized,
    Sent,
    Succeeded,
    Failed,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchStage::Pending => "pending",
            DispatchStage::RateChecked => "rate_checked",
            DispatchStage::Validated => "validated",
            DispatchStage::Sanitized => "sanitized",
            DispatchStage::Sent => "sent",
            DispatchStage::Succeeded => "succeeded",
            DispatchStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Owns the rate limiters and the email transport for one process.
pub struct Dispatcher {
    limiter: SubmissionRateLimiter,
    mail: MailSettings,
    booking: BookingRules,
    transport: Option<Arc<dyn EmailTransport>>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    /// Create a dispatcher. Without a transport every dispatch fails as
    /// misconfigured.
    pub fn new(
        settings: &Settings,
        transport: Option<Arc<dyn EmailTransport>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            limiter: SubmissionRateLimiter::new(settings.rate_limits.clone(), clock.clone()),
            mail: settings.mail.clone(),
            booking: settings.booking.clone(),
            transport,
            clock,
        }
    }

    /// Create a dispatcher backed by the provider client and the system clock.
    ///
    /// Missing or malformed credentials are not an error here; dispatches
    /// fail closed until the configuration is fixed.
    pub fn from_settings(settings: &Settings) -> Result<Self, TransportError> {
        let transport: Option<Arc<dyn EmailTransport>> = match settings.mail.credentials() {
            Ok(creds) => Some(Arc::new(BrevoClient::new(
                creds.endpoint,
                creds.api_key,
                settings.mail.timeout(),
            )?)),
            Err(e) => {
                warn!("Email delivery disabled: {}", e);
                None
            }
        };
        Ok(Self::new(settings, transport, Arc::new(SystemClock::new())))
    }

    pub fn limiter(&self) -> &SubmissionRateLimiter {
        &self.limiter
    }

    pub fn rate_limit_stats(&self) -> RateLimitStats {
        self.limiter.stats()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn booking_rules(&self) -> &BookingRules {
        &self.booking
    }

    /// Whether mail can be sent with the current configuration.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some() && self.mail.credentials().is_ok()
    }

    /// Run a submission through the pipeline on behalf of `source`.
    pub async fn dispatch(&self, form: &SubmissionForm, source: &str) -> DispatchResult {
        let id = Uuid::new_v4();
        let kind = form.kind().as_str();
        debug!("dispatch {} ({}) {}", id, kind, DispatchStage::Pending);

        match self.run(id, form, source).await {
            Ok(()) => {
                info!("dispatch {} ({}) {}", id, kind, DispatchStage::Succeeded);
                DispatchResult::ok()
            }
            Err(err) => {
                match &err {
                    DispatchError::RateLimited(limited) => {
                        info!("dispatch {} refused for {}: {}", id, source, limited.message)
                    }
                    DispatchError::Misconfigured(cause) => {
                        error!("dispatch {} not sent: {}", id, cause)
                    }
                    DispatchError::ValidationFailed(errors) => {
                        info!("dispatch {} rejected: {}", id, errors)
                    }
                    DispatchError::Provider(api) => warn!(
                        "dispatch {} provider error (HTTP {}): {}",
                        id, api.status, api.message
                    ),
                    DispatchError::Unexpected(msg) => error!("dispatch {} failed: {}", id, msg),
                }
                debug!("dispatch {} ({}) {}", id, kind, DispatchStage::Failed);
                err.into()
            }
        }
    }

    async fn run(&self, id: Uuid, form: &SubmissionForm, source: &str) -> Result<(), DispatchError> {
        self.limiter
            .check(source)
            .map_err(DispatchError::RateLimited)?;
        debug!("dispatch {} {}", id, DispatchStage::RateChecked);

        let creds = self.mail.credentials().map_err(DispatchError::Misconfigured)?;
        let transport = self
            .transport
            .as_ref()
            .ok_or(DispatchError::Misconfigured(ConfigError::MissingApiKey))?;

        let submission = validation::validate(form, self.clock.wall_now(), &self.booking)
            .map_err(DispatchError::ValidationFailed)?;
        debug!("dispatch {} {}", id, DispatchStage::Validated);

        let clean = submission.sanitized();
        debug!("dispatch {} {}", id, DispatchStage::Sanitized);

        let notification = notification_message(&creds, &submission, &clean);
        let receipt = transport
            .send(&notification)
            .await
            .map_err(|e| match e {
                TransportError::Rejected(api) => DispatchError::Provider(api),
                other => DispatchError::Unexpected(other.to_string()),
            })?;
        debug!(
            "dispatch {} {} (message id {})",
            id,
            DispatchStage::Sent,
            receipt.message_id.as_deref().unwrap_or("none")
        );

        if self.mail.send_confirmation {
            let confirmation =
                confirmation_message(&creds, &submission, &clean, &self.mail.sender_name);
            if let Err(e) = transport.send(&confirmation).await {
                warn!("dispatch {} confirmation to submitter failed: {}", id, e);
            }
        }

        Ok(())
    }
}

/// Notification to the shop. Subjects use validated values since they are
/// not HTML; bodies use the sanitized copy.
fn notification_message(
    creds: &MailCredentials,
    submission: &Submission,
    clean: &Submission,
) -> EmailMessage {
    let subject = match submission {
        Submission::Contact(contact) => contact.notification_subject(),
        Submission::Event(event) => event.notification_subject(),
    };
    let html = match clean {
        Submission::Contact(contact) => templates::contact_notification(contact),
        Submission::Event(event) => templates::event_notification(event),
    };

    EmailMessage {
        sender: creds.sender.clone(),
        to: vec![creds.contact.clone()],
        subject,
        html,
        reply_to: Some(Mailbox::new(
            submission.email(),
            Some(submission.name().to_string()),
        )),
    }
}

fn confirmation_message(
    creds: &MailCredentials,
    submission: &Submission,
    clean: &Submission,
    shop_name: &str,
) -> EmailMessage {
    EmailMessage {
        sender: creds.sender.clone(),
        to: vec![Mailbox::new(
            submission.email(),
            Some(submission.name().to_string()),
        )],
        subject: templates::confirmation_subject(submission.kind()).to_string(),
        html: templates::confirmation(clean, shop_name),
        reply_to: Some(creds.contact.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::testing::RecordingTransport;
    use crate::mail::{ApiError, SendReceipt};
    use crate::models::{ContactForm, EventBookingForm};
    use crate::rate_limit::{MockClock, RateScope};
    use chrono::{TimeZone, Utc};

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.mail.api_key = Some("xkeysib-0123456789abcdef".to_string());
        settings.mail.contact_email = Some("owner@scoopshop.example".to_string());
        settings
    }

    fn clock() -> Arc<MockClock> {
        Arc::new(MockClock::at(
            Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn dispatcher(
        settings: &Settings,
        transport: Arc<RecordingTransport>,
        clock: Arc<MockClock>,
    ) -> Dispatcher {
        Dispatcher::new(settings, Some(transport), clock)
    }

    fn contact_form() -> SubmissionForm {
        SubmissionForm::Contact(ContactForm {
            name: Some("Jane Doe".to_string()),
            email: Some("  Jane@Example.com ".to_string()),
            phone: None,
            subject: Some("Sundae <script>alert(1)</script>bar".to_string()),
            message: Some("Do you do <b>dairy-free</b> cones?".to_string()),
        })
    }

    fn event_form() -> SubmissionForm {
        let form: EventBookingForm = serde_json::from_value(serde_json::json!({
            "name": "Sam Lee",
            "email": "sam@example.com",
            "phone": "(555) 123-4567",
            "eventDate": "2026-07-04",
            "startTime": "14:00",
            "endTime": "16:00",
            "eventType": "birthday",
            "guestCount": 40,
            "address": {"street": "12 Main St", "city": "Springfield", "state": "il", "zip": "62701"}
        }))
        .unwrap();
        SubmissionForm::Event(form)
    }

    #[tokio::test]
    async fn test_contact_success_sends_notification_and_confirmation() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher(&settings(), transport.clone(), clock());

        let result = dispatcher.dispatch(&contact_form(), "10.0.0.1").await;
        assert_eq!(result, DispatchResult::ok());

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        let notification = &sent[0];
        assert_eq!(notification.to[0].email, "owner@scoopshop.example");
        assert_eq!(
            notification.reply_to.as_ref().map(|m| m.email.as_str()),
            Some("jane@example.com")
        );
        assert!(notification
            .subject
            .starts_with("New contact form submission: Sundae"));
        assert!(!notification.html.contains("<script"));
        assert!(!notification.html.contains("alert(1)"));
        assert!(notification.html.contains("<b>dairy-free</b>"));

        let confirmation = &sent[1];
        assert_eq!(confirmation.to[0].email, "jane@example.com");
        assert_eq!(confirmation.subject, "We received your message");
    }

    #[tokio::test]
    async fn test_event_success() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher(&settings(), transport.clone(), clock());

        let result = dispatcher.dispatch(&event_form(), "10.0.0.1").await;
        assert!(result.success, "{:?}", result);
        let sent = transport.sent();
        assert_eq!(
            sent[0].subject,
            "New event booking request: Birthday Party on July 4, 2026"
        );
        assert!(sent[0].html.contains("Springfield, IL 62701"));
    }

    #[tokio::test]
    async fn test_provider_rejection_surfaces_api_error() {
        let transport = Arc::new(RecordingTransport::with_outcomes(vec![Err(
            TransportError::Rejected(ApiError {
                status: 400,
                code: None,
                message: "Invalid sender".to_string(),
            }),
        )]));
        let dispatcher = dispatcher(&settings(), transport.clone(), clock());

        let result = dispatcher.dispatch(&contact_form(), "10.0.0.1").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Invalid sender"));
        assert_eq!(result.api_error().map(|a| a.status), Some(400));
        // No confirmation after a failed notification.
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_failure_keeps_success() {
        let transport = Arc::new(RecordingTransport::with_outcomes(vec![
            Ok(SendReceipt::default()),
            Err(TransportError::Timeout),
        ]));
        let dispatcher = dispatcher(&settings(), transport.clone(), clock());

        let result = dispatcher.dispatch(&contact_form(), "10.0.0.1").await;
        assert!(result.success);
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_confirmation_disabled() {
        let mut settings = settings();
        settings.mail.send_confirmation = false;
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher(&settings, transport.clone(), clock());

        assert!(dispatcher.dispatch(&contact_form(), "10.0.0.1").await.success);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_connection_failure_is_generic() {
        let transport = Arc::new(RecordingTransport::with_outcomes(vec![Err(
            TransportError::Connection("refused".to_string()),
        )]));
        let dispatcher = dispatcher(&settings(), transport, clock());

        let result = dispatcher.dispatch(&contact_form(), "10.0.0.1").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(UNEXPECTED_MESSAGE));
        assert!(result.details.is_none());
    }

    #[tokio::test]
    async fn test_bad_phone_never_reaches_network() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher(&settings(), transport.clone(), clock());

        let form = SubmissionForm::Contact(ContactForm {
            phone: Some("123-456-7890".to_string()),
            ..match contact_form() {
                SubmissionForm::Contact(c) => c,
                _ => unreachable!(),
            }
        });
        let result = dispatcher.dispatch(&form, "10.0.0.1").await;
        assert!(!result.success);
        assert!(result
            .validation_errors()
            .map(|e| e.contains("phone"))
            .unwrap_or(false));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_misconfigured_fails_closed() {
        let mut settings = settings();
        settings.mail.api_key = None;
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher(&settings, transport.clone(), clock());

        let result = dispatcher.dispatch(&contact_form(), "10.0.0.1").await;
        assert_eq!(result.error.as_deref(), Some(MISCONFIGURED_MESSAGE));
        assert!(transport.sent().is_empty());
        assert!(!dispatcher.is_configured());

        let no_transport = Dispatcher::new(&self::settings(), None, clock());
        let result = no_transport.dispatch(&contact_form(), "10.0.0.1").await;
        assert_eq!(result.error.as_deref(), Some(MISCONFIGURED_MESSAGE));
    }

    #[tokio::test]
    async fn test_rate_limited_per_source_without_network_call() {
        let transport = Arc::new(RecordingTransport::default());
        let clock = clock();
        let dispatcher = dispatcher(&settings(), transport.clone(), clock.clone());

        for _ in 0..3 {
            assert!(dispatcher.dispatch(&contact_form(), "10.0.0.9").await.success);
        }
        let sent_before = transport.sent().len();

        let result = dispatcher.dispatch(&contact_form(), "10.0.0.9").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(RateScope::Source.message()));
        assert_eq!(
            result.reset_time(),
            Some(Utc.with_ymd_and_hms(2026, 6, 1, 12, 1, 0).unwrap())
        );
        assert_eq!(transport.sent().len(), sent_before);

        // Another source is still admitted.
        assert!(dispatcher.dispatch(&contact_form(), "10.0.0.10").await.success);

        clock.advance(std::time::Duration::from_secs(60));
        assert!(dispatcher.dispatch(&contact_form(), "10.0.0.9").await.success);
    }

    #[tokio::test]
    async fn test_rate_check_precedes_validation() {
        let mut settings = settings();
        settings.rate_limits.per_source_per_minute = 1;
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher(&settings, transport, clock());

        let empty = SubmissionForm::Contact(ContactForm::default());
        let first = dispatcher.dispatch(&empty, "1.2.3.4").await;
        assert!(first.validation_errors().is_some());

        let second = dispatcher.dispatch(&empty, "1.2.3.4").await;
        assert!(second.reset_time().is_some());
        assert!(second.validation_errors().is_none());
    }
}
