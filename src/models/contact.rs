//! Contact form submission.

use serde::{Deserialize, Serialize};

use crate::utils::sanitize_html;

/// Contact form exactly as posted by the website. Every field is optional so
/// missing values surface as field errors rather than parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Validated and normalized contact request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactRequest {
    /// Copy with every free-text field passed through the HTML sanitizer.
    pub fn sanitized(&self) -> Self {
        Self {
            name: sanitize_html(&self.name),
            email: sanitize_html(&self.email),
            phone: self.phone.as_deref().map(sanitize_html),
            subject: self.subject.as_deref().map(sanitize_html),
            message: sanitize_html(&self.message),
        }
    }

    /// Subject line for the shop's notification email.
    pub fn notification_subject(&self) -> String {
        let topic = self.subject.as_deref().unwrap_or(&self.name);
        format!("New contact form submission: {}", topic)
    }
}
