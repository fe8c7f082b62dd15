//! Submission types.
//!
//! Each kind of form has a raw shape (what the website posts) and a validated
//! shape produced by [`crate::validation`].

mod contact;
mod event;

pub use contact::{ContactForm, ContactRequest};
pub use event::{Address, AddressForm, EventBooking, EventBookingForm, EventType};

use serde::{Deserialize, Serialize};

/// A raw submission of either kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionForm {
    Contact(ContactForm),
    Event(EventBookingForm),
}

impl SubmissionForm {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            SubmissionForm::Contact(_) => SubmissionKind::Contact,
            SubmissionForm::Event(_) => SubmissionKind::Event,
        }
    }
}

/// A validated submission of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    Contact(ContactRequest),
    Event(EventBooking),
}

impl Submission {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            Submission::Contact(_) => SubmissionKind::Contact,
            Submission::Event(_) => SubmissionKind::Event,
        }
    }

    /// Submitter's normalized email address.
    pub fn email(&self) -> &str {
        match self {
            Submission::Contact(c) => &c.email,
            Submission::Event(e) => &e.email,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Submission::Contact(c) => &c.name,
            Submission::Event(e) => &e.name,
        }
    }

    pub fn sanitized(&self) -> Self {
        match self {
            Submission::Contact(c) => Submission::Contact(c.sanitized()),
            Submission::Event(e) => Submission::Event(e.sanitized()),
        }
    }
}

/// Submission kind, used for CLI selection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Contact,
    Event,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Contact => "contact",
            SubmissionKind::Event => "event",
        }
    }
}
