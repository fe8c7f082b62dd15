//! Event and catering booking submission.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::utils::sanitize_html;

/// Kind of event being booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Birthday,
    Corporate,
    Wedding,
    School,
    Community,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Birthday,
        EventType::Corporate,
        EventType::Wedding,
        EventType::School,
        EventType::Community,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Birthday => "birthday",
            EventType::Corporate => "corporate",
            EventType::Wedding => "wedding",
            EventType::School => "school",
            EventType::Community => "community",
            EventType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::Birthday => "Birthday Party",
            EventType::Corporate => "Corporate Event",
            EventType::Wedding => "Wedding",
            EventType::School => "School Event",
            EventType::Community => "Community Event",
            EventType::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

/// Address block as posted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressForm {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// Event booking form exactly as posted by the website.
///
/// `guest_count` stays a raw JSON value because browsers send it either as a
/// number or as the text of a number input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventBookingForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub event_type: Option<String>,
    pub guest_count: Option<serde_json::Value>,
    pub address: Option<AddressForm>,
    pub message: Option<String>,
}

/// Validated event location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Address {
    /// Single-line form used in emails.
    pub fn one_line(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip)
    }
}

/// Validated and normalized event booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBooking {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub event_type: EventType,
    pub guest_count: u32,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EventBooking {
    /// Copy with every free-text field passed through the HTML sanitizer.
    pub fn sanitized(&self) -> Self {
        Self {
            name: sanitize_html(&self.name),
            email: sanitize_html(&self.email),
            phone: sanitize_html(&self.phone),
            address: Address {
                street: sanitize_html(&self.address.street),
                city: sanitize_html(&self.address.city),
                state: sanitize_html(&self.address.state),
                zip: sanitize_html(&self.address.zip),
            },
            message: self.message.as_deref().map(sanitize_html),
            ..self.clone()
        }
    }

    pub fn notification_subject(&self) -> String {
        format!(
            "New event booking request: {} on {}",
            self.event_type.label(),
            self.event_date.format("%B %-d, %Y")
        )
    }

    /// Human-readable time range, e.g. `2:00 PM - 4:30 PM`.
    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%-I:%M %p"),
            self.end_time.format("%-I:%M %p")
        )
    }
}
