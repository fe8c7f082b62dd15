//! Submission validation.
//!
//! Every field is checked independently so callers get the full set of
//! problems in one pass. Cross-field checks (end after start, advance notice)
//! only run once the fields they depend on parse on their own.

pub mod rules;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Address, AddressForm, ContactForm, ContactRequest, EventBooking, EventBookingForm, Submission,
    SubmissionForm,
};

/// Field path (e.g. `address.zip`) to human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field error set.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// First message of the first field, for single-line displays.
    pub fn first_message(&self) -> Option<&str> {
        self.0
            .values()
            .next()
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Keep the value when `result` is `Ok`, otherwise record the message.
    fn take<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Business rules for event bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRules {
    /// Minimum hours between now and the event start.
    pub min_notice_hours: u32,
    /// Shop's offset from UTC, used to interpret event dates and times.
    pub utc_offset_minutes: i32,
    pub min_guests: u32,
    pub max_guests: u32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            min_notice_hours: 24,
            utc_offset_minutes: 0,
            min_guests: 10,
            max_guests: 500,
        }
    }
}

impl BookingRules {
    fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Event start as a UTC instant, or `None` for a nonexistent local time.
    fn start_instant(&self, date: NaiveDate, start: NaiveTime) -> Option<DateTime<Utc>> {
        date.and_time(start)
            .and_local_timezone(self.offset())
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset()).date_naive()
    }
}

/// Validate a contact form.
pub fn validate_contact(form: &ContactForm) -> Result<ContactRequest, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = errors.take("name", rules::name(form.name.as_deref()));
    let email = errors.take("email", rules::email(form.email.as_deref()));
    let phone = match rules::present(form.phone.as_deref()) {
        Some(raw) => errors.take("phone", rules::phone(raw)).map(Some),
        None => Some(None),
    };
    let subject = match rules::present(form.subject.as_deref()) {
        Some(raw) => errors
            .take("subject", rules::text(raw, "Subject", 0, rules::SUBJECT_MAX))
            .map(Some),
        None => Some(None),
    };
    let message = errors.take(
        "message",
        rules::required(form.message.as_deref(), "Message").and_then(|m| {
            rules::text(m, "Message", rules::MESSAGE_MIN, rules::MESSAGE_MAX)
        }),
    );

    match (name, email, phone, subject, message) {
        (Some(name), Some(email), Some(phone), Some(subject), Some(message))
            if errors.is_empty() =>
        {
            Ok(ContactRequest {
                name,
                email,
                phone,
                subject,
                message,
            })
        }
        _ => Err(errors),
    }
}

/// Validate an event booking form against `now`.
pub fn validate_event(
    form: &EventBookingForm,
    now: DateTime<Utc>,
    booking: &BookingRules,
) -> Result<EventBooking, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = errors.take("name", rules::name(form.name.as_deref()));
    let email = errors.take("email", rules::email(form.email.as_deref()));
    let phone = errors.take(
        "phone",
        rules::required(form.phone.as_deref(), "Phone number").and_then(rules::phone),
    );
    let event_date = errors.take("eventDate", rules::date(form.event_date.as_deref()));
    let start_time = errors.take(
        "startTime",
        rules::time(form.start_time.as_deref(), "Start time"),
    );
    let end_time = errors.take("endTime", rules::time(form.end_time.as_deref(), "End time"));
    let event_type = errors.take("eventType", rules::event_type(form.event_type.as_deref()));
    let guest_count = errors.take(
        "guestCount",
        rules::guest_count(
            form.guest_count.as_ref(),
            booking.min_guests,
            booking.max_guests,
        ),
    );
    let address = validate_address(form.address.as_ref(), &mut errors);
    let message = match rules::present(form.message.as_deref()) {
        Some(raw) => errors
            .take("message", rules::text(raw, "Message", 0, rules::MESSAGE_MAX))
            .map(Some),
        None => Some(None),
    };

    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end <= start {
            errors.add("endTime", "End time must be after start time");
        }
    }

    match (event_date, start_time) {
        (Some(date), Some(start)) => {
            let earliest =
                now.checked_add_signed(Duration::hours(i64::from(booking.min_notice_hours)));
            match (booking.start_instant(date, start), earliest) {
                (Some(starts_at), Some(earliest)) if starts_at >= earliest => {}
                _ => errors.add(
                    "eventDate",
                    format!(
                        "Event must be scheduled at least {} hours in advance",
                        booking.min_notice_hours
                    ),
                ),
            }
        }
        (Some(date), None) => {
            if date < booking.today(now) {
                errors.add("eventDate", "Event date cannot be in the past");
            }
        }
        _ => {}
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    match (
        name,
        email,
        phone,
        event_date,
        start_time,
        end_time,
        event_type,
        guest_count,
        address,
        message,
    ) {
        (
            Some(name),
            Some(email),
            Some(phone),
            Some(event_date),
            Some(start_time),
            Some(end_time),
            Some(event_type),
            Some(guest_count),
            Some(address),
            Some(message),
        ) => Ok(EventBooking {
            name,
            email,
            phone,
            event_date,
            start_time,
            end_time,
            event_type,
            guest_count,
            address,
            message,
        }),
        _ => Err(errors),
    }
}

fn validate_address(form: Option<&AddressForm>, errors: &mut FieldErrors) -> Option<Address> {
    let empty = AddressForm::default();
    let form = form.unwrap_or(&empty);

    let street = errors.take(
        "address.street",
        rules::required(form.street.as_deref(), "Street address")
            .and_then(|s| rules::text(s, "Street address", 0, rules::STREET_MAX)),
    );
    let city = errors.take("address.city", rules::city(form.city.as_deref()));
    let state = errors.take("address.state", rules::state_code(form.state.as_deref()));
    let zip = errors.take("address.zip", rules::zip(form.zip.as_deref()));

    Some(Address {
        street: street?,
        city: city?,
        state: state?,
        zip: zip?,
    })
}

/// Validate either kind of submission.
pub fn validate(
    form: &SubmissionForm,
    now: DateTime<Utc>,
    booking: &BookingRules,
) -> Result<Submission, FieldErrors> {
    match form {
        SubmissionForm::Contact(contact) => validate_contact(contact).map(Submission::Contact),
        SubmissionForm::Event(event) => validate_event(event, now, booking).map(Submission::Event),
    }
}
