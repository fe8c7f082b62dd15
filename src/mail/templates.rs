//! HTML bodies for notification and confirmation emails.
//!
//! Callers must pass sanitized submissions; values are interpolated as-is.

use crate::models::{ContactRequest, EventBooking, Submission, SubmissionKind};
use crate::utils::html_escape;

fn layout(title: &str, rows: &[(&str, &str)], footer: &str) -> String {
    let mut body = String::new();
    body.push_str("<!DOCTYPE html><html><body style=\"font-family: sans-serif; color: #333;\">");
    body.push_str(&format!("<h2>{}</h2>", title));
    body.push_str("<table cellpadding=\"6\" style=\"border-collapse: collapse;\">");
    for (label, value) in rows {
        body.push_str(&format!(
            "<tr><td style=\"font-weight: bold; vertical-align: top;\">{}</td><td>{}</td></tr>",
            label, value
        ));
    }
    body.push_str("</table>");
    if !footer.is_empty() {
        body.push_str(&format!("<p style=\"color: #777;\">{}</p>", footer));
    }
    body.push_str("</body></html>");
    body
}

fn message_block(message: &str) -> String {
    format!("<div style=\"white-space: pre-wrap;\">{}</div>", message)
}

/// Notification sent to the shop for a contact form.
pub fn contact_notification(contact: &ContactRequest) -> String {
    let message = message_block(&contact.message);
    let mut rows = vec![("Name", contact.name.as_str()), ("Email", contact.email.as_str())];
    if let Some(phone) = contact.phone.as_deref() {
        rows.push(("Phone", phone));
    }
    if let Some(subject) = contact.subject.as_deref() {
        rows.push(("Subject", subject));
    }
    rows.push(("Message", message.as_str()));
    layout(
        "New Contact Form Submission",
        &rows,
        "Reply to this email to respond directly.",
    )
}

/// Notification sent to the shop for an event booking.
pub fn event_notification(event: &EventBooking) -> String {
    let date = event.event_date.format("%A, %B %-d, %Y").to_string();
    let time = event.time_range();
    let guests = event.guest_count.to_string();
    let address = event.address.one_line();
    let message = event.message.as_deref().map(message_block);

    let mut rows = vec![
        ("Name", event.name.as_str()),
        ("Email", event.email.as_str()),
        ("Phone", event.phone.as_str()),
        ("Event type", event.event_type.label()),
        ("Date", date.as_str()),
        ("Time", time.as_str()),
        ("Guests", guests.as_str()),
        ("Location", address.as_str()),
    ];
    if let Some(message) = message.as_deref() {
        rows.push(("Details", message));
    }
    layout(
        "New Event Booking Request",
        &rows,
        "Reply to this email to follow up with the customer.",
    )
}

/// Confirmation sent back to the submitter.
pub fn confirmation(submission: &Submission, shop_name: &str) -> String {
    let shop = html_escape(shop_name);
    match submission {
        Submission::Contact(contact) => {
            let greeting = format!(
                "Hi {}, thanks for reaching out to {}! We read every message and will get back to you soon.",
                contact.name, shop
            );
            layout(
                "We received your message",
                &[("", greeting.as_str())],
                "This is an automated confirmation. No need to reply.",
            )
        }
        Submission::Event(event) => {
            let greeting = format!(
                "Hi {}, thanks for thinking of {} for your {}! We'll confirm availability within two business days.",
                event.name,
                shop,
                event.event_type.label().to_lowercase()
            );
            let date = event.event_date.format("%A, %B %-d, %Y").to_string();
            let time = event.time_range();
            layout(
                "We received your event request",
                &[("", greeting.as_str()), ("Date", date.as_str()), ("Time", time.as_str())],
                "This is an automated confirmation. No need to reply.",
            )
        }
    }
}

/// Subject line for the submitter confirmation.
pub fn confirmation_subject(kind: SubmissionKind) -> &'static str {
    match kind {
        SubmissionKind::Contact => "We received your message",
        SubmissionKind::Event => "We received your event request",
    }
}
