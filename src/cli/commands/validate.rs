//! Offline submission validation.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use console::style;

use crate::cli::icons::{error, success};
use crate::config::Settings;
use crate::models::{Submission, SubmissionForm, SubmissionKind};
use crate::validation::{self, BookingRules, FieldErrors};

/// Validate a JSON submission file and print the normalized result.
pub async fn cmd_validate(
    settings: &Settings,
    file: &Path,
    kind: Option<SubmissionKind>,
) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    match check(&contents, kind, Utc::now(), &settings.booking)? {
        Ok(submission) => {
            println!(
                "{} Valid {} submission",
                success(),
                submission.kind().as_str()
            );
            println!("{}", serde_json::to_string_pretty(&submission)?);
            Ok(())
        }
        Err(errors) => {
            eprintln!("{} {} field(s) failed validation", error(), errors.len());
            for (field, messages) in errors.iter() {
                for message in messages {
                    eprintln!("  {} {}", style(field).bold(), message);
                }
            }
            anyhow::bail!("Submission is invalid")
        }
    }
}

/// Parse `contents` as the given kind and validate it against `now`.
///
/// The outer error is for unparsable input; the inner one carries field errors.
fn check(
    contents: &str,
    kind: Option<SubmissionKind>,
    now: DateTime<Utc>,
    booking: &BookingRules,
) -> anyhow::Result<Result<Submission, FieldErrors>> {
    let form = match kind {
        Some(SubmissionKind::Contact) => SubmissionForm::Contact(
            serde_json::from_str(contents).context("Invalid contact form JSON")?,
        ),
        Some(SubmissionKind::Event) => SubmissionForm::Event(
            serde_json::from_str(contents).context("Invalid event booking JSON")?,
        ),
        None => serde_json::from_str(contents)
            .context("Invalid submission JSON (pass --kind or include a \"kind\" field)")?,
    };
    Ok(validation::validate(&form, now, booking))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_check_contact_by_flag() {
        let json = r#"{"name": "Jane Doe", "email": " Jane@Example.com", "message": "Hello there, scoops!"}"#;
        let submission = check(json, Some(SubmissionKind::Contact), now(), &BookingRules::default())
            .unwrap()
            .unwrap();
        assert_eq!(submission.email(), "jane@example.com");
    }

    #[test]
    fn test_check_uses_kind_field() {
        let json = r#"{"kind": "event", "name": "Sam Lee"}"#;
        let errors = check(json, None, now(), &BookingRules::default())
            .unwrap()
            .unwrap_err();
        assert!(errors.contains("eventDate"));
        assert!(errors.contains("address.zip"));
    }

    #[test]
    fn test_check_rejects_untagged_without_kind() {
        let json = r#"{"name": "Sam Lee"}"#;
        assert!(check(json, None, now(), &BookingRules::default()).is_err());
    }

    #[tokio::test]
    async fn test_cmd_validate_reports_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"name": "J", "email": "nope", "message": "short"}}"#).unwrap();

        let result = cmd_validate(
            &Settings::default(),
            file.path(),
            Some(SubmissionKind::Contact),
        )
        .await;
        assert_eq!(result.unwrap_err().to_string(), "Submission is invalid");
    }
}
