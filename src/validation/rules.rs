//! Per-field validation rules.
//!
//! Each rule takes the raw value and returns the normalized value or the
//! first message that applies.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::models::EventType;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 100;
pub const SUBJECT_MAX: usize = 100;
pub const MESSAGE_MIN: usize = 10;
pub const MESSAGE_MAX: usize = 1000;
pub const STREET_MAX: usize = 200;
pub const CITY_MAX: usize = 100;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-']+$").unwrap());

static CITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-'.]+$").unwrap());

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$").unwrap()
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").unwrap());

static STATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{5}$").unwrap());

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap());

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Trimmed value, or `None` when absent or blank.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn required<'a>(value: Option<&'a str>, label: &str) -> Result<&'a str, String> {
    present(value).ok_or_else(|| format!("{} is required", label))
}

pub fn name(value: Option<&str>) -> Result<String, String> {
    let name = required(value, "Name")?;
    let len = name.chars().count();
    if len < NAME_MIN {
        return Err(format!("Name must be at least {} characters", NAME_MIN));
    }
    if len > NAME_MAX {
        return Err(format!("Name must be {} characters or less", NAME_MAX));
    }
    if !NAME_RE.is_match(name) {
        return Err("Name can only contain letters, spaces, hyphens, and apostrophes".to_string());
    }
    Ok(name.to_string())
}

pub fn email(value: Option<&str>) -> Result<String, String> {
    let email = required(value, "Email")?.to_lowercase();
    if email.chars().count() > EMAIL_MAX {
        return Err(format!("Email must be {} characters or less", EMAIL_MAX));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(email)
}

pub fn phone(value: &str) -> Result<String, String> {
    let phone = value.trim();
    if !PHONE_RE.is_match(phone) {
        return Err("Phone number must be in the format (XXX) XXX-XXXX".to_string());
    }
    Ok(phone.to_string())
}

/// Length-bounded free text. `min` of zero means only the maximum applies.
pub fn text(value: &str, label: &str, min: usize, max: usize) -> Result<String, String> {
    let text = value.trim();
    let len = text.chars().count();
    if len < min {
        return Err(format!("{} must be at least {} characters", label, min));
    }
    if len > max {
        return Err(format!("{} must be {} characters or less", label, max));
    }
    Ok(text.to_string())
}

pub fn date(value: Option<&str>) -> Result<NaiveDate, String> {
    let raw = required(value, "Event date")?;
    if !DATE_RE.is_match(raw) {
        return Err("Please enter a valid date (YYYY-MM-DD)".to_string());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| "Please enter a valid date (YYYY-MM-DD)".to_string())
}

pub fn time(value: Option<&str>, label: &str) -> Result<NaiveTime, String> {
    let raw = required(value, label)?;
    let invalid = || "Please enter a valid time (HH:MM)".to_string();
    let caps = TIME_RE.captures(raw).ok_or_else(invalid)?;
    let hour = caps[1].parse::<u32>().map_err(|_| invalid())?;
    let minute = caps[2].parse::<u32>().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub fn event_type(value: Option<&str>) -> Result<EventType, String> {
    let raw = required(value, "Event type")?;
    EventType::from_str(raw).ok_or_else(|| "Please select a valid event type".to_string())
}

pub fn guest_count(value: Option<&serde_json::Value>, min: u32, max: u32) -> Result<u32, String> {
    let not_whole = || "Guest count must be a whole number".to_string();
    let count: i128 = match value {
        None | Some(serde_json::Value::Null) => return Err("Guest count is required".to_string()),
        Some(serde_json::Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                i128::from(v)
            } else if let Some(v) = n.as_u64() {
                i128::from(v)
            } else {
                match n.as_f64() {
                    // Float casts saturate, so huge whole values still compare as huge.
                    Some(f) if f.is_finite() && f.fract() == 0.0 => f as i128,
                    _ => return Err(not_whole()),
                }
            }
        }
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
            return Err("Guest count is required".to_string())
        }
        Some(serde_json::Value::String(s)) => whole_number(s.trim()).ok_or_else(not_whole)?,
        Some(_) => return Err(not_whole()),
    };

    if count < i128::from(min) {
        return Err(format!("Guest count must be at least {}", min));
    }
    if count > i128::from(max) {
        return Err(format!("Guest count cannot exceed {}", max));
    }
    Ok(count as u32)
}

/// Integer text, saturating when the digits are too long to parse.
fn whole_number(s: &str) -> Option<i128> {
    if let Ok(v) = s.parse::<i128>() {
        return Some(v);
    }
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i128::MIN } else { i128::MAX })
}

pub fn city(value: Option<&str>) -> Result<String, String> {
    let city = required(value, "City")?;
    if city.chars().count() > CITY_MAX {
        return Err(format!("City must be {} characters or less", CITY_MAX));
    }
    if !CITY_RE.is_match(city) {
        return Err("Please enter a valid city name".to_string());
    }
    Ok(city.to_string())
}

pub fn state_code(value: Option<&str>) -> Result<String, String> {
    let state = required(value, "State")?.to_uppercase();
    if !STATE_RE.is_match(&state) {
        return Err("State must be a 2-letter code".to_string());
    }
    Ok(state)
}

pub fn zip(value: Option<&str>) -> Result<String, String> {
    let zip = required(value, "ZIP code")?;
    if !ZIP_RE.is_match(zip) {
        return Err("ZIP code must be 5 digits".to_string());
    }
    Ok(zip.to_string())
}
