//! Caller-facing dispatch outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::mail::ApiError;
use crate::rate_limit::RateLimited;
use crate::validation::FieldErrors;

/// Message returned for every configuration failure.
pub const MISCONFIGURED_MESSAGE: &str = "Email service configuration error";

/// Message returned when the submission fails validation.
pub const VALIDATION_MESSAGE: &str = "Please correct the highlighted fields and try again.";

/// Message returned for failures the caller cannot act on.
pub const UNEXPECTED_MESSAGE: &str = "Failed to send email. Please try again later.";

/// Why a dispatch failed.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{}", .0.message)]
    RateLimited(RateLimited),
    #[error("Email service configuration error")]
    Misconfigured(#[source] ConfigError),
    #[error("Validation failed: {0}")]
    ValidationFailed(FieldErrors),
    #[error("{}", .0.message)]
    Provider(ApiError),
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

/// Failure detail, present only for the variants that carry one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<FieldErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_error: Option<ApiError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<DateTime<Utc>>,
}

/// Uniform result of a dispatch, whatever stage it stopped at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ResultDetails>,
}

impl DispatchResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            details: None,
        }
    }

    /// Failure carrying field errors, used for bodies that never reach validation.
    pub fn invalid(errors: FieldErrors) -> Self {
        DispatchError::ValidationFailed(errors).into()
    }

    pub fn validation_errors(&self) -> Option<&FieldErrors> {
        self.details.as_ref()?.validation_errors.as_ref()
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        self.details.as_ref()?.api_error.as_ref()
    }

    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        self.details.as_ref()?.reset_time
    }
}

impl From<DispatchError> for DispatchResult {
    fn from(err: DispatchError) -> Self {
        let (error, details) = match err {
            DispatchError::RateLimited(limited) => (
                limited.message,
                Some(ResultDetails {
                    reset_time: Some(limited.reset_time),
                    ..Default::default()
                }),
            ),
            DispatchError::Misconfigured(_) => (MISCONFIGURED_MESSAGE.to_string(), None),
            DispatchError::ValidationFailed(errors) => (
                VALIDATION_MESSAGE.to_string(),
                Some(ResultDetails {
                    validation_errors: Some(errors),
                    ..Default::default()
                }),
            ),
            DispatchError::Provider(api) => (
                api.message.clone(),
                Some(ResultDetails {
                    api_error: Some(api),
                    ..Default::default()
                }),
            ),
            DispatchError::Unexpected(_) => (UNEXPECTED_MESSAGE.to_string(), None),
        };

        Self {
            success: false,
            error: Some(error),
            details,
        }
    }
}
