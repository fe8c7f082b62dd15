//! Configuration management.
//!
//! A config file (JSON, TOML or YAML) is discovered with `prefer` or passed
//! explicitly, then environment variables override individual values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mail::{Mailbox, DEFAULT_ENDPOINT};
use crate::rate_limit::RateLimitConfig;
use crate::validation::{rules, BookingRules};

/// Default port for the intake server.
pub const DEFAULT_PORT: u16 = 3030;

/// Placeholder shown in place of secrets.
const REDACTED: &str = "********";

/// Minimum length for a plausible provider API key.
const API_KEY_MIN_LEN: usize = 16;

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Email API key is not configured")]
    MissingApiKey,
    #[error("Email API key is malformed")]
    InvalidApiKey,
    #[error("Contact email is not configured")]
    MissingContactEmail,
    #[error("Contact email is invalid: {0}")]
    InvalidContactEmail(String),
    #[error("Sender email is invalid: {0}")]
    InvalidSenderEmail(String),
    #[error("Email endpoint is invalid: {0}")]
    InvalidEndpoint(String),
    #[error("Failed to read config file: {0}")]
    Read(String),
    #[error("Failed to parse config file: {0}")]
    Parse(String),
}

fn default_sender_email() -> String {
    "noreply@scoopandcrunch.com".to_string()
}

fn default_sender_name() -> String {
    "Scoop & Crunch".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

/// Outbound email settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettings {
    /// Provider API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Shop inbox receiving notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default = "default_sender_email")]
    pub sender_email: String,
    /// Display name on outgoing mail, also used as the shop name in bodies.
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Send a confirmation to the submitter after a successful notification.
    #[serde(default = "default_true")]
    pub send_confirmation: bool,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            contact_email: None,
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            send_confirmation: true,
        }
    }
}

/// Validated secrets and addresses needed to send mail.
#[derive(Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub api_key: String,
    pub contact: Mailbox,
    pub sender: Mailbox,
    pub endpoint: String,
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("api_key", &REDACTED)
            .field("contact", &self.contact)
            .field("sender", &self.sender)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl MailSettings {
    /// Check that everything needed to send is present and well formed.
    pub fn credentials(&self) -> Result<MailCredentials, ConfigError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        if api_key.len() < API_KEY_MIN_LEN || !api_key.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ConfigError::InvalidApiKey);
        }

        let contact_email = rules::present(self.contact_email.as_deref())
            .ok_or(ConfigError::MissingContactEmail)?;
        let contact_email =
            rules::email(Some(contact_email)).map_err(ConfigError::InvalidContactEmail)?;
        let sender_email =
            rules::email(Some(&self.sender_email)).map_err(ConfigError::InvalidSenderEmail)?;

        let endpoint = url::Url::parse(self.endpoint.trim())
            .map_err(|e| ConfigError::InvalidEndpoint(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                endpoint.scheme()
            )));
        }

        Ok(MailCredentials {
            api_key: api_key.to_string(),
            contact: Mailbox::new(contact_email, Some(self.sender_name.clone())),
            sender: Mailbox::new(sender_email, Some(self.sender_name.clone())),
            endpoint: endpoint.to_string(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    /// Bind address for `serve` (`PORT`, `HOST` or `HOST:PORT`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Origins allowed to post forms from a browser.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cors_origins: Vec<String>,
    /// Take the caller address from `X-Forwarded-For`/`X-Real-IP`.
    /// Only enable behind a reverse proxy that sets these headers.
    pub trust_proxy_headers: bool,
    /// Maps API key exposed to the site for address autocomplete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_api_key: Option<String>,
    pub mail: MailSettings,
    pub rate_limits: RateLimitConfig,
    pub booking: BookingRules,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a `scoopdesk` config file in the standard locations.
    /// Falls back to defaults when none is found or it cannot be read.
    pub async fn load() -> Self {
        match prefer::load("scoopdesk").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config at {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path; format follows the extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub environment: Environment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    pub cors_origins: Vec<String>,
    pub trust_proxy_headers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_api_key: Option<String>,
    pub mail: MailSettings,
    pub rate_limits: RateLimitConfig,
    pub booking: BookingRules,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl From<Config> for Settings {
    fn from(config: Config) -> Self {
        Self {
            environment: config.environment.unwrap_or_default(),
            bind: config.bind,
            cors_origins: config.cors_origins,
            trust_proxy_headers: config.trust_proxy_headers,
            maps_api_key: config.maps_api_key,
            mail: config.mail,
            rate_limits: config.rate_limits,
            booking: config.booking,
            source_path: config.source_path,
        }
    }
}

impl Settings {
    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(env) = get("SCOOP_ENV") {
            match Environment::from_str(&env) {
                Some(env) => self.environment = env,
                None => tracing::warn!("Ignoring unknown SCOOP_ENV value: {}", env),
            }
        }
        if let Some(key) = get("BREVO_API_KEY") {
            self.mail.api_key = Some(key);
        }
        if let Some(email) = get("CONTACT_EMAIL") {
            self.mail.contact_email = Some(email);
        }
        if let Some(email) = get("SENDER_EMAIL") {
            self.mail.sender_email = email;
        }
        if let Some(name) = get("SENDER_NAME") {
            self.mail.sender_name = name;
        }
        if let Some(endpoint) = get("BREVO_ENDPOINT") {
            self.mail.endpoint = endpoint;
        }
        if let Some(key) = get("GOOGLE_MAPS_API_KEY") {
            self.maps_api_key = Some(key);
        }
        if let Some(bind) = get("SCOOP_BIND") {
            self.bind = Some(bind);
        }
        if let Some(trust) = get("SCOOP_TRUST_PROXY") {
            match trust.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.trust_proxy_headers = true,
                "0" | "false" | "no" => self.trust_proxy_headers = false,
                _ => tracing::warn!("Ignoring unknown SCOOP_TRUST_PROXY value: {}", trust),
            }
        }
        self
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Copy with secrets replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.mail.api_key.is_some() {
            copy.mail.api_key = Some(REDACTED.to_string());
        }
        if copy.maps_api_key.is_some() {
            copy.maps_api_key = Some(REDACTED.to_string());
        }
        copy
    }
}

/// Load settings from `config_path` (or discovery) plus environment overrides.
///
/// An explicit path that cannot be read or parsed is an error; a discovered
/// file that fails is skipped with a warning.
pub async fn load_settings(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let config = match config_path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            Config::load_from_path(Path::new(&expanded)).await?
        }
        None => Config::load().await,
    };

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    Ok(Settings::from(config).with_env_overrides())
}
