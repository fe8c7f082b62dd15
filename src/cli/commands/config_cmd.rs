//! Configuration management commands.

use crate::cli::icons::{dim_arrow, error, success, warn};
use crate::config::Settings;

/// Print the effective configuration with secrets redacted.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    let source = settings
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults and environment".to_string());
    eprintln!("{} Source: {}", dim_arrow(), source);

    println!("{}", serde_json::to_string_pretty(&settings.redacted())?);
    Ok(())
}

/// Verify that mail credentials are present and well formed.
pub fn cmd_config_check(settings: &Settings) -> anyhow::Result<()> {
    match settings.mail.credentials() {
        Ok(creds) => {
            println!("{} Email delivery is configured", success());
            println!("  {} Notifications to {}", dim_arrow(), creds.contact.email);
            println!("  {} Sent as {}", dim_arrow(), creds.sender.email);
            println!("  {} Endpoint {}", dim_arrow(), creds.endpoint);
            if settings.maps_api_key.is_none() {
                println!(
                    "  {} Maps API key not set; address autocomplete is disabled",
                    warn()
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", error(), e);
            anyhow::bail!("Email service configuration error")
        }
    }
}
