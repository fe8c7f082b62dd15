//! Intake server command.

use std::net::{IpAddr, SocketAddr};

use console::style;

use crate::cli::icons;
use crate::config::{Settings, DEFAULT_PORT};

/// Start the intake server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    match settings.mail.credentials() {
        Ok(creds) => println!(
            "  {} Delivering to {} via {}",
            icons::success(),
            creds.contact.email,
            creds.endpoint
        ),
        Err(e) => eprintln!(
            "  {} {} (submissions will fail until this is fixed)",
            icons::error(),
            e
        ),
    }

    println!(
        "{} Starting scoopdesk ({}) at http://{}:{}",
        icons::info(),
        style(settings.environment.as_str()).bold(),
        url_host(&host),
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
/// - IPv6, bare or bracketed: "::1", "[::1]", "[::1]:3030"
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Bind address is empty");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Ok(addr) = bind.parse::<SocketAddr>() {
        return Ok((addr.ip().to_string(), addr.port()));
    }

    let unbracketed = bind
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .unwrap_or(bind);
    if let Ok(ip) = unbracketed.parse::<IpAddr>() {
        return Ok((ip.to_string(), DEFAULT_PORT));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

/// Host as it appears in a URL; IPv6 literals get brackets.
fn url_host(host: &str) -> String {
    if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}
