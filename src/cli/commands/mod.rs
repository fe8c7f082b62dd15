//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod serve;
mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;
use crate::models::SubmissionKind;

#[derive(Parser)]
#[command(name = "scoop")]
#[command(about = "Form intake and email dispatch for the shop website")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the form intake server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:3030)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Validate a JSON submission without sending anything
    Validate {
        /// JSON file holding the submission
        file: PathBuf,
        /// Submission kind (read from the file's "kind" field when omitted)
        #[arg(short, long, value_enum)]
        kind: Option<SubmissionKind>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Verify that email delivery is fully configured
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind
                .or_else(|| settings.bind.clone())
                .unwrap_or_else(|| format!("127.0.0.1:{}", crate::config::DEFAULT_PORT));
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&settings),
            ConfigCommands::Check => config_cmd::cmd_config_check(&settings),
        },
        Commands::Validate { file, kind } => validate::cmd_validate(&settings, &file, kind).await,
    }
}
