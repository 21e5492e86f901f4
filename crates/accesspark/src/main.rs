// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accesspark - crowdsourced accessible parking listings.
//!
//! This is the binary entry point: it serves the same-origin relay and runs
//! listing lifecycle operations from the command line.

mod relay;
mod spots;

use std::path::PathBuf;

use accesspark_config::{AccessParkConfig, ConfigError, Validator};
use clap::{Parser, Subcommand};

use crate::spots::{Login, SpotsCommand};

/// Accesspark - crowdsourced accessible parking listings.
#[derive(Parser, Debug)]
#[command(name = "accesspark", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the XDG hierarchy.
    #[arg(long, global = true, env = "ACCESSPARK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the same-origin relay.
    Relay,
    /// Create an account.
    Signup {
        #[command(flatten)]
        login: Login,
    },
    /// Browse, submit and moderate parking spots.
    Spots {
        #[command(flatten)]
        login: Login,
        /// Print JSON instead of a table.
        #[arg(long, global = true)]
        json: bool,
        #[command(subcommand)]
        action: SpotsCommand,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
}

impl Commands {
    /// The relay only needs the upstream settings; everything else connects
    /// through the facade.
    fn validator(&self) -> Validator {
        match self {
            Self::Relay => accesspark_config::validate_relay_server,
            _ => accesspark_config::validate_config,
        }
    }
}

fn load_config(path: Option<&PathBuf>, validate: Validator) -> AccessParkConfig {
    match accesspark_config::load_and_validate_with(path.map(PathBuf::as_path), validate) {
        Ok(config) => config,
        Err(errors) => exit_with_config_errors(&errors),
    }
}

fn exit_with_config_errors(errors: &[ConfigError]) -> ! {
    accesspark_config::render_errors(errors);
    std::process::exit(1);
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("accesspark={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("accesspark: use --help for available commands");
        return;
    };

    let config = load_config(cli.config.as_ref(), command.validator());
    init_tracing(&config.app.log_level);

    let result = match command {
        Commands::Relay => relay::run_relay(&config).await,
        Commands::Signup { login } => spots::run_signup(&config, login).await,
        Commands::Spots {
            login,
            json,
            action,
        } => spots::run_spots(&config, login, json, action).await,
        Commands::Config => print_config(&config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &AccessParkConfig) -> Result<(), accesspark_core::AccessParkError> {
    let rendered = toml::to_string_pretty(&config.redacted())
        .map_err(|e| accesspark_core::AccessParkError::Internal(format!("render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}
