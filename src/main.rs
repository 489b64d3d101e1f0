//! policysign command line entry point
//!
//! ```bash
//! POLICYSIGN_KEY=<hex> policysign sign --to 0x... --amount 1000 --policy policy.json
//! policysign check --to 0x... --amount 1000
//! policysign decode f86c...
//! ```
//!
//! Stdout carries only the command result. Logs go to stderr.

use clap::Parser;
use policysign::cli::{commands, Cli};
use policysign::config::{LoggingConfig, Settings};
use policysign::security::setup_memory_protection;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    init_logging(&settings.logging);

    info!("Starting policysign v{}", VERSION);

    if settings.security.disable_core_dumps {
        if let Err(e) = setup_memory_protection() {
            warn!("Could not set up memory protection: {}", e);
        }
    }

    match commands::run(cli.command, &settings) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(code = e.exit_code(), "Command failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
