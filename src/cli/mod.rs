//! Command line interface
//!
//! ```text
//! policysign sign   --key <HEX> --to <ADDR> --amount <WEI> [--nonce N] [--chain ID] [--policy PATH] [--format hex|json]
//! policysign check  --to <ADDR> --amount <WEI> [--policy PATH]
//! policysign decode <RAW_HEX>
//! ```
//!
//! The key may also come from `POLICYSIGN_KEY` so it stays out of the
//! process list.

pub mod commands;

use crate::config::OutputFormat;
use crate::errors::{Aborted, SignerError};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "policysign", version, about = "Policy-gated Ethereum transfer signer")]
pub struct Cli {
    /// Path to a configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check a transfer against the policy, then sign it
    Sign(SignArgs),
    /// Evaluate a transfer against the policy without signing
    Check(CheckArgs),
    /// Decode a signed transaction and recover its sender
    Decode(DecodeArgs),
}

#[derive(Args)]
pub struct SignArgs {
    /// Private key in hex
    #[arg(short = 'k', long, env = "POLICYSIGN_KEY", hide_env_values = true)]
    pub key: String,

    /// Recipient address
    #[arg(long)]
    pub to: String,

    /// Amount in wei
    #[arg(long)]
    pub amount: String,

    /// Account nonce
    #[arg(long, default_value_t = 0)]
    pub nonce: u64,

    /// Chain id (defaults to the configured one)
    #[arg(long)]
    pub chain: Option<u64>,

    /// Path to policy JSON file (defaults to the configured one)
    #[arg(long, value_name = "PATH")]
    pub policy: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Recipient address
    #[arg(long)]
    pub to: String,

    /// Amount in wei
    #[arg(long)]
    pub amount: String,

    /// Path to policy JSON file (defaults to the configured one)
    #[arg(long, value_name = "PATH")]
    pub policy: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Signed transaction in hex (optional 0x prefix)
    pub raw: String,
}

/// Failure of a command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Aborted(#[from] Aborted),

    #[error(transparent)]
    Failed(#[from] SignerError),
}

impl CommandError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::Aborted(e) => e.exit_code(),
            CommandError::Failed(e) => e.exit_code(),
        }
    }
}
