//! Error types for policysign

use crate::policy::DenyReason;
use std::fmt;
use thiserror::Error;

/// Exit code for a successful run
pub const EXIT_SUCCESS: u8 = 0;

/// Policy denied the transfer
pub const EXIT_POLICY_DENIED: u8 = 1;

/// Invalid input or configuration
pub const EXIT_INVALID_INPUT: u8 = 2;

/// Key material could not be loaded
pub const EXIT_KEY_ERROR: u8 = 3;

/// Policy could not be loaded
pub const EXIT_POLICY_LOAD: u8 = 4;

/// Signature primitive failed
pub const EXIT_SIGNING: u8 = 5;

/// Signed transaction could not be encoded
pub const EXIT_SERIALIZATION: u8 = 6;

/// Internal failure (pipeline bug, process hardening)
pub const EXIT_INTERNAL: u8 = 70;

/// Main error type for policysign operations
#[derive(Error, Debug)]
pub enum SignerError {
    // Input errors
    #[error("Key error: {0}")]
    Key(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    // Policy errors
    #[error("Failed to load policy: {0}")]
    PolicyLoad(String),

    #[error("Policy violation: {0}")]
    PolicyViolation(DenyReason),

    // Chain errors
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Process errors
    #[error("Memory protection failed: {0}")]
    MemoryProtection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SignerError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            SignerError::PolicyViolation(_) => EXIT_POLICY_DENIED,
            SignerError::Key(_) => EXIT_KEY_ERROR,
            SignerError::PolicyLoad(_) => EXIT_POLICY_LOAD,
            SignerError::Signing(_) => EXIT_SIGNING,
            SignerError::Serialization(_) => EXIT_SERIALIZATION,
            SignerError::InvalidAmount(_)
            | SignerError::InvalidRecipient(_)
            | SignerError::InvalidTransaction(_)
            | SignerError::Config(_) => EXIT_INVALID_INPUT,
            SignerError::MemoryProtection(_) | SignerError::Internal(_) => EXIT_INTERNAL,
        }
    }
}

impl From<serde_json::Error> for SignerError {
    fn from(err: serde_json::Error) -> Self {
        SignerError::PolicyLoad(format!("JSON error: {}", err))
    }
}

impl From<rlp::DecoderError> for SignerError {
    fn from(err: rlp::DecoderError) -> Self {
        SignerError::InvalidTransaction(format!("RLP error: {}", err))
    }
}

impl From<config::ConfigError> for SignerError {
    fn from(err: config::ConfigError) -> Self {
        SignerError::Config(err.to_string())
    }
}

/// Pipeline states, in the only order they can be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    KeyLoaded,
    PolicyLoaded,
    PolicyApproved,
    TxBuilt,
    TxSigned,
    Serialized,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::KeyLoaded => "key-loaded",
            Stage::PolicyLoaded => "policy-loaded",
            Stage::PolicyApproved => "policy-approved",
            Stage::TxBuilt => "tx-built",
            Stage::TxSigned => "tx-signed",
            Stage::Serialized => "serialized",
            Stage::Done => "done",
        }
    }

    /// The state that follows this one, `None` once done
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Start => Some(Stage::KeyLoaded),
            Stage::KeyLoaded => Some(Stage::PolicyLoaded),
            Stage::PolicyLoaded => Some(Stage::PolicyApproved),
            Stage::PolicyApproved => Some(Stage::TxBuilt),
            Stage::TxBuilt => Some(Stage::TxSigned),
            Stage::TxSigned => Some(Stage::Serialized),
            Stage::Serialized => Some(Stage::Done),
            Stage::Done => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a pipeline run
///
/// `stage` is the state the pipeline was trying to reach when it stopped.
#[derive(Error, Debug)]
#[error("signing aborted at {stage}: {error}")]
pub struct Aborted {
    pub stage: Stage,
    #[source]
    pub error: SignerError,
}

impl Aborted {
    pub fn new(stage: Stage, error: SignerError) -> Self {
        Self { stage, error }
    }

    pub fn exit_code(&self) -> u8 {
        self.error.exit_code()
    }
}

pub type Result<T> = std::result::Result<T, SignerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_POLICY_DENIED,
            EXIT_INVALID_INPUT,
            EXIT_KEY_ERROR,
            EXIT_POLICY_LOAD,
            EXIT_SIGNING,
            EXIT_SERIALIZATION,
            EXIT_INTERNAL,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_policy_violation_maps_to_denied() {
        let err = SignerError::PolicyViolation(DenyReason::RecipientNotWhitelisted);
        assert_eq!(err.exit_code(), EXIT_POLICY_DENIED);
        assert_eq!(
            err.to_string(),
            "Policy violation: recipient not in whitelist"
        );
    }

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::Start;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(stage, Stage::Done);
    }

    #[test]
    fn test_aborted_names_stage() {
        let aborted = Aborted::new(
            Stage::PolicyLoaded,
            SignerError::PolicyLoad("missing field `max_amount_wei`".to_string()),
        );
        let msg = aborted.to_string();
        assert!(msg.starts_with("signing aborted at policy-loaded"));
        assert!(msg.contains("max_amount_wei"));
        assert_eq!(aborted.exit_code(), EXIT_POLICY_LOAD);
    }
}
