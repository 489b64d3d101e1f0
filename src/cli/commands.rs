//! Command handlers
//!
//! Each handler returns the text for stdout; `main` prints it and maps
//! failures to exit codes.

use crate::cli::{CheckArgs, Command, CommandError, DecodeArgs, SignArgs};
use crate::config::{OutputFormat, Settings};
use crate::crypto::Address;
use crate::errors::{Result, SignerError};
use crate::policy::{FilePolicySource, PolicySource, TransferRequest};
use crate::signer::{
    to_display_hex, Eip155Codec, SignedTransaction, SigningPipeline, SigningRequest,
};
use secrecy::SecretString;
use serde::Serialize;
use tracing::info;

/// JSON view of a signed transaction
#[derive(Debug, Serialize)]
pub struct TransactionReport {
    pub raw_transaction: String,
    pub transaction_hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: String,
    pub chain_id: u64,
}

impl TransactionReport {
    fn new(raw: &[u8], hash: &[u8; 32], from: &Address, tx: &SignedTransaction) -> Self {
        Self {
            raw_transaction: to_display_hex(raw),
            transaction_hash: format!("0x{}", to_display_hex(hash)),
            from: from.to_checksum(),
            to: tx.tx.to.to_checksum(),
            value: tx.tx.value.to_string(),
            nonce: tx.tx.nonce,
            gas_limit: tx.tx.gas_limit,
            gas_price: tx.tx.gas_price.to_string(),
            chain_id: tx.tx.chain_id,
        }
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SignerError::Serialization(e.to_string()))
    }
}

/// Dispatch a parsed command
pub fn run(command: Command, settings: &Settings) -> std::result::Result<String, CommandError> {
    match command {
        Command::Sign(args) => sign(args, settings),
        Command::Check(args) => check(args, settings).map_err(CommandError::from),
        Command::Decode(args) => decode(args).map_err(CommandError::from),
    }
}

/// Run the signing pipeline
pub fn sign(args: SignArgs, settings: &Settings) -> std::result::Result<String, CommandError> {
    let chain_id = args.chain.unwrap_or(settings.signer.chain_id);
    if chain_id == 0 {
        return Err(SignerError::Config("chain id must be at least 1".to_string()).into());
    }

    let policy_path = args
        .policy
        .unwrap_or_else(|| settings.signer.policy_path.clone());
    let format = args.format.unwrap_or(settings.signer.output_format);

    let request = SigningRequest {
        key: SecretString::new(args.key),
        recipient: args.to,
        amount: args.amount,
        nonce: args.nonce,
        chain_id,
    };

    let output = SigningPipeline::new().run(&request, &FilePolicySource::new(&policy_path))?;

    match format {
        OutputFormat::Hex => Ok(output.raw_hex()),
        OutputFormat::Json => Ok(TransactionReport::new(
            &output.raw_transaction,
            &output.transaction_hash,
            &output.from,
            &output.transaction,
        )
        .to_json()?),
    }
}

/// Evaluate a transfer without any key material
pub fn check(args: CheckArgs, settings: &Settings) -> Result<String> {
    let policy_path = args
        .policy
        .unwrap_or_else(|| settings.signer.policy_path.clone());

    let policy = FilePolicySource::new(&policy_path).load()?;
    let transfer = TransferRequest::parse(&args.to, &args.amount)?;
    policy.evaluate(&transfer).into_result()?;

    info!(
        "Policy allows transfer of {} wei to {}",
        transfer.amount, transfer.recipient
    );
    Ok(format!(
        "allowed: {} wei to {}",
        transfer.amount, transfer.recipient
    ))
}

/// Decode a raw signed transaction
pub fn decode(args: DecodeArgs) -> Result<String> {
    let trimmed = args.raw.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let raw = hex::decode(digits)
        .map_err(|e| SignerError::InvalidTransaction(format!("hex decode error: {}", e)))?;

    let decoded = Eip155Codec::decode(&raw)?;
    TransactionReport::new(&raw, &decoded.hash, &decoded.sender, &decoded.transaction).to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Stage;
    use crate::policy::DenyReason;
    use std::fs;
    use tempfile::TempDir;

    const KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";
    const ALLOWED: &str = "0x1111111111111111111111111111111111111111";

    fn write_policy(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("policy.json");
        fs::write(
            &path,
            format!(r#"{{"max_amount_wei": 1000, "whitelist": ["{}"]}}"#, ALLOWED),
        )
        .unwrap();
        path
    }

    fn sign_args(policy: std::path::PathBuf, amount: &str, format: OutputFormat) -> SignArgs {
        SignArgs {
            key: KEY.to_string(),
            to: ALLOWED.to_string(),
            amount: amount.to_string(),
            nonce: 0,
            chain: None,
            policy: Some(policy),
            format: Some(format),
        }
    }

    #[test]
    fn test_sign_then_decode() {
        let dir = TempDir::new().unwrap();
        let policy = write_policy(&dir);
        let settings = Settings::default();

        let raw = sign(sign_args(policy, "1000", OutputFormat::Hex), &settings).unwrap();
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let report = decode(DecodeArgs { raw: format!("0x{}", raw) }).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(json["value"], "1000");
        assert_eq!(json["chain_id"], 1);
        assert_eq!(json["from"], "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F");
        assert_eq!(json["raw_transaction"], raw);
    }

    #[test]
    fn test_sign_json_report() {
        let dir = TempDir::new().unwrap();
        let policy = write_policy(&dir);

        let out = sign(sign_args(policy, "5", OutputFormat::Json), &Settings::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["value"], "5");
        assert_eq!(json["gas_limit"], 21_000);
        assert_eq!(json["gas_price"], "1000000000");
        assert!(json["transaction_hash"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn test_sign_denied_exit_code() {
        let dir = TempDir::new().unwrap();
        let policy = write_policy(&dir);

        let err = sign(sign_args(policy, "1001", OutputFormat::Hex), &Settings::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::errors::EXIT_POLICY_DENIED);
        match err {
            CommandError::Aborted(aborted) => assert_eq!(aborted.stage, Stage::PolicyApproved),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sign_rejects_zero_chain() {
        let dir = TempDir::new().unwrap();
        let mut args = sign_args(write_policy(&dir), "1", OutputFormat::Hex);
        args.chain = Some(0);
        let err = sign(args, &Settings::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::errors::EXIT_INVALID_INPUT);
    }

    #[test]
    fn test_check_allow_and_deny() {
        let dir = TempDir::new().unwrap();
        let policy = write_policy(&dir);
        let settings = Settings::default();

        let ok = check(
            CheckArgs {
                to: ALLOWED.to_uppercase().replace("0X", "0x"),
                amount: "1000".to_string(),
                policy: Some(policy.clone()),
            },
            &settings,
        )
        .unwrap();
        assert!(ok.starts_with("allowed"));

        let denied = check(
            CheckArgs {
                to: "0x2222222222222222222222222222222222222222".to_string(),
                amount: "1".to_string(),
                policy: Some(policy),
            },
            &settings,
        );
        assert!(matches!(
            denied,
            Err(SignerError::PolicyViolation(DenyReason::RecipientNotWhitelisted))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode(DecodeArgs { raw: "zz".to_string() }),
            Err(SignerError::InvalidTransaction(_))
        ));
        assert!(decode(DecodeArgs { raw: "c0".to_string() }).is_err());
    }
}
