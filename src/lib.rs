//! policysign - policy-gated Ethereum transfer signer
//!
//! Checks a requested transfer against an operator policy (a recipient
//! whitelist and a per-transfer wei limit) and only then builds, signs and
//! serializes a legacy EIP-155 transaction.
//!
//! # Security
//!
//! - Key material is held in `SecretString`/`SecureBytes` and zeroed on drop
//! - Key bytes never appear in errors or logs
//! - A denied transfer never reaches the signing primitive
//! - Core dumps are disabled at startup on Linux
//!
//! ```no_run
//! use policysign::policy::FilePolicySource;
//! use policysign::signer::{SigningPipeline, SigningRequest};
//! use secrecy::SecretString;
//!
//! let request = SigningRequest {
//!     key: SecretString::new(std::env::var("POLICYSIGN_KEY").unwrap_or_default()),
//!     recipient: "0x1111111111111111111111111111111111111111".to_string(),
//!     amount: "1000".to_string(),
//!     nonce: 0,
//!     chain_id: 1,
//! };
//! let output = SigningPipeline::new()
//!     .run(&request, &FilePolicySource::new("policy.json"))
//!     .unwrap();
//! println!("{}", output.raw_hex());
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod policy;
pub mod security;
pub mod signer;

pub use errors::{Aborted, Result, SignerError, Stage};
pub use policy::{evaluate, Decision, DenyReason, Policy, PolicySource};
pub use signer::{ChainCodec, Eip155Codec, SignedOutput, SigningPipeline, SigningRequest};
