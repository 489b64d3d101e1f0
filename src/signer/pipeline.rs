//! Signing pipeline
//!
//! Drives one transfer through
//!
//! ```text
//! Start -> KeyLoaded -> PolicyLoaded -> PolicyApproved -> TxBuilt -> TxSigned -> Serialized -> Done
//! ```
//!
//! and stops at the first failure with an [`Aborted`] naming the state that
//! could not be reached. The key is decoded at `KeyLoaded` but only handed to
//! the codec after `PolicyApproved`; a denied transfer never reaches the
//! signature primitive. Either a complete signed transaction comes back or
//! nothing does.

use crate::crypto::{Address, EthKeyPair};
use crate::errors::{Aborted, Result, SignerError, Stage};
use crate::policy::{Decision, PolicySource, TransferRequest};
use crate::signer::codec::{ChainCodec, Eip155Codec};
use crate::signer::serialize::{serialize, to_display_hex};
use crate::signer::transaction::{build_unsigned, SignedTransaction};
use secrecy::SecretString;
use tracing::{debug, error, info, warn};

/// Everything the operator supplies for one transfer
#[derive(Debug)]
pub struct SigningRequest {
    /// Hex private key; redacted in `Debug`
    pub key: SecretString,
    /// Recipient address as typed by the operator
    pub recipient: String,
    /// Amount in wei as a decimal string
    pub amount: String,
    pub nonce: u64,
    pub chain_id: u64,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct SignedOutput {
    pub raw_transaction: Vec<u8>,
    pub transaction_hash: [u8; 32],
    pub from: Address,
    pub transaction: SignedTransaction,
    /// States visited, `Start` through `Done`
    pub stages: Vec<Stage>,
}

impl SignedOutput {
    pub fn raw_hex(&self) -> String {
        to_display_hex(&self.raw_transaction)
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", to_display_hex(&self.transaction_hash))
    }
}

/// Tracks the current state and enforces forward-only transitions
struct Progress {
    current: Stage,
    trail: Vec<Stage>,
}

impl Progress {
    fn new() -> Self {
        Self {
            current: Stage::Start,
            trail: vec![Stage::Start],
        }
    }

    /// Attempt the transition into `target`
    fn step<T>(
        &mut self,
        target: Stage,
        f: impl FnOnce() -> Result<T>,
    ) -> std::result::Result<T, Aborted> {
        if self.current.next() != Some(target) {
            return Err(Aborted::new(
                target,
                SignerError::Internal(format!(
                    "illegal pipeline transition {} -> {}",
                    self.current, target
                )),
            ));
        }

        match f() {
            Ok(value) => {
                debug!("Pipeline {} -> {}", self.current, target);
                self.current = target;
                self.trail.push(target);
                Ok(value)
            }
            Err(e) => {
                error!("Pipeline aborted at {}: {}", target, e);
                Err(Aborted::new(target, e))
            }
        }
    }
}

/// Policy-gated signer over a chain codec
pub struct SigningPipeline<C = Eip155Codec> {
    codec: C,
}

impl SigningPipeline<Eip155Codec> {
    pub fn new() -> Self {
        Self {
            codec: Eip155Codec::new(),
        }
    }
}

impl Default for SigningPipeline<Eip155Codec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ChainCodec> SigningPipeline<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Run one request to completion or to its first failure
    pub fn run(
        &self,
        request: &SigningRequest,
        policy_source: &dyn PolicySource,
    ) -> std::result::Result<SignedOutput, Aborted> {
        info!(
            "Signing request: to={}, amount={}, nonce={}, chain_id={}",
            request.recipient, request.amount, request.nonce, request.chain_id
        );

        let mut progress = Progress::new();

        let key = progress.step(Stage::KeyLoaded, || EthKeyPair::from_hex(&request.key))?;

        let policy = progress.step(Stage::PolicyLoaded, || {
            debug!("Loading policy from {}", policy_source.describe());
            policy_source.load()
        })?;

        let transfer = progress.step(Stage::PolicyApproved, || {
            let transfer = TransferRequest::parse(&request.recipient, &request.amount)?;
            match policy.evaluate(&transfer) {
                Decision::Allow => Ok(transfer),
                Decision::Deny(reason) => {
                    warn!(
                        "Policy denied transfer to {}: {}",
                        transfer.recipient.to_normalized_hex(),
                        reason
                    );
                    Err(SignerError::PolicyViolation(reason))
                }
            }
        })?;

        let unsigned = progress.step(Stage::TxBuilt, || {
            Ok(build_unsigned(
                request.nonce,
                transfer.recipient,
                transfer.amount,
                request.chain_id,
            ))
        })?;

        let signature = progress.step(Stage::TxSigned, || {
            self.codec.sign(&unsigned, &key).map_err(|e| match e {
                SignerError::Signing(_) => e,
                other => SignerError::Signing(other.to_string()),
            })
        })?;

        let transaction = SignedTransaction {
            tx: unsigned,
            signature,
        };

        let raw_transaction =
            progress.step(Stage::Serialized, || serialize(&self.codec, &transaction))?;

        progress.step(Stage::Done, || Ok(()))?;

        let output = SignedOutput {
            transaction_hash: Eip155Codec::tx_hash(&raw_transaction),
            raw_transaction,
            from: key.address(),
            transaction,
            stages: progress.trail,
        };

        info!(
            "Signed transfer: hash={}, from={}, to={}, value={}",
            output.hash_hex(),
            output.from,
            output.transaction.tx.to,
            output.transaction.tx.value
        );

        Ok(output)
    }
}
