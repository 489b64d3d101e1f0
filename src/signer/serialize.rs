//! Serialization boundary
//!
//! Turns a signed transaction into its transportable bytes and the hex form
//! shown to operators.

use crate::errors::{Result, SignerError};
use crate::signer::codec::ChainCodec;
use crate::signer::transaction::SignedTransaction;

/// Canonical wire bytes of a signed transaction
pub fn serialize<C: ChainCodec + ?Sized>(codec: &C, tx: &SignedTransaction) -> Result<Vec<u8>> {
    let raw = codec.encode(tx).map_err(|e| match e {
        SignerError::Serialization(_) => e,
        other => SignerError::Serialization(other.to_string()),
    })?;

    if raw.is_empty() {
        return Err(SignerError::Serialization(
            "codec produced an empty encoding".to_string(),
        ));
    }
    Ok(raw)
}

/// Lowercase hex, no prefix, no separators
pub fn to_display_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
