//! Ethereum cryptographic utilities
//!
//! Provides:
//! - Key decoding from hex
//! - Prehash signing with recovery id
//! - Address derivation, parsing and EIP-55 checksums
//! - Signer recovery

use crate::errors::{Result, SignerError};
use crate::security::SecureBytes;
use k256::{
    ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey},
    SecretKey,
};
use secrecy::{ExposeSecret, SecretString};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// 20-byte Ethereum account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex, the form used for whitelist comparison
    pub fn to_normalized_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case form
    pub fn to_checksum(&self) -> String {
        checksum_address(&self.0)
    }

    fn from_public_key(verifying_key: &VerifyingKey) -> Self {
        let point = verifying_key.to_encoded_point(false);
        // Skip the 0x04 prefix and hash the remaining 64 bytes
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        Self(address)
    }
}

impl FromStr for Address {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self> {
        parse_address(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

/// Ethereum key pair
pub struct EthKeyPair {
    signing_key: SigningKey,
}

impl EthKeyPair {
    /// Create a new random key pair
    #[cfg(test)]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Decode hex key material (optional `0x` prefix)
    ///
    /// Error messages never echo the input.
    pub fn from_hex(key: &SecretString) -> Result<Self> {
        let trimmed = key.expose_secret().trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(SignerError::Key("no key material provided".to_string()));
        }

        let bytes = hex::decode(digits)
            .map(SecureBytes::new)
            .map_err(|_| SignerError::Key("key material is not valid hex".to_string()))?;

        Self::from_bytes(bytes.expose())
    }

    /// Create from raw private key bytes (32 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(SignerError::Key(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|_| SignerError::Key("not a valid secp256k1 scalar".to_string()))?;

        Ok(Self {
            signing_key: SigningKey::from(secret_key),
        })
    }

    /// Get the Ethereum address
    pub fn address(&self) -> Address {
        Address::from_public_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte prehash, returning a low-s signature with recovery id
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<EthSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash)
            .map_err(|e| SignerError::Signing(e.to_string()))?;

        let (r, s) = signature.split_bytes();
        let mut sig = EthSignature {
            r: [0u8; 32],
            s: [0u8; 32],
            recovery_id: recovery_id.to_byte(),
        };
        sig.r.copy_from_slice(&r);
        sig.s.copy_from_slice(&s);
        Ok(sig)
    }
}

/// Ethereum signature with recovery id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

impl EthSignature {
    /// Get v for EIP-155 transactions
    pub fn v_eip155(&self, chain_id: u64) -> Option<u64> {
        chain_id
            .checked_mul(2)?
            .checked_add(35)?
            .checked_add(u64::from(self.recovery_id))
    }
}

/// Recover the address that produced `signature` over `hash`
pub fn recover_address(hash: &[u8; 32], signature: &EthSignature) -> Result<Address> {
    let recovery_id = RecoveryId::from_byte(signature.recovery_id).ok_or_else(|| {
        SignerError::InvalidTransaction(format!(
            "invalid recovery id {}",
            signature.recovery_id
        ))
    })?;

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&rs)
        .map_err(|e| SignerError::InvalidTransaction(format!("invalid signature: {}", e)))?;

    let verifying_key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|e| SignerError::InvalidTransaction(format!("recovery failed: {}", e)))?;

    Ok(Address::from_public_key(&verifying_key))
}

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Convert an address to checksummed format (EIP-55)
pub fn checksum_address(address: &[u8; 20]) -> String {
    let addr_hex = hex::encode(address);
    let hash = hex::encode(keccak256(addr_hex.as_bytes()));

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (c, h) in addr_hex.chars().zip(hash.chars()) {
        if c.is_ascii_alphabetic() && h >= '8' {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Parse a hex address string to bytes
///
/// Accepts an optional `0x` prefix and any letter case; checksums are not
/// enforced.
pub fn parse_address(addr: &str) -> Result<[u8; 20]> {
    let digits = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);

    if digits.len() != 40 {
        return Err(SignerError::InvalidRecipient(format!(
            "address must be 40 hex chars, got {}",
            digits.len()
        )));
    }

    let bytes = hex::decode(digits)
        .map_err(|e| SignerError::InvalidRecipient(format!("hex decode error: {}", e)))?;
    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}
