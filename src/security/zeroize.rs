//! Key byte buffer
//!
//! Decoded private key bytes live in [`SecureBytes`] only long enough to build
//! the signing key, and are overwritten when it drops.

use zeroize::ZeroizeOnDrop;

/// Byte buffer that is zeroed on drop
#[derive(ZeroizeOnDrop)]
pub struct SecureBytes {
    inner: Vec<u8>,
}

impl SecureBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self { inner: data }
    }

    pub fn expose(&self) -> &[u8] {
        &self.inner
    }
}
