//! Transaction construction
//!
//! Only plain value transfers are built, so gas parameters are fixed and the
//! payload is always empty.

use crate::crypto::Address;
use alloy_primitives::U256;

/// Gas cost of a plain value transfer
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Gas price in wei (1 gwei)
pub const TRANSFER_GAS_PRICE: u64 = 1_000_000_000;

/// Legacy Ethereum transaction with its EIP-155 chain id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

/// Build the unsigned transfer for an approved request
pub fn build_unsigned(nonce: u64, to: Address, value: U256, chain_id: u64) -> UnsignedTransaction {
    UnsignedTransaction {
        nonce,
        gas_price: U256::from(TRANSFER_GAS_PRICE),
        gas_limit: TRANSFER_GAS_LIMIT,
        to,
        value,
        data: Vec::new(),
        chain_id,
    }
}

/// ECDSA signature as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSignature {
    /// `recovery_id + 35 + 2 * chain_id`
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl TxSignature {
    /// Recovery id (0 or 1) for an EIP-155 `v`
    pub fn recovery_id(&self, chain_id: u64) -> Option<u8> {
        let base = chain_id.checked_mul(2)?.checked_add(35)?;
        match self.v.checked_sub(base)? {
            0 => Some(0),
            1 => Some(1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx: UnsignedTransaction,
    pub signature: TxSignature,
}
