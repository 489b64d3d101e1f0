//! Policy evaluation
//!
//! Decides whether a transfer may be signed. Evaluation is a pure function of
//! the policy and the request:
//!
//! 1. **Whitelist** - the recipient must match an entry, otherwise DENY.
//! 2. **Amount** - only checked for whitelisted recipients; an amount above
//!    the limit is DENIED, an amount equal to it is allowed.
//! 3. **Allow** - both checks passed.
//!
//! The whitelist runs first so an unauthorized recipient never learns
//! anything about the amount limit.

use crate::crypto::Address;
use crate::errors::{Result, SignerError};
use crate::policy::model::{parse_decimal, Policy};
use alloy_primitives::U256;
use std::fmt;

/// Why a transfer was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    RecipientNotWhitelisted,
    AmountExceedsLimit,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::RecipientNotWhitelisted => "recipient not in whitelist",
            DenyReason::AmountExceedsLimit => "amount exceeds max policy limit",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a transfer against a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Turn a denial into a `PolicyViolation` error
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(SignerError::PolicyViolation(reason)),
        }
    }
}

/// A validated transfer: 20-byte recipient and non-negative amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub recipient: Address,
    pub amount: U256,
}

impl TransferRequest {
    pub fn new(recipient: Address, amount: U256) -> Self {
        Self { recipient, amount }
    }

    /// Validate raw operator input
    ///
    /// The amount is a decimal string in wei; signs, fractions and hex are
    /// rejected.
    pub fn parse(recipient: &str, amount: &str) -> Result<Self> {
        let recipient: Address = recipient.parse()?;
        let amount = parse_amount(amount)?;
        Ok(Self { recipient, amount })
    }
}

/// Parse a transfer amount given as a decimal string in wei
pub fn parse_amount(amount: &str) -> Result<U256> {
    if amount.starts_with('-') {
        return Err(SignerError::InvalidAmount(
            "amount must not be negative".to_string(),
        ));
    }
    // One explicit plus sign is allowed, as in "+1000"
    let digits = amount.strip_prefix('+').unwrap_or(amount);
    parse_decimal(digits).map_err(SignerError::InvalidAmount)
}

/// Evaluate a transfer against the policy
pub fn evaluate(policy: &Policy, recipient: &Address, amount: U256) -> Decision {
    if !policy.permits(&recipient.to_normalized_hex()) {
        return Decision::Deny(DenyReason::RecipientNotWhitelisted);
    }

    if amount > policy.max_amount() {
        return Decision::Deny(DenyReason::AmountExceedsLimit);
    }

    Decision::Allow
}

impl Policy {
    /// Evaluate a validated request
    pub fn evaluate(&self, request: &TransferRequest) -> Decision {
        evaluate(self, &request.recipient, request.amount)
    }
}
