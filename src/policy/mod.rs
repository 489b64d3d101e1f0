//! Policy enforcement for signing operations
//!
//! This module provides:
//! - The policy model (whitelist, inclusive amount limit) and its JSON parser
//! - Policy sources (file, in-memory)
//! - The pure evaluation function

pub mod engine;
pub mod model;

pub use engine::{evaluate, parse_amount, Decision, DenyReason, TransferRequest};
pub use model::{parse_policy, FilePolicySource, InlinePolicy, Policy, PolicySource};
