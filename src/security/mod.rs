//! Security utilities for secret handling
//!
//! This module provides:
//! - Memory zeroization for decoded key bytes
//! - Process hardening (core dumps off)

pub mod hardening;
pub mod zeroize;

pub use hardening::setup_memory_protection;
pub use zeroize::SecureBytes;
