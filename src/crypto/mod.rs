//! Cryptographic utilities for Ethereum

pub mod eth;

pub use eth::{
    checksum_address, keccak256, parse_address, recover_address, Address, EthKeyPair,
    EthSignature,
};
