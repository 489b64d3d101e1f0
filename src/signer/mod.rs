//! Transaction construction, signing and serialization
//!
//! This module provides the transaction builder, the chain codec seam with
//! its EIP-155 implementation, the serialization boundary and the signing
//! pipeline that ties them to the policy check.

pub mod codec;
pub mod pipeline;
pub mod serialize;
pub mod transaction;

pub use codec::{ChainCodec, DecodedTransaction, Eip155Codec};
pub use pipeline::{SignedOutput, SigningPipeline, SigningRequest};
pub use serialize::{serialize, to_display_hex};
pub use transaction::{
    build_unsigned, SignedTransaction, TxSignature, UnsignedTransaction, TRANSFER_GAS_LIMIT,
    TRANSFER_GAS_PRICE,
};
