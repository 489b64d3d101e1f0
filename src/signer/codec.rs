//! Chain transaction codec
//!
//! The pipeline only needs two capabilities from the chain: sign an unsigned
//! transaction for its chain id, and encode the signed result. They sit behind
//! [`ChainCodec`]; [`Eip155Codec`] implements them for legacy Ethereum
//! transactions with secp256k1 and RLP.
//!
//! Wire format (all integers minimal big-endian, zero is the empty string):
//!
//! ```text
//! signing payload: rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0])
//! signed:          rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])
//! v = recovery_id + 35 + 2 * chainId
//! ```

use crate::crypto::{keccak256, recover_address, Address, EthKeyPair, EthSignature};
use crate::errors::{Result, SignerError};
use crate::signer::transaction::{SignedTransaction, TxSignature, UnsignedTransaction};
use alloy_primitives::U256;
use rlp::{Rlp, RlpStream};

/// Half the secp256k1 group order; larger `s` values are malleable (EIP-2)
const SECP256K1_HALF_ORDER: U256 = U256::from_limbs([
    0xdfe9_2f46_681b_20a0,
    0x5d57_6e73_57a4_501d,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
]);

/// Signing and wire encoding for one chain family
pub trait ChainCodec {
    /// Sign `tx` for `tx.chain_id`
    fn sign(&self, tx: &UnsignedTransaction, key: &EthKeyPair) -> Result<TxSignature>;

    /// Canonical encoding of a signed transaction
    fn encode(&self, tx: &SignedTransaction) -> Result<Vec<u8>>;
}

/// Legacy Ethereum transactions with EIP-155 replay protection
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip155Codec;

/// A signed transaction read back from its wire form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub transaction: SignedTransaction,
    pub sender: Address,
    pub hash: [u8; 32],
}

impl Eip155Codec {
    pub fn new() -> Self {
        Self
    }

    /// RLP payload that is hashed for signing
    pub fn signing_payload(tx: &UnsignedTransaction) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        append_fields(&mut stream, tx);
        stream.append(&tx.chain_id);
        stream.append_empty_data();
        stream.append_empty_data();
        stream.out().to_vec()
    }

    pub fn signing_hash(tx: &UnsignedTransaction) -> [u8; 32] {
        keccak256(&Self::signing_payload(tx))
    }

    /// Transaction hash of an encoded signed transaction
    pub fn tx_hash(raw: &[u8]) -> [u8; 32] {
        keccak256(raw)
    }

    /// Recover the account that signed `tx`
    pub fn recover_sender(tx: &SignedTransaction) -> Result<Address> {
        let recovery_id = tx
            .signature
            .recovery_id(tx.tx.chain_id)
            .ok_or_else(|| {
                SignerError::InvalidTransaction(format!(
                    "v = {} does not match chain id {}",
                    tx.signature.v, tx.tx.chain_id
                ))
            })?;

        let signature = EthSignature {
            r: tx.signature.r.to_be_bytes(),
            s: tx.signature.s.to_be_bytes(),
            recovery_id,
        };
        recover_address(&Self::signing_hash(&tx.tx), &signature)
    }

    /// Strictly decode a signed EIP-155 legacy transaction
    pub fn decode(raw: &[u8]) -> Result<DecodedTransaction> {
        let rlp = Rlp::new(raw);
        let total = rlp.payload_info()?.total();
        if total > raw.len() {
            return Err(SignerError::InvalidTransaction(
                "transaction is truncated".to_string(),
            ));
        }
        if total < raw.len() {
            return Err(SignerError::InvalidTransaction(format!(
                "{} trailing bytes after transaction",
                raw.len() - total
            )));
        }
        if !rlp.is_list() {
            return Err(SignerError::InvalidTransaction(
                "not an RLP list (typed transactions are not supported)".to_string(),
            ));
        }
        let count = rlp.item_count()?;
        if count != 9 {
            return Err(SignerError::InvalidTransaction(format!(
                "expected 9 fields, got {}",
                count
            )));
        }

        let to_bytes: Vec<u8> = rlp.val_at(3)?;
        if to_bytes.len() != 20 {
            return Err(SignerError::InvalidTransaction(
                "recipient must be a 20-byte address (contract creation is not supported)"
                    .to_string(),
            ));
        }
        let mut to = [0u8; 20];
        to.copy_from_slice(&to_bytes);

        let v: u64 = rlp.val_at(6)?;
        if v < 35 {
            return Err(SignerError::InvalidTransaction(format!(
                "v = {} is not EIP-155 replay protected",
                v
            )));
        }
        let chain_id = (v - 35) / 2;

        let s = u256_at(&rlp, 8, "s")?;
        if s > SECP256K1_HALF_ORDER {
            return Err(SignerError::InvalidTransaction(
                "signature s value is not in the lower half of the curve order".to_string(),
            ));
        }

        let transaction = SignedTransaction {
            tx: UnsignedTransaction {
                nonce: rlp.val_at(0)?,
                gas_price: u256_at(&rlp, 1, "gasPrice")?,
                gas_limit: rlp.val_at(2)?,
                to: Address::new(to),
                value: u256_at(&rlp, 4, "value")?,
                data: rlp.val_at(5)?,
                chain_id,
            },
            signature: TxSignature {
                v,
                r: u256_at(&rlp, 7, "r")?,
                s,
            },
        };

        let sender = Self::recover_sender(&transaction)?;
        Ok(DecodedTransaction {
            transaction,
            sender,
            hash: Self::tx_hash(raw),
        })
    }
}

impl ChainCodec for Eip155Codec {
    fn sign(&self, tx: &UnsignedTransaction, key: &EthKeyPair) -> Result<TxSignature> {
        let hash = Self::signing_hash(tx);
        let signature = key.sign_hash(&hash)?;

        let v = signature.v_eip155(tx.chain_id).ok_or_else(|| {
            SignerError::Signing(format!("chain id {} does not fit in v", tx.chain_id))
        })?;

        Ok(TxSignature {
            v,
            r: U256::from_be_bytes(signature.r),
            s: U256::from_be_bytes(signature.s),
        })
    }

    fn encode(&self, tx: &SignedTransaction) -> Result<Vec<u8>> {
        if tx.signature.recovery_id(tx.tx.chain_id).is_none() {
            return Err(SignerError::Serialization(format!(
                "v = {} does not match chain id {}",
                tx.signature.v, tx.tx.chain_id
            )));
        }
        if tx.signature.r.is_zero() || tx.signature.s.is_zero() {
            return Err(SignerError::Serialization(
                "signature has a zero component".to_string(),
            ));
        }

        let mut stream = RlpStream::new_list(9);
        append_fields(&mut stream, &tx.tx);
        stream.append(&tx.signature.v);
        append_u256(&mut stream, &tx.signature.r);
        append_u256(&mut stream, &tx.signature.s);
        Ok(stream.out().to_vec())
    }
}

/// The six fields shared by the signing payload and the signed form
fn append_fields(stream: &mut RlpStream, tx: &UnsignedTransaction) {
    stream.append(&tx.nonce);
    append_u256(stream, &tx.gas_price);
    stream.append(&tx.gas_limit);
    stream.append(&tx.to.as_bytes().to_vec());
    append_u256(stream, &tx.value);
    stream.append(&tx.data);
}

fn append_u256(stream: &mut RlpStream, value: &U256) {
    stream.append(&value.to_be_bytes_trimmed_vec());
}

fn u256_at(rlp: &Rlp<'_>, index: usize, field: &str) -> Result<U256> {
    let bytes: Vec<u8> = rlp.val_at(index)?;
    if bytes.first() == Some(&0) {
        return Err(SignerError::InvalidTransaction(format!(
            "{} has leading zero bytes",
            field
        )));
    }
    U256::try_from_be_slice(&bytes).ok_or_else(|| {
        SignerError::InvalidTransaction(format!("{} exceeds 256 bits", field))
    })
}
