//! Pre-image types for the external signing flow
//!
//! A signer computes the digests that must be signed, hands them out through
//! [`PreSigningOutput`], then later accepts signatures produced elsewhere
//! (hardware wallet, air-gapped device) and checks them before compiling.

use crate::coin::CoinType;
use crate::crypto::{PublicKey, PublicKeyType};
use crate::error::{CoreError, ErrorCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreImageError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Expected {expected} signatures, got {got}")]
    SignatureCount { expected: usize, got: usize },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Public key does not match signature")]
    PublicKeyMismatch,
}

pub type PreImageResult<T> = Result<T, PreImageError>;

/// Digest to sign paired with the hash160 of the key expected to sign it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashPublicKey {
    #[serde(with = "crate::serde_bytes::hex_bytes")]
    pub data_hash: Vec<u8>,
    #[serde(with = "crate::serde_bytes::hex_bytes")]
    pub public_key_hash: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreSigningOutput {
    /// Digest to sign (the first one, for multi-input transactions)
    #[serde(with = "crate::serde_bytes::hex_bytes")]
    pub data_hash: Vec<u8>,
    /// Bytes the digest was computed from
    #[serde(with = "crate::serde_bytes::hex_bytes")]
    pub data: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hash_public_keys: Vec<HashPublicKey>,
    pub error: ErrorCode,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl From<CoreError> for PreSigningOutput {
    fn from(e: CoreError) -> Self {
        Self {
            error: e.code,
            error_message: e.message,
            ..Default::default()
        }
    }
}

/// Interpret raw public key bytes for `coin`, inferring compression from length
pub fn public_key_for_coin(bytes: &[u8], coin: CoinType) -> PreImageResult<PublicKey> {
    let key_type = match coin.public_key_type() {
        PublicKeyType::Secp256k1 | PublicKeyType::Secp256k1Extended if bytes.len() == 65 => {
            PublicKeyType::Secp256k1Extended
        }
        PublicKeyType::Secp256k1 | PublicKeyType::Secp256k1Extended => PublicKeyType::Secp256k1,
        other => other,
    };
    PublicKey::new(bytes, key_type).map_err(|e| PreImageError::InvalidPublicKey(e.message))
}

/// Check every `(digest, signature, key)` triple, in order
pub fn verify_signatures(
    digests: &[Vec<u8>],
    signatures: &[Vec<u8>],
    public_keys: &[PublicKey],
) -> PreImageResult<()> {
    if signatures.len() != digests.len() {
        return Err(PreImageError::SignatureCount {
            expected: digests.len(),
            got: signatures.len(),
        });
    }
    if public_keys.len() != digests.len() {
        return Err(PreImageError::MissingField(format!(
            "{} public keys for {} signatures",
            public_keys.len(),
            signatures.len()
        )));
    }
    for (index, ((digest, signature), key)) in digests.iter().zip(signatures).zip(public_keys).enumerate() {
        if !key.verify(signature, digest) {
            return Err(PreImageError::InvalidSignature(format!(
                "signature {} does not verify against its public key",
                index
            )));
        }
    }
    Ok(())
}
