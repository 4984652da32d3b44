//! Multi-Curve Cryptography Support
//!
//! A unified abstraction over the curves used by supported chains:
//!
//! - `secp256k1`: Bitcoin family, Ethereum family, Tron, XRP, Cosmos family
//! - `ed25519`: Solana, Stellar, Algorand, Polkadot, Kusama, NEAR, Aptos, Sui
//! - `nist256p1` (P-256): derivation and signing only
//!
//! # Example
//!
//! ```rust,ignore
//! use multicoin_core::crypto::curves::{CurveType, sign, verify};
//!
//! let digest = [0u8; 32];
//! let sig = sign(CurveType::Secp256k1, &private_key, &digest)?;
//! let valid = verify(CurveType::Secp256k1, &public_key, &digest, &sig)?;
//! ```

pub mod ed25519;
pub mod secp256k1;
pub mod secp256r1;
pub mod traits;

pub use ed25519::Ed25519Curve;
pub use secp256k1::Secp256k1Curve;
pub use secp256r1::Secp256r1Curve;
pub use traits::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// MARK: - Curve Type Enum

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    Secp256k1,
    Ed25519,
    Nist256p1,
}

impl CurveType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Secp256k1 => "secp256k1",
            Self::Ed25519 => "ed25519",
            Self::Nist256p1 => "nist256p1",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "secp256k1" => Some(Self::Secp256k1),
            "ed25519" => Some(Self::Ed25519),
            "nist256p1" | "secp256r1" | "p256" => Some(Self::Nist256p1),
            _ => None,
        }
    }

    /// Whether signing takes a 32-byte digest rather than the message
    pub fn signs_digest(&self) -> bool {
        !matches!(self, Self::Ed25519)
    }
}

impl std::fmt::Display for CurveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// MARK: - Curve Errors

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}

// MARK: - Unified Interface

pub fn is_valid_private_key(curve: CurveType, private_key: &[u8]) -> bool {
    match curve {
        CurveType::Secp256k1 => Secp256k1Curve::is_valid_private_key(private_key),
        CurveType::Ed25519 => Ed25519Curve::is_valid_private_key(private_key),
        CurveType::Nist256p1 => Secp256r1Curve::is_valid_private_key(private_key),
    }
}

/// Compressed (or raw, for ed25519) public key
pub fn public_key_from_private(curve: CurveType, private_key: &[u8]) -> Result<Vec<u8>, CurveError> {
    match curve {
        CurveType::Secp256k1 => Ok(Secp256k1Curve::public_key_from_private(private_key)?.to_vec()),
        CurveType::Ed25519 => Ok(Ed25519Curve::public_key_from_private(private_key)?.to_vec()),
        CurveType::Nist256p1 => Ok(Secp256r1Curve::public_key_from_private(private_key)?.to_vec()),
    }
}

/// Sign a digest (ECDSA) or message (EdDSA)
///
/// ECDSA signatures are returned as 65-byte `r || s || recid` for secp256k1
/// and 64-byte `r || s` for nist256p1.
pub fn sign(curve: CurveType, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, CurveError> {
    match curve {
        CurveType::Secp256k1 => {
            let (sig, rec_id) = Secp256k1Curve::sign_recoverable(private_key, message)?;
            let mut out = sig.to_vec();
            out.push(rec_id);
            Ok(out)
        }
        CurveType::Ed25519 => Ok(Ed25519Curve::sign(private_key, message)?.to_vec()),
        CurveType::Nist256p1 => Ok(Secp256r1Curve::sign(private_key, message)?.to_vec()),
    }
}

/// Verify a signature; a trailing recovery byte on secp256k1 signatures is ignored
pub fn verify(curve: CurveType, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
    match curve {
        CurveType::Secp256k1 => {
            let compact = if signature.len() == 65 { &signature[..64] } else { signature };
            Secp256k1Curve::verify(public_key, message, compact)
        }
        CurveType::Ed25519 => Ed25519Curve::verify(public_key, message, signature),
        CurveType::Nist256p1 => Secp256r1Curve::verify(public_key, message, signature),
    }
}

pub fn master_key(curve: CurveType, seed: &[u8]) -> Result<([u8; 32], [u8; 32]), CurveError> {
    match curve {
        CurveType::Secp256k1 => Secp256k1Curve::master_key(seed),
        CurveType::Ed25519 => Ed25519Curve::master_key(seed),
        CurveType::Nist256p1 => Secp256r1Curve::master_key(seed),
    }
}

pub fn derive_child(
    curve: CurveType,
    parent_private: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: u32,
) -> Result<([u8; 32], [u8; 32]), CurveError> {
    match curve {
        CurveType::Secp256k1 => Secp256k1Curve::derive_child(parent_private, parent_chain_code, index),
        CurveType::Ed25519 => Ed25519Curve::derive_child(parent_private, parent_chain_code, index),
        CurveType::Nist256p1 => Secp256r1Curve::derive_child(parent_private, parent_chain_code, index),
    }
}

// MARK: - Tests
