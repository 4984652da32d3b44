//! Elliptic Curve Traits
//!
//! Common interface for the curves keys can live on. Signing operates on
//! message bytes for EdDSA and on 32-byte digests for ECDSA curves.

use super::CurveError;

/// Child indices at or above this value are hardened
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Core trait for elliptic curve operations
pub trait EllipticCurve {
    type PublicKey: AsRef<[u8]>;
    type Signature: AsRef<[u8]>;

    /// Whether the 32 bytes form a usable private key on this curve
    fn is_valid_private_key(private_key: &[u8]) -> bool;

    /// Derive the public key (compressed where the curve allows it)
    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError>;

    fn sign(private_key: &[u8], message: &[u8]) -> Result<Self::Signature, CurveError>;

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError>;
}

/// Curves producing ECDSA signatures with a recovery id
pub trait RecoverableSignature: EllipticCurve {
    /// Returns `r || s` and the recovery id
    fn sign_recoverable(private_key: &[u8], digest: &[u8]) -> Result<([u8; 64], u8), CurveError>;

    /// Recover the uncompressed public key
    fn recover_public_key(digest: &[u8], signature: &[u8], recovery_id: u8) -> Result<[u8; 65], CurveError>;
}

/// Hierarchical derivation (BIP-32 / SLIP-10)
pub trait KeyDerivation: EllipticCurve {
    /// HMAC-SHA512 key used to derive the master node from a seed
    const SEED_KEY: &'static [u8];

    /// Master private key and chain code
    fn master_key(seed: &[u8]) -> Result<([u8; 32], [u8; 32]), CurveError>;

    /// Private child derivation; `index` carries the hardened bit
    fn derive_child(
        parent_private: &[u8; 32],
        parent_chain_code: &[u8; 32],
        index: u32,
    ) -> Result<([u8; 32], [u8; 32]), CurveError>;
}

pub(crate) fn to_array32(bytes: &[u8], what: &str) -> Result<[u8; 32], CurveError> {
    bytes.try_into().map_err(|_| {
        CurveError::InvalidPrivateKey(format!("{} must be 32 bytes, got {}", what, bytes.len()))
    })
}

pub(crate) fn digest32(digest: &[u8]) -> Result<[u8; 32], CurveError> {
    digest.try_into().map_err(|_| {
        CurveError::SigningFailed(format!("Digest must be 32 bytes, got {}", digest.len()))
    })
}
