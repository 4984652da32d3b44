//! Ed25519 Curve Implementation
//!
//! Used by: Solana, Stellar, Algorand, Polkadot, Kusama, NEAR, Aptos, Sui.
//!
//! Signing follows RFC 8032 over the raw message. Derivation is SLIP-10,
//! which only defines hardened children for this curve.

use super::traits::{to_array32, HARDENED_OFFSET};
use super::{CurveError, EllipticCurve, KeyDerivation};
use crate::crypto::hash::hmac_sha512;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

pub struct Ed25519Curve;

impl EllipticCurve for Ed25519Curve {
    type PublicKey = [u8; 32];
    type Signature = [u8; 64];

    fn is_valid_private_key(private_key: &[u8]) -> bool {
        private_key.len() == 32
    }

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        let signing_key = SigningKey::from_bytes(&to_array32(private_key, "Private key")?);
        Ok(signing_key.verifying_key().to_bytes())
    }

    fn sign(private_key: &[u8], message: &[u8]) -> Result<Self::Signature, CurveError> {
        let signing_key = SigningKey::from_bytes(&to_array32(private_key, "Private key")?);
        Ok(signing_key.sign(message).to_bytes())
    }

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
        let pk_bytes: [u8; 32] = public_key.try_into().map_err(|_| {
            CurveError::InvalidPublicKey(format!(
                "Public key must be 32 bytes, got {}",
                public_key.len()
            ))
        })?;
        let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| {
            CurveError::InvalidSignature(format!(
                "Signature must be 64 bytes, got {}",
                signature.len()
            ))
        })?;

        let verifying_key = VerifyingKey::from_bytes(&pk_bytes)
            .map_err(|e| CurveError::InvalidPublicKey(e.to_string()))?;
        let sig = Signature::from_bytes(&sig_bytes);

        Ok(verifying_key.verify(message, &sig).is_ok())
    }
}

impl KeyDerivation for Ed25519Curve {
    const SEED_KEY: &'static [u8] = b"ed25519 seed";

    fn master_key(seed: &[u8]) -> Result<([u8; 32], [u8; 32]), CurveError> {
        let i = hmac_sha512(Self::SEED_KEY, seed);
        let (il, ir) = i.split_at(32);
        Ok((to_array32(il, "Master key")?, to_array32(ir, "Chain code")?))
    }

    fn derive_child(
        parent_private: &[u8; 32],
        parent_chain_code: &[u8; 32],
        index: u32,
    ) -> Result<([u8; 32], [u8; 32]), CurveError> {
        if index < HARDENED_OFFSET {
            return Err(CurveError::DerivationFailed(format!(
                "Ed25519 only supports hardened derivation, got index {}",
                index
            )));
        }

        let mut data = Vec::with_capacity(37);
        data.push(0x00);
        data.extend_from_slice(parent_private);
        data.extend_from_slice(&index.to_be_bytes());

        let i = hmac_sha512(parent_chain_code, &data);
        let (il, ir) = i.split_at(32);
        Ok((to_array32(il, "Child key")?, to_array32(ir, "Chain code")?))
    }
}

impl Ed25519Curve {
    pub fn is_valid_public_key(public_key: &[u8]) -> bool {
        <[u8; 32]>::try_from(public_key)
            .ok()
            .and_then(|pk| VerifyingKey::from_bytes(&pk).ok())
            .is_some()
    }
}

// MARK: - Tests
