//! secp256k1 Curve Implementation
//!
//! Used by: Bitcoin family, Ethereum family, Tron, XRP, Cosmos family.
//!
//! Features:
//! - ECDSA signing of 32-byte digests (RFC 6979, low-S)
//! - Recoverable signatures
//! - DER encoding
//! - BIP-32 private and public child derivation

use super::traits::{digest32, to_array32, HARDENED_OFFSET};
use super::{CurveError, EllipticCurve, KeyDerivation, RecoverableSignature};
use crate::crypto::hash::hmac_sha512;
use bitcoin::secp256k1::ecdsa::{RecoverableSignature as RecovSig, RecoveryId, Signature};
use bitcoin::secp256k1::{Message, PublicKey, Scalar, Secp256k1, SecretKey};

/// secp256k1 curve implementation
pub struct Secp256k1Curve;

impl EllipticCurve for Secp256k1Curve {
    type PublicKey = [u8; 33];
    type Signature = [u8; 64];

    fn is_valid_private_key(private_key: &[u8]) -> bool {
        SecretKey::from_slice(private_key).is_ok()
    }

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        let sk = secret_key(private_key)?;
        let secp = Secp256k1::new();
        Ok(PublicKey::from_secret_key(&secp, &sk).serialize())
    }

    fn sign(private_key: &[u8], digest: &[u8]) -> Result<Self::Signature, CurveError> {
        let sk = secret_key(private_key)?;
        let msg = Message::from_digest(digest32(digest)?);
        let secp = Secp256k1::new();
        Ok(secp.sign_ecdsa(&msg, &sk).serialize_compact())
    }

    fn verify(public_key: &[u8], digest: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
        if signature.len() != 64 {
            return Err(CurveError::InvalidSignature(format!(
                "Signature must be 64 bytes, got {}",
                signature.len()
            )));
        }

        let pk = PublicKey::from_slice(public_key)
            .map_err(|e| CurveError::InvalidPublicKey(e.to_string()))?;
        let mut sig = Signature::from_compact(signature)
            .map_err(|e| CurveError::InvalidSignature(e.to_string()))?;
        sig.normalize_s();
        let msg = Message::from_digest(digest32(digest)?);

        let secp = Secp256k1::verification_only();
        Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
    }
}

impl RecoverableSignature for Secp256k1Curve {
    fn sign_recoverable(private_key: &[u8], digest: &[u8]) -> Result<([u8; 64], u8), CurveError> {
        let sk = secret_key(private_key)?;
        let msg = Message::from_digest(digest32(digest)?);
        let secp = Secp256k1::new();

        let (recovery_id, serialized) = secp.sign_ecdsa_recoverable(&msg, &sk).serialize_compact();
        Ok((serialized, recovery_id.to_i32() as u8))
    }

    fn recover_public_key(digest: &[u8], signature: &[u8], recovery_id: u8) -> Result<[u8; 65], CurveError> {
        if signature.len() != 64 {
            return Err(CurveError::InvalidSignature(format!(
                "Signature must be 64 bytes, got {}",
                signature.len()
            )));
        }

        let rec_id = RecoveryId::from_i32(recovery_id as i32)
            .map_err(|e| CurveError::InvalidSignature(format!("Invalid recovery ID: {}", e)))?;
        let sig = RecovSig::from_compact(signature, rec_id)
            .map_err(|e| CurveError::InvalidSignature(e.to_string()))?;
        let msg = Message::from_digest(digest32(digest)?);

        let secp = Secp256k1::verification_only();
        let pk = secp
            .recover_ecdsa(&msg, &sig)
            .map_err(|e| CurveError::VerificationFailed(format!("Recovery failed: {}", e)))?;
        Ok(pk.serialize_uncompressed())
    }
}

impl KeyDerivation for Secp256k1Curve {
    const SEED_KEY: &'static [u8] = b"Bitcoin seed";

    fn master_key(seed: &[u8]) -> Result<([u8; 32], [u8; 32]), CurveError> {
        let mut data = seed.to_vec();
        loop {
            let i = hmac_sha512(Self::SEED_KEY, &data);
            let (il, ir) = i.split_at(32);
            if Self::is_valid_private_key(il) {
                return Ok((to_array32(il, "Master key")?, to_array32(ir, "Chain code")?));
            }
            data = i.to_vec();
        }
    }

    fn derive_child(
        parent_private: &[u8; 32],
        parent_chain_code: &[u8; 32],
        index: u32,
    ) -> Result<([u8; 32], [u8; 32]), CurveError> {
        let secp = Secp256k1::new();
        let parent_sk = secret_key(parent_private)?;

        let mut data = Vec::with_capacity(37);
        if index >= HARDENED_OFFSET {
            data.push(0x00);
            data.extend_from_slice(parent_private);
        } else {
            data.extend_from_slice(&PublicKey::from_secret_key(&secp, &parent_sk).serialize());
        }
        data.extend_from_slice(&index.to_be_bytes());

        loop {
            let i = hmac_sha512(parent_chain_code, &data);
            let (il, ir) = i.split_at(32);

            let child = SecretKey::from_slice(il)
                .ok()
                .and_then(|tweak| parent_sk.add_tweak(&Scalar::from(tweak)).ok());
            if let Some(child) = child {
                return Ok((child.secret_bytes(), to_array32(ir, "Chain code")?));
            }

            // IL >= n or zero child: retry with 0x01 || IR || index
            data.clear();
            data.push(0x01);
            data.extend_from_slice(ir);
            data.extend_from_slice(&index.to_be_bytes());
        }
    }
}

fn secret_key(private_key: &[u8]) -> Result<SecretKey, CurveError> {
    if private_key.len() != 32 {
        return Err(CurveError::InvalidPrivateKey(format!(
            "Private key must be 32 bytes, got {}",
            private_key.len()
        )));
    }
    SecretKey::from_slice(private_key).map_err(|e| CurveError::InvalidPrivateKey(e.to_string()))
}

// MARK: - Helper Functions

impl Secp256k1Curve {
    pub fn public_key_uncompressed(private_key: &[u8]) -> Result<[u8; 65], CurveError> {
        let sk = secret_key(private_key)?;
        let secp = Secp256k1::new();
        Ok(PublicKey::from_secret_key(&secp, &sk).serialize_uncompressed())
    }

    pub fn is_valid_public_key(public_key: &[u8]) -> bool {
        PublicKey::from_slice(public_key).is_ok()
    }

    pub fn compress(public_key: &[u8]) -> Result<[u8; 33], CurveError> {
        PublicKey::from_slice(public_key)
            .map(|pk| pk.serialize())
            .map_err(|e| CurveError::InvalidPublicKey(e.to_string()))
    }

    pub fn decompress(public_key: &[u8]) -> Result<[u8; 65], CurveError> {
        PublicKey::from_slice(public_key)
            .map(|pk| pk.serialize_uncompressed())
            .map_err(|e| CurveError::InvalidPublicKey(e.to_string()))
    }

    /// Public child derivation for extended public keys
    pub fn derive_public_child(
        parent_public: &[u8],
        parent_chain_code: &[u8; 32],
        index: u32,
    ) -> Result<([u8; 33], [u8; 32]), CurveError> {
        if index >= HARDENED_OFFSET {
            return Err(CurveError::DerivationFailed(
                "Hardened child of a public key".into(),
            ));
        }

        let pk = PublicKey::from_slice(parent_public)
            .map_err(|e| CurveError::InvalidPublicKey(e.to_string()))?;

        let mut data = pk.serialize().to_vec();
        data.extend_from_slice(&index.to_be_bytes());
        let i = hmac_sha512(parent_chain_code, &data);
        let (il, ir) = i.split_at(32);

        let tweak = Scalar::from_be_bytes(to_array32(il, "Tweak")?)
            .map_err(|_| CurveError::DerivationFailed("Tweak out of range".into()))?;
        let secp = Secp256k1::verification_only();
        let child = pk
            .add_exp_tweak(&secp, &tweak)
            .map_err(|e| CurveError::DerivationFailed(format!("Tweak failed: {}", e)))?;

        Ok((child.serialize(), to_array32(ir, "Chain code")?))
    }

    pub fn sign_der(private_key: &[u8], digest: &[u8]) -> Result<Vec<u8>, CurveError> {
        let compact = Self::sign(private_key, digest)?;
        Self::signature_to_der(&compact)
    }

    pub fn verify_der(public_key: &[u8], digest: &[u8], der: &[u8]) -> Result<bool, CurveError> {
        let compact = Self::signature_from_der(der)?;
        Self::verify(public_key, digest, &compact)
    }

    pub fn signature_to_der(signature: &[u8; 64]) -> Result<Vec<u8>, CurveError> {
        let sig = Signature::from_compact(signature)
            .map_err(|e| CurveError::InvalidSignature(e.to_string()))?;
        Ok(sig.serialize_der().to_vec())
    }

    pub fn signature_from_der(der: &[u8]) -> Result<[u8; 64], CurveError> {
        let sig = Signature::from_der(der).map_err(|e| CurveError::InvalidSignature(e.to_string()))?;
        Ok(sig.serialize_compact())
    }
}

// MARK: - Tests
