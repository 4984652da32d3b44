//! NIST P-256 (nist256p1) Curve Implementation
//!
//! ECDSA over 32-byte digests and BIP-32 style derivation seeded with
//! `"Nist256p1 seed"`. Public keys are SEC1 compressed.

use super::traits::{to_array32, HARDENED_OFFSET};
use super::{CurveError, EllipticCurve, KeyDerivation};
use crate::crypto::hash::hmac_sha512;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::ff::{Field, PrimeField};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{EncodedPoint, FieldBytes, Scalar, SecretKey};

pub struct Secp256r1Curve;

impl EllipticCurve for Secp256r1Curve {
    type PublicKey = [u8; 33];
    type Signature = [u8; 64];

    fn is_valid_private_key(private_key: &[u8]) -> bool {
        private_key.len() == 32 && SecretKey::from_slice(private_key).is_ok()
    }

    fn public_key_from_private(private_key: &[u8]) -> Result<Self::PublicKey, CurveError> {
        let secret_key = secret_key(private_key)?;
        let point = secret_key.public_key().to_encoded_point(true);
        point
            .as_bytes()
            .try_into()
            .map_err(|_| CurveError::InvalidPublicKey("Unexpected point encoding".into()))
    }

    fn sign(private_key: &[u8], digest: &[u8]) -> Result<Self::Signature, CurveError> {
        if digest.len() != 32 {
            return Err(CurveError::SigningFailed(format!(
                "Digest must be 32 bytes, got {}",
                digest.len()
            )));
        }
        let signing_key = SigningKey::from(secret_key(private_key)?);
        let signature: Signature = signing_key
            .sign_prehash(digest)
            .map_err(|e| CurveError::SigningFailed(e.to_string()))?;
        Ok(signature.to_bytes().into())
    }

    fn verify(public_key: &[u8], digest: &[u8], signature: &[u8]) -> Result<bool, CurveError> {
        if signature.len() != 64 {
            return Err(CurveError::InvalidSignature(format!(
                "Signature must be 64 bytes, got {}",
                signature.len()
            )));
        }

        let verifying_key = Self::parse_public_key(public_key)?;
        let sig = Signature::from_slice(signature)
            .map_err(|e| CurveError::InvalidSignature(e.to_string()))?;

        Ok(verifying_key.verify_prehash(digest, &sig).is_ok())
    }
}

impl KeyDerivation for Secp256r1Curve {
    const SEED_KEY: &'static [u8] = b"Nist256p1 seed";

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
        let parent = to_scalar(parent_private)
            .ok_or_else(|| CurveError::InvalidPrivateKey("Parent key out of range".into()))?;

        let mut data = Vec::with_capacity(37);
        if index >= HARDENED_OFFSET {
            data.push(0x00);
            data.extend_from_slice(parent_private);
        } else {
            data.extend_from_slice(&Self::public_key_from_private(parent_private)?);
        }
        data.extend_from_slice(&index.to_be_bytes());

        loop {
            let i = hmac_sha512(parent_chain_code, &data);
            let (il, ir) = i.split_at(32);

            if let Some(tweak) = to_scalar(il) {
                let child = parent + tweak;
                if !bool::from(child.is_zero()) {
                    return Ok((child.to_bytes().into(), to_array32(ir, "Chain code")?));
                }
            }

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
    SecretKey::from_slice(private_key)
        .map_err(|e| CurveError::InvalidPrivateKey(format!("Invalid private key: {:?}", e)))
}

fn to_scalar(bytes: &[u8]) -> Option<Scalar> {
    Scalar::from_repr(*FieldBytes::from_slice(bytes)).into()
}

impl Secp256r1Curve {
    fn parse_public_key(public_key: &[u8]) -> Result<VerifyingKey, CurveError> {
        let point = EncodedPoint::from_bytes(public_key)
            .map_err(|e| CurveError::InvalidPublicKey(format!("Invalid point: {:?}", e)))?;
        VerifyingKey::from_encoded_point(&point)
            .map_err(|e| CurveError::InvalidPublicKey(format!("Invalid key: {:?}", e)))
    }

    pub fn is_valid_public_key(public_key: &[u8]) -> bool {
        matches!(public_key.len(), 33 | 65) && Self::parse_public_key(public_key).is_ok()
    }

    pub fn decompress(public_key: &[u8]) -> Result<[u8; 65], CurveError> {
        let key = Self::parse_public_key(public_key)?;
        key.to_encoded_point(false)
            .as_bytes()
            .try_into()
            .map_err(|_| CurveError::InvalidPublicKey("Unexpected point encoding".into()))
    }
}
