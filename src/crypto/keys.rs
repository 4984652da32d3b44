//! Private and public key wrappers
//!
//! `PrivateKey` holds 32 raw bytes and is wiped on drop. `PublicKey` carries
//! its encoding so address encoders can ask for the form they need.

use super::curves::{self, CurveType, Ed25519Curve, RecoverableSignature, Secp256k1Curve, Secp256r1Curve};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Public key encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicKeyType {
    /// 33-byte SEC1 compressed
    Secp256k1,
    /// 65-byte SEC1 uncompressed
    Secp256k1Extended,
    Ed25519,
    Nist256p1,
}

impl PublicKeyType {
    pub fn curve(&self) -> CurveType {
        match self {
            PublicKeyType::Secp256k1 | PublicKeyType::Secp256k1Extended => CurveType::Secp256k1,
            PublicKeyType::Ed25519 => CurveType::Ed25519,
            PublicKeyType::Nist256p1 => CurveType::Nist256p1,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            PublicKeyType::Secp256k1 | PublicKeyType::Nist256p1 => 33,
            PublicKeyType::Secp256k1Extended => 65,
            PublicKeyType::Ed25519 => 32,
        }
    }
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    bytes: [u8; 32],
}

impl PrivateKey {
    pub const SIZE: usize = 32;

    pub fn new(bytes: &[u8]) -> CoreResult<Self> {
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::invalid_private_key(format!(
                "Private key must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        if bytes.iter().all(|b| *b == 0) {
            return Err(CoreError::invalid_private_key("Private key is zero"));
        }
        Ok(Self { bytes })
    }

    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let mut raw = crate::encoding::decode_hex(s)
            .map_err(|_| CoreError::invalid_private_key("Private key is not valid hex"))?;
        let key = Self::new(&raw);
        raw.zeroize();
        key
    }

    pub fn is_valid(bytes: &[u8], curve: CurveType) -> bool {
        bytes.len() == Self::SIZE && curves::is_valid_private_key(curve, bytes)
    }

    pub fn bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn public_key(&self, key_type: PublicKeyType) -> CoreResult<PublicKey> {
        let bytes = match key_type {
            PublicKeyType::Secp256k1Extended => {
                Secp256k1Curve::public_key_uncompressed(&self.bytes)?.to_vec()
            }
            other => curves::public_key_from_private(other.curve(), &self.bytes)?,
        };
        Ok(PublicKey { bytes, key_type })
    }

    /// Sign a digest (or message, for ed25519)
    ///
    /// secp256k1 yields `r || s || recid` (65 bytes); ed25519 and nist256p1
    /// yield 64 bytes.
    pub fn sign(&self, message: &[u8], curve: CurveType) -> CoreResult<Vec<u8>> {
        if !curves::is_valid_private_key(curve, &self.bytes) {
            return Err(CoreError::invalid_private_key(format!(
                "Key is not valid on {}",
                curve
            )));
        }
        Ok(curves::sign(curve, &self.bytes, message)?)
    }

    /// secp256k1 DER signature
    pub fn sign_as_der(&self, digest: &[u8]) -> CoreResult<Vec<u8>> {
        Ok(Secp256k1Curve::sign_der(&self.bytes, digest)?)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    bytes: Vec<u8>,
    key_type: PublicKeyType,
}

impl PublicKey {
    pub fn new(bytes: &[u8], key_type: PublicKeyType) -> CoreResult<Self> {
        if !Self::is_valid(bytes, key_type) {
            return Err(CoreError::invalid_public_key(format!(
                "Not a valid {:?} public key ({} bytes)",
                key_type,
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
            key_type,
        })
    }

    pub fn is_valid(bytes: &[u8], key_type: PublicKeyType) -> bool {
        if bytes.len() != key_type.size() {
            return false;
        }
        match key_type {
            PublicKeyType::Secp256k1 => {
                matches!(bytes[0], 0x02 | 0x03) && Secp256k1Curve::is_valid_public_key(bytes)
            }
            PublicKeyType::Secp256k1Extended => {
                bytes[0] == 0x04 && Secp256k1Curve::is_valid_public_key(bytes)
            }
            PublicKeyType::Ed25519 => Ed25519Curve::is_valid_public_key(bytes),
            PublicKeyType::Nist256p1 => Secp256r1Curve::is_valid_public_key(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn key_type(&self) -> PublicKeyType {
        self.key_type
    }

    pub fn hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn is_compressed(&self) -> bool {
        self.key_type != PublicKeyType::Secp256k1Extended
    }

    pub fn compressed(&self) -> CoreResult<PublicKey> {
        match self.key_type {
            PublicKeyType::Secp256k1Extended => Ok(PublicKey {
                bytes: Secp256k1Curve::compress(&self.bytes)?.to_vec(),
                key_type: PublicKeyType::Secp256k1,
            }),
            _ => Ok(self.clone()),
        }
    }

    pub fn uncompressed(&self) -> CoreResult<PublicKey> {
        match self.key_type {
            PublicKeyType::Secp256k1 => Ok(PublicKey {
                bytes: Secp256k1Curve::decompress(&self.bytes)?.to_vec(),
                key_type: PublicKeyType::Secp256k1Extended,
            }),
            _ => Ok(self.clone()),
        }
    }

    /// Verify a signature over a digest (or message, for ed25519)
    pub fn verify(&self, signature: &[u8], message: &[u8]) -> bool {
        curves::verify(self.key_type.curve(), &self.bytes, message, signature).unwrap_or(false)
    }

    pub fn verify_as_der(&self, der: &[u8], digest: &[u8]) -> bool {
        self.key_type.curve() == CurveType::Secp256k1
            && Secp256k1Curve::verify_der(&self.bytes, digest, der).unwrap_or(false)
    }

    /// Recover the signer from a 65-byte `r || s || v` signature
    ///
    /// `v` may be the raw recovery id or offset by 27.
    pub fn recover(signature: &[u8], digest: &[u8]) -> CoreResult<PublicKey> {
        if signature.len() != 65 {
            return Err(CoreError::invalid_input(format!(
                "Recoverable signature must be 65 bytes, got {}",
                signature.len()
            )));
        }
        let v = signature[64];
        let recovery_id = if v >= 27 { v - 27 } else { v };
        let bytes = Secp256k1Curve::recover_public_key(digest, &signature[..64], recovery_id)?;
        Ok(PublicKey {
            bytes: bytes.to_vec(),
            key_type: PublicKeyType::Secp256k1Extended,
        })
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({:?}, {})", self.key_type, self.hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::keccak256;

    #[test]
    fn test_private_key_validation() {
        assert!(PrivateKey::new(&[0u8; 32]).is_err());
        assert!(PrivateKey::new(&[1u8; 31]).is_err());
        assert!(PrivateKey::from_hex("0x4646464646464646464646464646464646464646464646464646464646464646").is_ok());
        assert!(!PrivateKey::is_valid(&[0xffu8; 32], CurveType::Secp256k1));
        assert!(PrivateKey::is_valid(&[0xffu8; 32], CurveType::Ed25519));
    }

    #[test]
    fn test_public_key_forms() {
        let key = PrivateKey::new(&[0x46u8; 32]).unwrap();
        let extended = key.public_key(PublicKeyType::Secp256k1Extended).unwrap();
        assert_eq!(
            extended.hex(),
            "044bc2a31265153f07e70e0bab08724e6b85e217f8cd628ceb62974247bb493382ce28cab79ad7119ee1ad3ebcdb98a16805211530ecc6cfefa1b88e6dff99232a"
        );

        let compressed = extended.compressed().unwrap();
        assert_eq!(compressed.key_type(), PublicKeyType::Secp256k1);
        assert_eq!(compressed.uncompressed().unwrap(), extended);
        assert!(PublicKey::new(&extended.bytes()[..33], PublicKeyType::Secp256k1).is_err());
    }

    #[test]
    fn test_sign_and_recover() {
        let key = PrivateKey::new(&[0x46u8; 32]).unwrap();
        let digest = keccak256(b"multicoin");
        let sig = key.sign(&digest, CurveType::Secp256k1).unwrap();
        assert_eq!(sig.len(), 65);

        let recovered = PublicKey::recover(&sig, &digest).unwrap();
        assert_eq!(recovered, key.public_key(PublicKeyType::Secp256k1Extended).unwrap());
        assert!(recovered.verify(&sig[..64], &digest));

        let der = key.sign_as_der(&digest).unwrap();
        assert!(recovered.compressed().unwrap().verify_as_der(&der, &digest));
    }

    #[test]
    fn test_ed25519_key() {
        let key = PrivateKey::new(&[0x07u8; 32]).unwrap();
        let public = key.public_key(PublicKeyType::Ed25519).unwrap();
        let sig = key.sign(b"hello", CurveType::Ed25519).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(public.verify(&sig, b"hello"));
        assert!(!public.verify(&sig, b"world"));
    }
}
