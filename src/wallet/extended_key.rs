//! BIP-32 extended keys (xpub/xprv and the ypub, zpub, Ltub, Mtub, dgub families)
//!
//! Layout: version(4) depth(1) parent fingerprint(4) child(4) chain code(32)
//! key(33), Base58Check encoded. Private keys are stored as `0x00 || key`.

use crate::coin::HdVersion;
use crate::crypto::curves::{self, CurveType, EllipticCurve, Secp256k1Curve};
use crate::crypto::hash::hash160;
use crate::encoding::base58::{self, Base58Alphabet};
use crate::error::{CoreError, CoreResult};
use crate::wallet::derivation_path::DerivationComponent;
use zeroize::{Zeroize, ZeroizeOnDrop};

const SERIALIZED_LEN: usize = 78;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ExtendedKey {
    pub version: u32,
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub chain_code: [u8; 32],
    /// Compressed public key, or `0x00 || private key`
    pub key: [u8; 33],
}

impl ExtendedKey {
    pub fn is_private(&self) -> bool {
        self.key[0] == 0x00
    }

    pub fn private_key(&self) -> Option<[u8; 32]> {
        if !self.is_private() {
            return None;
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.key[1..]);
        Some(out)
    }

    /// Compressed secp256k1 public key
    pub fn public_key(&self) -> CoreResult<[u8; 33]> {
        match self.private_key() {
            Some(mut private) => {
                let public = Secp256k1Curve::public_key_from_private(&private);
                private.zeroize();
                let bytes = public?;
                Ok(bytes)
            }
            None => Ok(self.key),
        }
    }

    pub fn fingerprint(&self) -> CoreResult<[u8; 4]> {
        let hash = hash160(&self.public_key()?);
        Ok([hash[0], hash[1], hash[2], hash[3]])
    }

    /// Same node as a public extended key with the given version
    pub fn neuter(&self, version: u32) -> CoreResult<ExtendedKey> {
        Ok(ExtendedKey {
            version,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
            chain_code: self.chain_code,
            key: self.public_key()?,
        })
    }

    pub fn serialize(&self) -> String {
        let mut data = Vec::with_capacity(SERIALIZED_LEN);
        data.extend_from_slice(&self.version.to_be_bytes());
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        data.extend_from_slice(&self.key);
        let encoded = base58::encode_check(&data, Base58Alphabet::Bitcoin);
        data.zeroize();
        encoded
    }

    pub fn deserialize(s: &str) -> CoreResult<Self> {
        let mut data = base58::decode_check(s.trim(), Base58Alphabet::Bitcoin)
            .ok_or_else(|| CoreError::invalid_input("Extended key is not valid base58check"))?;
        if data.len() != SERIALIZED_LEN {
            data.zeroize();
            return Err(CoreError::invalid_input(format!(
                "Extended key must be {} bytes, got {}",
                SERIALIZED_LEN,
                data.len()
            )));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&data[0..4]);
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let mut child = [0u8; 4];
        child.copy_from_slice(&data[9..13]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);
        let mut key = [0u8; 33];
        key.copy_from_slice(&data[45..78]);
        let depth = data[4];
        data.zeroize();

        let extended = ExtendedKey {
            version: u32::from_be_bytes(version),
            depth,
            parent_fingerprint,
            child_number: u32::from_be_bytes(child),
            chain_code,
            key,
        };

        let valid_key = match extended.private_key() {
            Some(mut private) => {
                let ok = curves::is_valid_private_key(CurveType::Secp256k1, &private);
                private.zeroize();
                ok
            }
            None => Secp256k1Curve::is_valid_public_key(&extended.key),
        };
        if !valid_key {
            return Err(CoreError::invalid_input("Extended key holds an invalid key"));
        }
        if let Some(known) = HdVersion::from_bytes(extended.version) {
            if known.is_public() == extended.is_private() {
                return Err(CoreError::invalid_input(
                    "Extended key version does not match its key type",
                ));
            }
        }
        Ok(extended)
    }

    pub fn derive_child(&self, component: DerivationComponent) -> CoreResult<ExtendedKey> {
        let index = component.full_index();
        let parent_fingerprint = self.fingerprint()?;
        let (key, chain_code) = match self.private_key() {
            Some(mut private) => {
                let derived = curves::derive_child(CurveType::Secp256k1, &private, &self.chain_code, index);
                private.zeroize();
                let (mut child, chain_code) = derived?;
                let mut key = [0u8; 33];
                key[1..].copy_from_slice(&child);
                child.zeroize();
                (key, chain_code)
            }
            None => Secp256k1Curve::derive_public_child(&self.key, &self.chain_code, index)?,
        };
        Ok(ExtendedKey {
            version: self.version,
            depth: self.depth.saturating_add(1),
            parent_fingerprint,
            child_number: index,
            chain_code,
            key,
        })
    }

    pub fn derive_path(&self, components: &[DerivationComponent]) -> CoreResult<ExtendedKey> {
        let mut node = self.clone();
        for component in components {
            node = node.derive_child(*component)?;
        }
        Ok(node)
    }
}

impl std::fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("version", &format_args!("{:#010x}", self.version))
            .field("depth", &self.depth)
            .field("private", &self.is_private())
            .finish()
    }
}
