//! Keccak-derived addresses: EIP-55 Ethereum and Tron base58check

use super::CoinAddress;
use crate::coin::CoinType;
use crate::crypto::hash::keccak256;
use crate::crypto::{PublicKey, PublicKeyType};
use crate::encoding::base58::{self, Base58Alphabet};
use crate::error::{CoreError, CoreResult};
use std::fmt;

const TRON_PREFIX: u8 = 0x41;

/// Last 20 bytes of keccak256 over the uncompressed point without its 0x04 tag
fn keccak_account(public_key: &PublicKey) -> CoreResult<[u8; 20]> {
    let extended = match public_key.key_type() {
        PublicKeyType::Secp256k1 | PublicKeyType::Secp256k1Extended => public_key.uncompressed()?,
        other => {
            return Err(CoreError::invalid_public_key(format!(
                "Expected a secp256k1 public key, got {:?}",
                other
            )))
        }
    };
    let hash = keccak256(&extended.bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthereumAddress([u8; 20]);

impl EthereumAddress {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding
    pub fn checksummed(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Parse `0x` + 40 hex digits; mixed case must carry a valid checksum
    pub fn from_hex(address: &str) -> CoreResult<Self> {
        let body = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .ok_or_else(|| CoreError::invalid_address("Ethereum address must start with 0x"))?;
        if body.len() != 40 {
            return Err(CoreError::invalid_address(format!(
                "Ethereum address must have 40 hex digits, got {}",
                body.len()
            )));
        }
        let decoded = hex::decode(body).map_err(|e| CoreError::invalid_address(format!("Invalid hex: {}", e)))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        let parsed = Self(bytes);

        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && parsed.checksummed()[2..] != *body {
            return Err(CoreError::invalid_address("EIP-55 checksum mismatch"));
        }
        Ok(parsed)
    }
}

impl CoinAddress for EthereumAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(keccak_account(public_key)?))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        Self::from_hex(address)
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.checksummed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; 20]);

impl TronAddress {
    pub fn bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl CoinAddress for TronAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(keccak_account(public_key)?))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        let data = base58::decode_check(address, Base58Alphabet::Bitcoin)
            .ok_or_else(|| CoreError::invalid_address("Invalid base58check encoding"))?;
        if data.len() != 21 || data[0] != TRON_PREFIX {
            return Err(CoreError::invalid_address("Tron address must be 0x41 followed by 20 bytes"));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&data[1..]);
        Ok(Self(bytes))
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = Vec::with_capacity(21);
        data.push(TRON_PREFIX);
        data.extend_from_slice(&self.0);
        f.write_str(&base58::encode_check(&data, Base58Alphabet::Bitcoin))
    }
}
