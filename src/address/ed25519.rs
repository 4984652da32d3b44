//! Addresses of ed25519 chains that encode the key (or a hash of it) directly

use super::{ed25519_bytes, CoinAddress};
use crate::coin::CoinType;
use crate::crypto::hash::{blake2b_256, sha3_256, sha512_256};
use crate::crypto::PublicKey;
use crate::encoding::base58::{self, Base58Alphabet};
use crate::encoding::{base32, crc16};
use crate::error::{CoreError, CoreResult};
use std::fmt;

fn to_array(bytes: &[u8], what: &str) -> CoreResult<[u8; 32]> {
    bytes
        .try_into()
        .map_err(|_| CoreError::invalid_address(format!("{} must be 32 bytes, got {}", what, bytes.len())))
}

/// `0x`-prefixed hex of up to 64 digits, left padded
fn parse_padded_hex(address: &str) -> CoreResult<[u8; 32]> {
    let body = address
        .strip_prefix("0x")
        .ok_or_else(|| CoreError::invalid_address("Address must start with 0x"))?;
    if body.is_empty() || body.len() > 64 {
        return Err(CoreError::invalid_address(format!(
            "Expected 1 to 64 hex digits, got {}",
            body.len()
        )));
    }
    let padded = format!("{:0>64}", body);
    let bytes = hex::decode(padded).map_err(|e| CoreError::invalid_address(format!("Invalid hex: {}", e)))?;
    to_array(&bytes, "Address")
}

// MARK: - Stellar

const STELLAR_ACCOUNT_VERSION: u8 = 6 << 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StellarAddress([u8; 32]);

impl CoinAddress for StellarAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(ed25519_bytes(public_key)?))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        let data = base32::decode(address).ok_or_else(|| CoreError::invalid_address("Invalid base32 encoding"))?;
        if data.len() != 35 || data[0] != STELLAR_ACCOUNT_VERSION {
            return Err(CoreError::invalid_address("Not a Stellar account address"));
        }
        let expected = crc16::crc16_xmodem(&data[..33]).to_le_bytes();
        if data[33..] != expected {
            return Err(CoreError::invalid_address("Stellar checksum mismatch"));
        }
        Ok(Self(to_array(&data[1..33], "Stellar key")?))
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for StellarAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = Vec::with_capacity(35);
        data.push(STELLAR_ACCOUNT_VERSION);
        data.extend_from_slice(&self.0);
        let checksum = crc16::crc16_xmodem(&data).to_le_bytes();
        data.extend_from_slice(&checksum);
        f.write_str(&base32::encode(&data))
    }
}

// MARK: - Algorand

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlgorandAddress([u8; 32]);

impl AlgorandAddress {
    fn checksum(key: &[u8; 32]) -> [u8; 4] {
        let hash = sha512_256(key);
        [hash[28], hash[29], hash[30], hash[31]]
    }
}

impl CoinAddress for AlgorandAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(ed25519_bytes(public_key)?))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        let data = base32::decode(address).ok_or_else(|| CoreError::invalid_address("Invalid base32 encoding"))?;
        if data.len() != 36 {
            return Err(CoreError::invalid_address("Algorand address must decode to 36 bytes"));
        }
        let key = to_array(&data[..32], "Algorand key")?;
        if data[32..] != Self::checksum(&key) {
            return Err(CoreError::invalid_address("Algorand checksum mismatch"));
        }
        Ok(Self(key))
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for AlgorandAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = self.0.to_vec();
        data.extend_from_slice(&Self::checksum(&self.0));
        f.write_str(&base32::encode(&data))
    }
}

// MARK: - Solana

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolanaAddress([u8; 32]);

impl SolanaAddress {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_base58(address: &str) -> CoreResult<Self> {
        let data = base58::decode(address, Base58Alphabet::Bitcoin)
            .ok_or_else(|| CoreError::invalid_address("Invalid base58 encoding"))?;
        Ok(Self(to_array(&data, "Solana address")?))
    }
}

impl CoinAddress for SolanaAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(ed25519_bytes(public_key)?))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        Self::from_base58(address)
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for SolanaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(&self.0, Base58Alphabet::Bitcoin))
    }
}

// MARK: - NEAR

/// Implicit account: lowercase hex of the public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NearAddress([u8; 32]);

impl CoinAddress for NearAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(ed25519_bytes(public_key)?))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        if address.len() != 64 || address.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(CoreError::invalid_address("NEAR implicit account must be 64 lowercase hex digits"));
        }
        let bytes = hex::decode(address).map_err(|e| CoreError::invalid_address(format!("Invalid hex: {}", e)))?;
        Ok(Self(to_array(&bytes, "NEAR account")?))
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for NearAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// MARK: - Aptos

/// `sha3_256(public key || 0x00)`, the single-key authentication scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AptosAddress([u8; 32]);

impl CoinAddress for AptosAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        let mut input = ed25519_bytes(public_key)?.to_vec();
        input.push(0x00);
        Ok(Self(sha3_256(&input)))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(parse_padded_hex(address)?))
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for AptosAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// MARK: - Sui

/// `blake2b_256(0x00 || public key)`, flag 0x00 marking ed25519
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuiAddress([u8; 32]);

impl CoinAddress for SuiAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        let mut input = vec![0x00];
        input.extend_from_slice(&ed25519_bytes(public_key)?);
        Ok(Self(blake2b_256(&input)))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(parse_padded_hex(address)?))
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stellar() {
        let address = "GCRWFRVQP5XS7I4SFCL374VKV6OHJ3L3H3SDVGH7FW73N7LSNYJXOLDK";
        let parsed = StellarAddress::parse(address, CoinType::Stellar).unwrap();
        assert_eq!(parsed.to_string(), address);
        assert!(StellarAddress::parse("GCRWFRVQP5XS7I4SFCL374VKV6OHJ3L3H3SDVGH7FW73N7LSNYJXOLDL", CoinType::Stellar).is_err());
    }

    #[test]
    fn test_algorand() {
        let address = "VEFQ2IIW7CVKDLFEY53BMVJYKURC7KJTCW6U6R2CMQLQXZI52SCFSYASEY";
        let parsed = AlgorandAddress::parse(address, CoinType::Algorand).unwrap();
        assert_eq!(parsed.to_string(), address);
        assert!(AlgorandAddress::parse("VEFQ2IIW7CVKDLFEY53BMVJYKURC7KJTCW6U6R2CMQLQXZI52SCFSYASEA", CoinType::Algorand).is_err());
    }

    #[test]
    fn test_solana() {
        let parsed = SolanaAddress::parse("2bUBiBNZyD29gP1oV6de7nxowMLoDBtopMMTGgMvjG5m", CoinType::Solana).unwrap();
        assert_eq!(parsed.to_string(), "2bUBiBNZyD29gP1oV6de7nxowMLoDBtopMMTGgMvjG5m");
        assert!(SolanaAddress::parse("2bUBiBNZyD29gP1oV6de7nxowMLoDBtopMMTGgMvjG5", CoinType::Solana).is_err());
    }

    #[test]
    fn test_near() {
        let address = "0c91f6106ff835c0195d5388565a2d69e25038a7e23d26198f85caf6594117ec";
        assert_eq!(NearAddress::parse(address, CoinType::Near).unwrap().to_string(), address);
        assert!(NearAddress::parse(&address.to_uppercase(), CoinType::Near).is_err());
        assert!(NearAddress::parse("alice.near", CoinType::Near).is_err());
    }

    #[test]
    fn test_short_hex_is_padded() {
        let parsed = AptosAddress::parse("0x1", CoinType::Aptos).unwrap();
        assert_eq!(
            parsed.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
        assert!(SuiAddress::parse("0x", CoinType::Sui).is_err());
        assert!(SuiAddress::parse("1234", CoinType::Sui).is_err());
    }
}
