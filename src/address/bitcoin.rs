//! Bitcoin family addresses
//!
//! Base58Check P2PKH/P2SH with per-coin version bytes, segwit bech32/bech32m
//! and CashAddr for Bitcoin Cash.

use super::{secp256k1_compressed, CoinAddress};
use crate::coin::{CoinType, Derivation};
use crate::crypto::hash::hash160;
use crate::crypto::PublicKey;
use crate::encoding::base58::{self, Base58Alphabet};
use crate::encoding::bech32;
use crate::encoding::cashaddr::{self, CashAddrType};
use crate::error::{CoreError, CoreResult};
use std::fmt;

const TESTNET_HRP: &str = "tb";

/// What an address pays to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitcoinPayload {
    PubkeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    Witness { version: u8, program: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcoinAddress {
    payload: BitcoinPayload,
    encoded: String,
}

impl BitcoinAddress {
    pub fn payload(&self) -> &BitcoinPayload {
        &self.payload
    }

    /// Base58Check pay-to-pubkey-hash with the coin's version byte
    pub fn p2pkh(public_key: &PublicKey, coin: CoinType) -> CoreResult<Self> {
        let hash = hash160(&secp256k1_compressed(public_key)?);
        if coin == CoinType::BitcoinCash {
            return Self::cashaddr(CashAddrType::P2PKH, &hash);
        }
        let (version, _) = coin
            .base58_prefixes()
            .ok_or_else(|| CoreError::unsupported_coin(format!("{} has no base58 addresses", coin.name())))?;
        Ok(Self::base58(version, hash))
    }

    /// Native segwit v0 pay-to-witness-pubkey-hash
    pub fn p2wpkh(public_key: &PublicKey, hrp: &str) -> CoreResult<Self> {
        let hash = hash160(&secp256k1_compressed(public_key)?);
        Self::segwit(hrp, 0, hash.to_vec())
    }

    pub fn from_public_key_derivation(
        public_key: &PublicKey,
        coin: CoinType,
        derivation: Derivation,
    ) -> CoreResult<Self> {
        match (coin, derivation) {
            (CoinType::Bitcoin, Derivation::Testnet) => Self::p2wpkh(public_key, TESTNET_HRP),
            (CoinType::Bitcoin | CoinType::Litecoin, Derivation::Legacy) => Self::p2pkh(public_key, coin),
            (CoinType::Bitcoin | CoinType::Litecoin, _) => {
                let hrp = coin
                    .hrp()
                    .ok_or_else(|| CoreError::internal("Segwit coin without an HRP"))?;
                Self::p2wpkh(public_key, hrp)
            }
            _ => Self::p2pkh(public_key, coin),
        }
    }

    fn base58(version: u8, hash: [u8; 20]) -> Self {
        let mut data = vec![version];
        data.extend_from_slice(&hash);
        Self {
            payload: BitcoinPayload::PubkeyHash(hash),
            encoded: base58::encode_check(&data, Base58Alphabet::Bitcoin),
        }
    }

    fn segwit(hrp: &str, version: u8, program: Vec<u8>) -> CoreResult<Self> {
        let encoded = bech32::encode_segwit(hrp, version, &program)
            .ok_or_else(|| CoreError::invalid_address(format!("Cannot encode witness program for {}", hrp)))?;
        Ok(Self {
            payload: BitcoinPayload::Witness { version, program },
            encoded,
        })
    }

    fn cashaddr(kind: CashAddrType, hash: &[u8; 20]) -> CoreResult<Self> {
        let prefix = CoinType::BitcoinCash.hrp().unwrap_or("bitcoincash");
        let encoded = cashaddr::encode(prefix, kind, hash)
            .ok_or_else(|| CoreError::invalid_address("Cannot encode CashAddr"))?;
        let payload = match kind {
            CashAddrType::P2PKH => BitcoinPayload::PubkeyHash(*hash),
            CashAddrType::P2SH => BitcoinPayload::ScriptHash(*hash),
        };
        Ok(Self { payload, encoded })
    }

    /// Parse a segwit address against an explicit HRP
    pub fn parse_segwit(address: &str, hrp: &str) -> CoreResult<Self> {
        let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
        let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
        if has_upper && has_lower {
            return Err(CoreError::invalid_address("Mixed-case bech32 address"));
        }
        let (version, program) = bech32::decode_segwit(hrp, &address.to_ascii_lowercase())
            .ok_or_else(|| CoreError::invalid_address(format!("Not a valid {} segwit address", hrp)))?;
        Self::segwit(hrp, version, program)
    }

    /// Parse in the address format `derivation` produces
    pub fn parse_derivation(address: &str, coin: CoinType, derivation: Derivation) -> CoreResult<Self> {
        match (coin, derivation) {
            (CoinType::Bitcoin, Derivation::Testnet) => Self::parse_segwit(address, TESTNET_HRP),
            _ => Self::parse(address, coin),
        }
    }

    /// Mainnet forms, then testnet segwit for Bitcoin
    pub fn parse_any_network(address: &str, coin: CoinType) -> CoreResult<Self> {
        Self::parse(address, coin).or_else(|e| match coin {
            CoinType::Bitcoin => Self::parse_segwit(address, TESTNET_HRP).map_err(|_| e),
            _ => Err(e),
        })
    }

    fn parse_base58(address: &str, coin: CoinType) -> CoreResult<Self> {
        let (p2pkh, p2sh) = coin
            .base58_prefixes()
            .ok_or_else(|| CoreError::invalid_address(format!("{} has no base58 addresses", coin.name())))?;
        let data = base58::decode_check(address, Base58Alphabet::Bitcoin)
            .ok_or_else(|| CoreError::invalid_address("Invalid base58check encoding"))?;
        if data.len() != 21 {
            return Err(CoreError::invalid_address(format!(
                "Expected 21 bytes, got {}",
                data.len()
            )));
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&data[1..]);
        let payload = match data[0] {
            v if v == p2pkh => BitcoinPayload::PubkeyHash(hash),
            v if v == p2sh => BitcoinPayload::ScriptHash(hash),
            v => {
                return Err(CoreError::invalid_address(format!(
                    "Version byte {:#04x} is not valid for {}",
                    v,
                    coin.name()
                )))
            }
        };
        Ok(Self {
            payload,
            encoded: address.to_string(),
        })
    }

    fn parse_cashaddr(address: &str) -> CoreResult<Self> {
        let prefix = CoinType::BitcoinCash.hrp().unwrap_or("bitcoincash");
        let (kind, hash) = cashaddr::decode(address, prefix)
            .ok_or_else(|| CoreError::invalid_address("Invalid CashAddr"))?;
        let hash: [u8; 20] = hash
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::invalid_address("CashAddr hash must be 20 bytes"))?;
        Self::cashaddr(kind, &hash)
    }
}

impl CoinAddress for BitcoinAddress {
    fn from_public_key(public_key: &PublicKey, coin: CoinType) -> CoreResult<Self> {
        Self::from_public_key_derivation(public_key, coin, Derivation::Default)
    }

    fn parse(address: &str, coin: CoinType) -> CoreResult<Self> {
        match coin {
            CoinType::BitcoinCash => {
                Self::parse_cashaddr(address).or_else(|_| Self::parse_base58(address, coin))
            }
            CoinType::Bitcoin | CoinType::Litecoin => {
                let hrp = coin.hrp().unwrap_or_default();
                Self::parse_segwit(address, hrp).or_else(|_| Self::parse_base58(address, coin))
            }
            _ => Self::parse_base58(address, coin),
        }
    }

    fn data(&self) -> Vec<u8> {
        match &self.payload {
            BitcoinPayload::PubkeyHash(h) | BitcoinPayload::ScriptHash(h) => h.to_vec(),
            BitcoinPayload::Witness { program, .. } => program.clone(),
        }
    }
}

impl fmt::Display for BitcoinAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        let legacy = BitcoinAddress::parse("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", CoinType::Bitcoin).unwrap();
        assert!(matches!(legacy.payload(), BitcoinPayload::PubkeyHash(_)));

        let p2sh = BitcoinAddress::parse("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", CoinType::Bitcoin).unwrap();
        assert!(matches!(p2sh.payload(), BitcoinPayload::ScriptHash(_)));

        let taproot = BitcoinAddress::parse(
            "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr",
            CoinType::Bitcoin,
        )
        .unwrap();
        assert!(matches!(taproot.payload(), BitcoinPayload::Witness { version: 1, .. }));
        assert_eq!(taproot.data().len(), 32);

        let p2wpkh = BitcoinAddress::parse("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4", CoinType::Bitcoin).unwrap();
        assert_eq!(p2wpkh.to_string(), "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
        assert_eq!(hex::encode(p2wpkh.data()), "751e76e8199196d454941c45d1b3a323f1433bd6");
    }

    #[test]
    fn test_mixed_case_segwit_rejected() {
        assert!(BitcoinAddress::parse("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", CoinType::Bitcoin).is_ok());
        assert!(BitcoinAddress::parse("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4", CoinType::Bitcoin).is_ok());
        assert!(BitcoinAddress::parse("bc1qW508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", CoinType::Bitcoin).is_err());
        assert!(BitcoinAddress::parse_segwit("Bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", "bc").is_err());
    }

    #[test]
    fn test_testnet_derivation_round_trip() {
        let key = crate::crypto::PrivateKey::new(&[0x46u8; 32]).unwrap();
        let public = key.public_key(crate::crypto::PublicKeyType::Secp256k1).unwrap();
        let testnet =
            BitcoinAddress::from_public_key_derivation(&public, CoinType::Bitcoin, Derivation::Testnet).unwrap();
        let encoded = testnet.to_string();
        assert!(encoded.starts_with("tb1q"));

        assert!(BitcoinAddress::parse(&encoded, CoinType::Bitcoin).is_err());
        let parsed = BitcoinAddress::parse_derivation(&encoded, CoinType::Bitcoin, Derivation::Testnet).unwrap();
        assert_eq!(parsed, testnet);
        assert_eq!(BitcoinAddress::parse_any_network(&encoded, CoinType::Bitcoin).unwrap(), testnet);
        assert!(BitcoinAddress::parse_any_network(&encoded, CoinType::Litecoin).is_err());
        assert!(BitcoinAddress::parse_derivation(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            CoinType::Bitcoin,
            Derivation::Testnet
        )
        .is_err());
    }

    #[test]
    fn test_wrong_network_rejected() {
        assert!(BitcoinAddress::parse("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", CoinType::Dogecoin).is_err());
        assert!(BitcoinAddress::parse("DDkFr311AYe6ABMsdSnjv8yoSr1Tppokp8", CoinType::Bitcoin).is_err());
        assert!(BitcoinAddress::parse("DDkFr311AYe6ABMsdSnjv8yoSr1Tppokp8", CoinType::Dogecoin).is_ok());
    }

    #[test]
    fn test_bitcoin_cash_forms() {
        let cash = BitcoinAddress::parse("qp0xw4t8xrxae7ed4hq9a96rekynzqry2ydzeh0jgs", CoinType::BitcoinCash).unwrap();
        assert_eq!(cash.to_string(), "bitcoincash:qp0xw4t8xrxae7ed4hq9a96rekynzqry2ydzeh0jgs");
        let legacy = BitcoinAddress::parse("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", CoinType::BitcoinCash).unwrap();
        assert_eq!(legacy.to_string(), "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2");
        assert!(BitcoinAddress::parse("bitcoincash:qp0xw4t8xrxae7ed4hq9a96rekynzqry2ydzeh0jgt", CoinType::BitcoinCash).is_err());
    }
}
