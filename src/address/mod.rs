//! Address Module
//!
//! One address type per chain family, all implementing [`CoinAddress`], and
//! [`AnyAddress`] which dispatches on [`CoinType`].
//!
//! # Example
//!
//! ```rust,ignore
//! use multicoin_core::address::AnyAddress;
//! use multicoin_core::coin::CoinType;
//!
//! assert!(AnyAddress::is_valid("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", CoinType::Bitcoin));
//! let address = AnyAddress::with_string("0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309", CoinType::Ethereum)?;
//! assert_eq!(address.data().len(), 20);
//! ```

pub mod bitcoin;
pub mod cosmos;
pub mod ed25519;
pub mod evm;
pub mod ripple;
pub mod ss58;

pub use self::bitcoin::{BitcoinAddress, BitcoinPayload};
pub use self::cosmos::CosmosAddress;
pub use self::ed25519::{AlgorandAddress, AptosAddress, NearAddress, SolanaAddress, StellarAddress, SuiAddress};
pub use self::evm::{EthereumAddress, TronAddress};
pub use self::ripple::XrpAddress;
pub use self::ss58::Ss58Address;

use crate::coin::{Blockchain, CoinType, Derivation};
use crate::crypto::{PublicKey, PublicKeyType};
use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Common surface of every chain address type
pub trait CoinAddress: fmt::Display + Sized {
    /// Address for `public_key` with the coin's default format
    fn from_public_key(public_key: &PublicKey, coin: CoinType) -> CoreResult<Self>;

    /// Parse and validate an address string for `coin`
    fn parse(address: &str, coin: CoinType) -> CoreResult<Self>;

    /// Payload bytes without prefix, version or checksum
    fn data(&self) -> Vec<u8>;
}

/// Raw ed25519 key bytes, rejecting other key types
pub(crate) fn ed25519_bytes(public_key: &PublicKey) -> CoreResult<[u8; 32]> {
    if public_key.key_type() != PublicKeyType::Ed25519 {
        return Err(CoreError::invalid_public_key(format!(
            "Expected an ed25519 public key, got {:?}",
            public_key.key_type()
        )));
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(public_key.bytes());
    Ok(key)
}

/// Compressed secp256k1 key bytes, compressing extended keys
pub(crate) fn secp256k1_compressed(public_key: &PublicKey) -> CoreResult<Vec<u8>> {
    match public_key.key_type() {
        PublicKeyType::Secp256k1 | PublicKeyType::Secp256k1Extended => {
            Ok(public_key.compressed()?.bytes().to_vec())
        }
        other => Err(CoreError::invalid_public_key(format!(
            "Expected a secp256k1 public key, got {:?}",
            other
        ))),
    }
}

#[derive(Debug, Clone)]
enum Inner {
    Bitcoin(BitcoinAddress),
    Ethereum(EthereumAddress),
    Tron(TronAddress),
    Xrp(XrpAddress),
    Cosmos(CosmosAddress),
    Stellar(StellarAddress),
    Algorand(AlgorandAddress),
    Solana(SolanaAddress),
    Ss58(Ss58Address),
    Near(NearAddress),
    Aptos(AptosAddress),
    Sui(SuiAddress),
}

impl Inner {
    fn parse(address: &str, coin: CoinType) -> CoreResult<Self> {
        Ok(match coin.blockchain() {
            Blockchain::Bitcoin => Inner::Bitcoin(BitcoinAddress::parse(address, coin)?),
            Blockchain::Ethereum => Inner::Ethereum(EthereumAddress::parse(address, coin)?),
            Blockchain::Tron => Inner::Tron(TronAddress::parse(address, coin)?),
            Blockchain::Ripple => Inner::Xrp(XrpAddress::parse(address, coin)?),
            Blockchain::Cosmos => Inner::Cosmos(CosmosAddress::parse(address, coin)?),
            Blockchain::Stellar => Inner::Stellar(StellarAddress::parse(address, coin)?),
            Blockchain::Algorand => Inner::Algorand(AlgorandAddress::parse(address, coin)?),
            Blockchain::Solana => Inner::Solana(SolanaAddress::parse(address, coin)?),
            Blockchain::Polkadot => Inner::Ss58(Ss58Address::parse(address, coin)?),
            Blockchain::Near => Inner::Near(NearAddress::parse(address, coin)?),
            Blockchain::Aptos => Inner::Aptos(AptosAddress::parse(address, coin)?),
            Blockchain::Sui => Inner::Sui(SuiAddress::parse(address, coin)?),
        })
    }

    fn from_public_key(public_key: &PublicKey, coin: CoinType, derivation: Derivation) -> CoreResult<Self> {
        Ok(match coin.blockchain() {
            Blockchain::Bitcoin => {
                Inner::Bitcoin(BitcoinAddress::from_public_key_derivation(public_key, coin, derivation)?)
            }
            Blockchain::Ethereum => Inner::Ethereum(EthereumAddress::from_public_key(public_key, coin)?),
            Blockchain::Tron => Inner::Tron(TronAddress::from_public_key(public_key, coin)?),
            Blockchain::Ripple => Inner::Xrp(XrpAddress::from_public_key(public_key, coin)?),
            Blockchain::Cosmos => Inner::Cosmos(CosmosAddress::from_public_key(public_key, coin)?),
            Blockchain::Stellar => Inner::Stellar(StellarAddress::from_public_key(public_key, coin)?),
            Blockchain::Algorand => Inner::Algorand(AlgorandAddress::from_public_key(public_key, coin)?),
            Blockchain::Solana => Inner::Solana(SolanaAddress::from_public_key(public_key, coin)?),
            Blockchain::Polkadot => Inner::Ss58(Ss58Address::from_public_key(public_key, coin)?),
            Blockchain::Near => Inner::Near(NearAddress::from_public_key(public_key, coin)?),
            Blockchain::Aptos => Inner::Aptos(AptosAddress::from_public_key(public_key, coin)?),
            Blockchain::Sui => Inner::Sui(SuiAddress::from_public_key(public_key, coin)?),
        })
    }

    fn data(&self) -> Vec<u8> {
        match self {
            Inner::Bitcoin(a) => a.data(),
            Inner::Ethereum(a) => a.data(),
            Inner::Tron(a) => a.data(),
            Inner::Xrp(a) => a.data(),
            Inner::Cosmos(a) => a.data(),
            Inner::Stellar(a) => a.data(),
            Inner::Algorand(a) => a.data(),
            Inner::Solana(a) => a.data(),
            Inner::Ss58(a) => a.data(),
            Inner::Near(a) => a.data(),
            Inner::Aptos(a) => a.data(),
            Inner::Sui(a) => a.data(),
        }
    }

    fn description(&self) -> String {
        match self {
            Inner::Bitcoin(a) => a.to_string(),
            Inner::Ethereum(a) => a.to_string(),
            Inner::Tron(a) => a.to_string(),
            Inner::Xrp(a) => a.to_string(),
            Inner::Cosmos(a) => a.to_string(),
            Inner::Stellar(a) => a.to_string(),
            Inner::Algorand(a) => a.to_string(),
            Inner::Solana(a) => a.to_string(),
            Inner::Ss58(a) => a.to_string(),
            Inner::Near(a) => a.to_string(),
            Inner::Aptos(a) => a.to_string(),
            Inner::Sui(a) => a.to_string(),
        }
    }
}

/// An address of any supported coin
#[derive(Debug, Clone)]
pub struct AnyAddress {
    coin: CoinType,
    inner: Inner,
}

impl AnyAddress {
    pub fn is_valid(address: &str, coin: CoinType) -> bool {
        Self::with_string(address, coin).is_ok()
    }

    /// Validate in the format `derivation` produces (`tb1` for Bitcoin testnet)
    pub fn is_valid_derivation(address: &str, coin: CoinType, derivation: Derivation) -> bool {
        Self::with_string_derivation(address, coin, derivation).is_ok()
    }

    /// Validate a bech32 address against a custom HRP
    pub fn is_valid_bech32(address: &str, coin: CoinType, hrp: &str) -> bool {
        Self::with_string_bech32(address, coin, hrp).is_ok()
    }

    /// Validate an SS58 address against a custom network prefix
    pub fn is_valid_ss58(address: &str, coin: CoinType, prefix: u16) -> bool {
        Self::with_string_ss58(address, coin, prefix).is_ok()
    }

    pub fn with_string(address: &str, coin: CoinType) -> CoreResult<Self> {
        let inner = Inner::parse(address.trim(), coin)?;
        Ok(Self { coin, inner })
    }

    pub fn with_string_derivation(address: &str, coin: CoinType, derivation: Derivation) -> CoreResult<Self> {
        let inner = match coin.blockchain() {
            Blockchain::Bitcoin => Inner::Bitcoin(BitcoinAddress::parse_derivation(address.trim(), coin, derivation)?),
            _ => Inner::parse(address.trim(), coin)?,
        };
        Ok(Self { coin, inner })
    }

    pub fn with_string_bech32(address: &str, coin: CoinType, hrp: &str) -> CoreResult<Self> {
        let inner = match coin.blockchain() {
            Blockchain::Bitcoin => Inner::Bitcoin(BitcoinAddress::parse_segwit(address.trim(), hrp)?),
            Blockchain::Cosmos => Inner::Cosmos(CosmosAddress::parse_with_hrp(address.trim(), hrp)?),
            _ => {
                return Err(CoreError::invalid_address(format!(
                    "{} does not use bech32 addresses",
                    coin.name()
                )))
            }
        };
        Ok(Self { coin, inner })
    }

    pub fn with_string_ss58(address: &str, coin: CoinType, prefix: u16) -> CoreResult<Self> {
        if coin.blockchain() != Blockchain::Polkadot {
            return Err(CoreError::invalid_address(format!(
                "{} does not use SS58 addresses",
                coin.name()
            )));
        }
        let inner = Inner::Ss58(Ss58Address::parse_with_network(address.trim(), prefix)?);
        Ok(Self { coin, inner })
    }

    pub fn with_public_key(public_key: &PublicKey, coin: CoinType) -> CoreResult<Self> {
        Self::with_public_key_derivation(public_key, coin, Derivation::Default)
    }

    pub fn with_public_key_derivation(
        public_key: &PublicKey,
        coin: CoinType,
        derivation: Derivation,
    ) -> CoreResult<Self> {
        let inner = Inner::from_public_key(public_key, coin, derivation)?;
        Ok(Self { coin, inner })
    }

    pub fn with_public_key_bech32(public_key: &PublicKey, coin: CoinType, hrp: &str) -> CoreResult<Self> {
        let inner = match coin.blockchain() {
            Blockchain::Bitcoin => Inner::Bitcoin(BitcoinAddress::p2wpkh(public_key, hrp)?),
            Blockchain::Cosmos => Inner::Cosmos(CosmosAddress::with_hrp(public_key, hrp)?),
            _ => {
                return Err(CoreError::invalid_address(format!(
                    "{} does not use bech32 addresses",
                    coin.name()
                )))
            }
        };
        Ok(Self { coin, inner })
    }

    pub fn with_public_key_ss58(public_key: &PublicKey, coin: CoinType, prefix: u16) -> CoreResult<Self> {
        if coin.blockchain() != Blockchain::Polkadot {
            return Err(CoreError::invalid_address(format!(
                "{} does not use SS58 addresses",
                coin.name()
            )));
        }
        let inner = Inner::Ss58(Ss58Address::new(ed25519_bytes(public_key)?, prefix));
        Ok(Self { coin, inner })
    }

    pub fn description(&self) -> String {
        self.inner.description()
    }

    pub fn coin(&self) -> CoinType {
        self.coin
    }

    pub fn data(&self) -> Vec<u8> {
        self.inner.data()
    }
}

impl fmt::Display for AnyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl PartialEq for AnyAddress {
    fn eq(&self, other: &Self) -> bool {
        self.coin == other.coin && self.description() == other.description()
    }
}

impl Eq for AnyAddress {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    const PRIVATE_KEY: &str = "afeefca74d9a325cf1d6b6911d61a65c32afa8e02bd5e78e2e4ac2910bab45f5";

    fn derive(coin: CoinType) -> String {
        let key = PrivateKey::from_hex(PRIVATE_KEY).unwrap();
        let public_key = key.public_key(coin.public_key_type()).unwrap();
        AnyAddress::with_public_key(&public_key, coin).unwrap().description()
    }

    #[test]
    fn test_derive_from_private_key() {
        assert_eq!(derive(CoinType::Bitcoin), "bc1qten42eesehw0ktddcp0fws7d3ycsqez3f7d5yt");
        assert_eq!(derive(CoinType::Litecoin), "ltc1qten42eesehw0ktddcp0fws7d3ycsqez3dzhsum");
        assert_eq!(derive(CoinType::Dogecoin), "DDkFr311AYe6ABMsdSnjv8yoSr1Tppokp8");
        assert_eq!(derive(CoinType::BitcoinCash), "bitcoincash:qp0xw4t8xrxae7ed4hq9a96rekynzqry2ydzeh0jgs");
        assert_eq!(derive(CoinType::Ethereum), "0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309");
        assert_eq!(derive(CoinType::SmartChain), "0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309");
        assert_eq!(derive(CoinType::Polygon), "0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309");
        assert_eq!(derive(CoinType::Cosmos), "cosmos1ten42eesehw0ktddcp0fws7d3ycsqez3lynlqx");
        assert_eq!(derive(CoinType::THORChain), "thor1ten42eesehw0ktddcp0fws7d3ycsqez3er2y4e");
        assert_eq!(derive(CoinType::Binance), "bnb1ten42eesehw0ktddcp0fws7d3ycsqez3aqvnpg");
        assert_eq!(derive(CoinType::Solana), "5sn9QYhDaq61jLXJ8Li5BKqGL4DDMJQvU1rdN8XgVuwC");
        assert_eq!(
            derive(CoinType::Aptos),
            "0x9006fa46f038224e8004bdda97f2e7a60c2c3d135bce7cb15541e5c0aae907a4"
        );
        assert_eq!(
            derive(CoinType::Sui),
            "0x01a5c6c1b74cec4fbd12b3e17252b83448136065afcdf24954dc3a9c26df4905"
        );
    }

    #[test]
    fn test_legacy_derivation() {
        let key = PrivateKey::from_hex(PRIVATE_KEY).unwrap();
        let public_key = key.public_key(PublicKeyType::Secp256k1).unwrap();
        let legacy = AnyAddress::with_public_key_derivation(&public_key, CoinType::Bitcoin, Derivation::Legacy).unwrap();
        assert!(legacy.description().starts_with('1'));
        assert_eq!(legacy.data(), AnyAddress::with_public_key(&public_key, CoinType::Bitcoin).unwrap().data());
    }

    #[test]
    fn test_is_valid() {
        assert!(AnyAddress::is_valid("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", CoinType::Bitcoin));
        assert!(AnyAddress::is_valid("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", CoinType::Bitcoin));
        assert!(AnyAddress::is_valid("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", CoinType::Bitcoin));
        assert!(!AnyAddress::is_valid("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5", CoinType::Bitcoin));
        assert!(!AnyAddress::is_valid("ltc1qhd8fxxp2dx3vsmpac43z6ev0kllm4n53t5sk0u", CoinType::Bitcoin));
        assert!(AnyAddress::is_valid("ltc1qhd8fxxp2dx3vsmpac43z6ev0kllm4n53t5sk0u", CoinType::Litecoin));
        assert!(AnyAddress::is_valid("TQ5NMqJjhpQGK7YJbESKtNCo86PJ89ujio", CoinType::Tron));
        assert!(AnyAddress::is_valid("rPwE3gChNKtZ1mhH3Ko8YFGqKmGRWLWXV3", CoinType::Xrp));
        assert!(AnyAddress::is_valid("13nN6BGAoJwd7Nw1XxeBCx5YcBXuYnL94Mh7i3xBprqVSsFk", CoinType::Polkadot));
        assert!(!AnyAddress::is_valid("13nN6BGAoJwd7Nw1XxeBCx5YcBXuYnL94Mh7i3xBprqVSsFk", CoinType::Kusama));
        assert!(AnyAddress::is_valid("G9xV2EatmrjRC1FLPexc3ddqNRRzCsAdURU8RFiAAJX6ppY", CoinType::Kusama));
        assert!(!AnyAddress::is_valid("0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309", CoinType::Solana));
    }

    #[test]
    fn test_whitespace_handled_alike() {
        let padded = "  0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309\n";
        assert!(AnyAddress::is_valid(padded, CoinType::Ethereum));
        assert!(AnyAddress::with_string(padded, CoinType::Ethereum).is_ok());
        assert!(AnyAddress::is_valid(" bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4 ", CoinType::Bitcoin));
    }

    #[test]
    fn test_testnet_derivation_validates() {
        let key = PrivateKey::from_hex(PRIVATE_KEY).unwrap();
        let public_key = key.public_key(PublicKeyType::Secp256k1).unwrap();
        let testnet =
            AnyAddress::with_public_key_derivation(&public_key, CoinType::Bitcoin, Derivation::Testnet).unwrap();
        let encoded = testnet.description();
        assert!(encoded.starts_with("tb1q"));
        assert!(!AnyAddress::is_valid(&encoded, CoinType::Bitcoin));
        assert!(AnyAddress::is_valid_derivation(&encoded, CoinType::Bitcoin, Derivation::Testnet));
        assert_eq!(
            AnyAddress::with_string_derivation(&encoded, CoinType::Bitcoin, Derivation::Testnet).unwrap(),
            testnet
        );
        assert!(AnyAddress::is_valid_derivation(
            "0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309",
            CoinType::Ethereum,
            Derivation::Default
        ));
    }

    #[test]
    fn test_custom_hrp_and_prefix() {
        let cosmos = AnyAddress::with_string("cosmos1ten42eesehw0ktddcp0fws7d3ycsqez3lynlqx", CoinType::Cosmos).unwrap();
        assert!(!AnyAddress::is_valid_bech32(&cosmos.description(), CoinType::Cosmos, "osmo"));
        assert!(AnyAddress::is_valid_bech32(&cosmos.description(), CoinType::Cosmos, "cosmos"));
        assert!(AnyAddress::is_valid_bech32(
            "ltc1qhd8fxxp2dx3vsmpac43z6ev0kllm4n53t5sk0u",
            CoinType::Bitcoin,
            "ltc"
        ));

        let key = PrivateKey::from_hex(PRIVATE_KEY).unwrap();
        let ed = key.public_key(PublicKeyType::Ed25519).unwrap();
        let generic = AnyAddress::with_public_key_ss58(&ed, CoinType::Polkadot, 42).unwrap();
        assert!(generic.description().starts_with('5'));
        assert!(AnyAddress::is_valid_ss58(&generic.description(), CoinType::Polkadot, 42));
        assert!(!AnyAddress::is_valid(&generic.description(), CoinType::Polkadot));
        assert_eq!(generic.data(), ed.bytes());
    }

    #[test]
    fn test_equality_and_data() {
        let a = AnyAddress::with_string("0xac1ec44e4f0ca7d172b7803f6836de87fb72b309", CoinType::Ethereum).unwrap();
        let b = AnyAddress::with_string("0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309", CoinType::Ethereum).unwrap();
        assert_eq!(a, b);
        assert_eq!(hex::encode(a.data()), "ac1ec44e4f0ca7d172b7803f6836de87fb72b309");
        let c = AnyAddress::with_string("0xAc1ec44E4f0ca7D172B7803f6836De87Fb72b309", CoinType::Polygon).unwrap();
        assert_ne!(a, c);
        assert_eq!(a.coin(), CoinType::Ethereum);
    }
}
