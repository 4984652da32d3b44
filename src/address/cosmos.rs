//! Cosmos-style bech32 account addresses (`cosmos`, `thor`, `bnb`)

use super::{secp256k1_compressed, CoinAddress};
use crate::coin::CoinType;
use crate::crypto::hash::hash160;
use crate::crypto::PublicKey;
use crate::encoding::bech32;
use crate::error::{CoreError, CoreResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CosmosAddress {
    hrp: String,
    key_hash: Vec<u8>,
}

impl CosmosAddress {
    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    pub fn with_hrp(public_key: &PublicKey, hrp: &str) -> CoreResult<Self> {
        if hrp.is_empty() {
            return Err(CoreError::invalid_address("Empty bech32 HRP"));
        }
        Ok(Self {
            hrp: hrp.to_string(),
            key_hash: hash160(&secp256k1_compressed(public_key)?).to_vec(),
        })
    }

    pub fn parse_with_hrp(address: &str, hrp: &str) -> CoreResult<Self> {
        let (decoded_hrp, data) = bech32::decode(address)
            .ok_or_else(|| CoreError::invalid_address("Invalid bech32 encoding"))?;
        if decoded_hrp != hrp {
            return Err(CoreError::invalid_address(format!(
                "Expected prefix {}, got {}",
                hrp, decoded_hrp
            )));
        }
        // 20-byte accounts, 32-byte module and contract accounts
        if data.len() != 20 && data.len() != 32 {
            return Err(CoreError::invalid_address(format!(
                "Unexpected payload length {}",
                data.len()
            )));
        }
        Ok(Self {
            hrp: decoded_hrp,
            key_hash: data,
        })
    }
}

fn coin_hrp(coin: CoinType) -> CoreResult<&'static str> {
    coin.hrp()
        .ok_or_else(|| CoreError::unsupported_coin(format!("{} has no bech32 prefix", coin.name())))
}

impl CoinAddress for CosmosAddress {
    fn from_public_key(public_key: &PublicKey, coin: CoinType) -> CoreResult<Self> {
        Self::with_hrp(public_key, coin_hrp(coin)?)
    }

    fn parse(address: &str, coin: CoinType) -> CoreResult<Self> {
        Self::parse_with_hrp(address, coin_hrp(coin)?)
    }

    fn data(&self) -> Vec<u8> {
        self.key_hash.clone()
    }
}

impl fmt::Display for CosmosAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Construction guarantees an encodable HRP and payload
        let encoded = bech32::encode(&self.hrp, &self.key_hash).unwrap_or_default();
        f.write_str(&encoded)
    }
}
