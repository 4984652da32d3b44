//! Derived account records kept alongside the encrypted secret

use crate::address::AnyAddress;
use crate::coin::{CoinType, Derivation, HdVersion};
use crate::crypto::{PrivateKey, PublicKey};
use crate::error::CoreResult;
use crate::wallet::{DerivationPath, HDWallet};
use serde::{Deserialize, Serialize};

/// One address of a stored key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Empty in legacy files until the address is fixed
    #[serde(default)]
    pub address: String,
    #[serde(with = "slip44")]
    pub coin: CoinType,
    #[serde(default)]
    pub derivation: Derivation,
    pub derivation_path: DerivationPath,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub extended_public_key: String,
}

impl Account {
    /// Account for a bare private key at the coin's default path
    pub fn from_private_key(key: &PrivateKey, coin: CoinType) -> CoreResult<Self> {
        let public_key = key.public_key(coin.public_key_type())?;
        Ok(Self {
            address: AnyAddress::with_public_key(&public_key, coin)?.description(),
            coin,
            derivation: Derivation::Default,
            derivation_path: coin.derivation_path(Derivation::Default),
            public_key: public_key.hex(),
            extended_public_key: String::new(),
        })
    }

    pub fn from_wallet(wallet: &HDWallet, coin: CoinType, derivation: Derivation) -> CoreResult<Self> {
        let path = coin.derivation_path(derivation);
        let key = wallet.get_key(coin, &path)?;
        let public_key = key.public_key(coin.public_key_type())?;
        Ok(Self {
            address: AnyAddress::with_public_key_derivation(&public_key, coin, derivation)?.description(),
            coin,
            derivation,
            extended_public_key: extended_public_key(wallet, coin, derivation, &path)?,
            derivation_path: path,
            public_key: public_key.hex(),
        })
    }

    /// Recompute the address from the stored public key
    pub fn refresh_address(&mut self) -> CoreResult<()> {
        if self.public_key.is_empty() {
            return Ok(());
        }
        let bytes = hex::decode(&self.public_key)?;
        let public_key = PublicKey::new(&bytes, self.coin.public_key_type())?;
        self.address = AnyAddress::with_public_key_derivation(&public_key, self.coin, self.derivation)?.description();
        Ok(())
    }
}

/// Account-level xpub for UTXO coins; empty elsewhere
fn extended_public_key(
    wallet: &HDWallet,
    coin: CoinType,
    derivation: Derivation,
    path: &DerivationPath,
) -> CoreResult<String> {
    let Some((public_version, _)) = coin.hd_versions() else {
        return Ok(String::new());
    };
    let version = match derivation {
        Derivation::Default => public_version,
        Derivation::Legacy => HdVersion::Xpub,
        Derivation::Segwit | Derivation::Testnet => return Ok(String::new()),
    };
    let purpose = path.purpose().unwrap_or(44);
    wallet.get_extended_public_key(purpose, coin, version)
}

/// Coins travel as SLIP-44 numbers
mod slip44 {
    use crate::coin::CoinType;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(coin: &CoinType, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(coin.slip44())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CoinType, D::Error> {
        let value = u32::deserialize(deserializer)?;
        CoinType::from_slip44(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown coin {}", value)))
    }
}
