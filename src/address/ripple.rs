//! XRP classic addresses (Ripple alphabet base58check of `0x00 || hash160`)

use super::{secp256k1_compressed, CoinAddress};
use crate::coin::CoinType;
use crate::crypto::hash::hash160;
use crate::crypto::PublicKey;
use crate::encoding::base58::{self, Base58Alphabet};
use crate::error::{CoreError, CoreResult};
use std::fmt;

const VERSION: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XrpAddress([u8; 20]);

impl XrpAddress {
    pub fn account_id(&self) -> &[u8; 20] {
        &self.0
    }
}

impl CoinAddress for XrpAddress {
    fn from_public_key(public_key: &PublicKey, _coin: CoinType) -> CoreResult<Self> {
        Ok(Self(hash160(&secp256k1_compressed(public_key)?)))
    }

    fn parse(address: &str, _coin: CoinType) -> CoreResult<Self> {
        let data = base58::decode_check(address, Base58Alphabet::Ripple)
            .ok_or_else(|| CoreError::invalid_address("Invalid XRP base58check encoding"))?;
        if data.len() != 21 || data[0] != VERSION {
            return Err(CoreError::invalid_address("XRP address must be 0x00 followed by 20 bytes"));
        }
        let mut id = [0u8; 20];
        id.copy_from_slice(&data[1..]);
        Ok(Self(id))
    }

    fn data(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for XrpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = vec![VERSION];
        data.extend_from_slice(&self.0);
        f.write_str(&base58::encode_check(&data, Base58Alphabet::Ripple))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let parsed = XrpAddress::parse("r36yxStAh7qgTQNHTzjZvXybCTzUFhrfav", CoinType::Xrp).unwrap();
        assert_eq!(parsed.to_string(), "r36yxStAh7qgTQNHTzjZvXybCTzUFhrfav");
        assert_eq!(parsed.data().len(), 20);
    }

    #[test]
    fn test_parse() {
        assert!(XrpAddress::parse("r36yxStAh7qgTQNHTzjZvXybCTzUFhrfav", CoinType::Xrp).is_ok());
        assert!(XrpAddress::parse("rPwE3gChNKtZ1mhH3Ko8YFGqKmGRWLWXV3", CoinType::Xrp).is_ok());
        assert!(XrpAddress::parse("r36yxStAh7qgTQNHTzjZvXybCTzUFhrfa", CoinType::Xrp).is_err());
        assert!(XrpAddress::parse("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", CoinType::Xrp).is_err());
    }
}
