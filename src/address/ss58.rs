//! SS58 addresses for Substrate networks
//!
//! `base58(prefix || public key || blake2b512("SS58PRE" || prefix || key)[..2])`
//! with a one-byte prefix below 64 and a two-byte prefix up to 16383.

use super::{ed25519_bytes, CoinAddress};
use crate::coin::CoinType;
use crate::crypto::hash::blake2b;
use crate::crypto::PublicKey;
use crate::encoding::base58::{self, Base58Alphabet};
use crate::error::{CoreError, CoreResult};
use std::fmt;

const CHECKSUM_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;
const MAX_NETWORK: u16 = 16383;

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut input = Vec::with_capacity(CHECKSUM_PREFIX.len() + data.len());
    input.extend_from_slice(CHECKSUM_PREFIX);
    input.extend_from_slice(data);
    let hash = blake2b(&input, 64);
    [hash[0], hash[1]]
}

fn encode_network(network: u16) -> Vec<u8> {
    if network < 64 {
        vec![network as u8]
    } else {
        let first = ((network & 0x00fc) >> 2) as u8 | 0x40;
        let second = ((network >> 8) as u8) | (((network & 0x0003) as u8) << 6);
        vec![first, second]
    }
}

/// Network id and the number of bytes it occupies
fn decode_network(data: &[u8]) -> Option<(u16, usize)> {
    match *data.first()? {
        b @ 0..=63 => Some((b as u16, 1)),
        b @ 64..=127 => {
            let second = *data.get(1)?;
            let lower = ((b as u16 & 0x3f) << 2) | (second as u16 >> 6);
            let upper = (second as u16 & 0x3f) << 8;
            Some((lower | upper, 2))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ss58Address {
    key: [u8; 32],
    network: u16,
}

impl Ss58Address {
    pub fn new(key: [u8; 32], network: u16) -> Self {
        Self { key, network }
    }

    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn network(&self) -> u16 {
        self.network
    }

    /// Parse and require the given network prefix
    pub fn parse_with_network(address: &str, network: u16) -> CoreResult<Self> {
        let parsed = Self::decode(address)?;
        if parsed.network != network {
            return Err(CoreError::invalid_address(format!(
                "SS58 network {} does not match expected {}",
                parsed.network, network
            )));
        }
        Ok(parsed)
    }

    /// Parse an address of any network
    pub fn decode(address: &str) -> CoreResult<Self> {
        let data = base58::decode(address, Base58Alphabet::Bitcoin)
            .ok_or_else(|| CoreError::invalid_address("Invalid base58 encoding"))?;
        let (network, prefix_len) =
            decode_network(&data).ok_or_else(|| CoreError::invalid_address("Invalid SS58 network prefix"))?;
        if data.len() != prefix_len + 32 + CHECKSUM_LEN {
            return Err(CoreError::invalid_address(format!(
                "Unexpected SS58 length {}",
                data.len()
            )));
        }
        let body_len = prefix_len + 32;
        if checksum(&data[..body_len]) != data[body_len..] {
            return Err(CoreError::invalid_address("SS58 checksum mismatch"));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&data[prefix_len..body_len]);
        Ok(Self { key, network })
    }
}

fn coin_network(coin: CoinType) -> CoreResult<u16> {
    coin.ss58_prefix()
        .ok_or_else(|| CoreError::unsupported_coin(format!("{} has no SS58 prefix", coin.name())))
}

impl CoinAddress for Ss58Address {
    fn from_public_key(public_key: &PublicKey, coin: CoinType) -> CoreResult<Self> {
        Ok(Self::new(ed25519_bytes(public_key)?, coin_network(coin)?))
    }

    fn parse(address: &str, coin: CoinType) -> CoreResult<Self> {
        Self::parse_with_network(address, coin_network(coin)?)
    }

    fn data(&self) -> Vec<u8> {
        self.key.to_vec()
    }
}

impl fmt::Display for Ss58Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = encode_network(self.network.min(MAX_NETWORK));
        data.extend_from_slice(&self.key);
        let sum = checksum(&data);
        data.extend_from_slice(&sum);
        f.write_str(&base58::encode(&data, Base58Alphabet::Bitcoin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polkadot_vector() {
        let key = hex::decode("8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48").unwrap();
        let address = Ss58Address::new(key.try_into().unwrap(), 0);
        assert_eq!(address.to_string(), "14E5nqKAp3oAJcmzgZhUD2RcptBeUBScxKHgJKU4HPNcKVf3");
        let parsed = Ss58Address::parse("14E5nqKAp3oAJcmzgZhUD2RcptBeUBScxKHgJKU4HPNcKVf3", CoinType::Polkadot).unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_two_byte_network_round_trip() {
        for network in [64u16, 255, 1284, 16383] {
            let address = Ss58Address::new([7u8; 32], network);
            let decoded = Ss58Address::decode(&address.to_string()).unwrap();
            assert_eq!(decoded.network(), network);
            assert_eq!(decoded.key(), &[7u8; 32]);
        }
    }

    #[test]
    fn test_rejects_wrong_network_and_checksum() {
        assert!(Ss58Address::parse("14E5nqKAp3oAJcmzgZhUD2RcptBeUBScxKHgJKU4HPNcKVf3", CoinType::Kusama).is_err());
        assert!(Ss58Address::decode("14E5nqKAp3oAJcmzgZhUD2RcptBeUBScxKHgJKU4HPNcKVf4").is_err());
    }
}
