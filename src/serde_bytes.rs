//! Serde helpers for JSON transaction inputs
//!
//! Byte strings travel as hex (an optional `0x` prefix is accepted on input),
//! large integers as decimal strings.

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize/deserialize `Vec<u8>` as hex string
pub mod hex_bytes {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        crate::encoding::decode_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Serialize/deserialize [u8; 32] as hex string
pub mod hex32 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = crate::encoding::decode_hex(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

/// Serialize/deserialize `Vec<Vec<u8>>` as a list of hex strings
pub mod hex_list {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&hex::encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        raw.iter()
            .map(|s| crate::encoding::decode_hex(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Accepts a decimal string, a `0x` hex string or a JSON number
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn parse_u128<E: serde::de::Error>(raw: NumberOrString) -> Result<u128, E> {
    match raw {
        NumberOrString::Number(n) => Ok(n as u128),
        NumberOrString::String(s) if s.is_empty() => Ok(0),
        NumberOrString::String(s) => match s.strip_prefix("0x") {
            Some(digits) => u128::from_str_radix(digits, 16),
            None => s.parse::<u128>(),
        }
        .map_err(|_| E::custom(format!("invalid amount: {}", s))),
    }
}

/// Serialize/deserialize u128 as decimal string
pub mod u128_string {
    use super::*;

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_u128(NumberOrString::deserialize(deserializer)?)
    }
}

/// Serialize/deserialize u64 as decimal string
pub mod u64_string {
    use super::*;

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = parse_u128::<D::Error>(NumberOrString::deserialize(deserializer)?)?;
        u64::try_from(value).map_err(|_| serde::de::Error::custom("amount exceeds u64"))
    }
}

/// Big-endian 256-bit word from a decimal or `0x` hex string
pub fn parse_u256(s: &str) -> Option<[u8; 32]> {
    let mut word = [0u8; 32];
    if let Some(digits) = s.strip_prefix("0x") {
        if digits.is_empty() || digits.len() > 64 {
            return None;
        }
        let padded = format!("{:0>64}", digits);
        hex::decode_to_slice(padded, &mut word).ok()?;
        return Some(word);
    }
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    for digit in s.bytes().map(|b| b - b'0') {
        // word = word * 10 + digit
        let mut carry = digit as u32;
        for byte in word.iter_mut().rev() {
            let value = *byte as u32 * 10 + carry;
            *byte = value as u8;
            carry = value >> 8;
        }
        if carry != 0 {
            return None;
        }
    }
    Some(word)
}

pub fn u256_from_u128(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Serialize/deserialize a uint256 held as 32 big-endian bytes
///
/// Accepts the same inputs as [`u128_string`]; serializes as `0x` hex.
pub mod u256_string {
    use super::*;

    pub fn serialize<S>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(u256_from_u128(n as u128)),
            NumberOrString::String(s) if s.is_empty() => Ok([0u8; 32]),
            NumberOrString::String(s) => {
                parse_u256(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {}", s)))
            }
        }
    }
}
