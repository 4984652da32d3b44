//! Binary encodings used by addresses and transactions

pub mod base32;
pub mod base58;
pub mod bech32;
pub mod cashaddr;
pub mod crc16;
pub mod scale;

/// Decode hex, accepting an optional `0x` prefix
pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let trimmed = s.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(stripped)
}

/// Hex with a `0x` prefix
pub fn encode_hex_prefixed(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}
