//! RFC 4648 Base32 without padding (Stellar, Algorand)

use ::base32::Alphabet;

const ALPHABET: Alphabet = Alphabet::Rfc4648 { padding: false };

pub fn encode(data: &[u8]) -> String {
    ::base32::encode(ALPHABET, data)
}

/// Decode upper-case unpadded base32
pub fn decode(s: &str) -> Option<Vec<u8>> {
    if s.is_empty() || s.chars().any(|c| !matches!(c, 'A'..='Z' | '2'..='7')) {
        return None;
    }
    ::base32::decode(ALPHABET, s)
}
