//! Base58 and Base58Check with the Bitcoin and Ripple alphabets

use crate::crypto::hash::sha256d;
use bs58::Alphabet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base58Alphabet {
    Bitcoin,
    Ripple,
}

impl Base58Alphabet {
    fn alphabet(&self) -> &'static Alphabet {
        match self {
            Base58Alphabet::Bitcoin => Alphabet::BITCOIN,
            Base58Alphabet::Ripple => Alphabet::RIPPLE,
        }
    }
}

pub fn encode(data: &[u8], alphabet: Base58Alphabet) -> String {
    bs58::encode(data)
        .with_alphabet(alphabet.alphabet())
        .into_string()
}

pub fn decode(s: &str, alphabet: Base58Alphabet) -> Option<Vec<u8>> {
    bs58::decode(s)
        .with_alphabet(alphabet.alphabet())
        .into_vec()
        .ok()
}

/// Append a 4-byte double-SHA256 checksum and encode
pub fn encode_check(payload: &[u8], alphabet: Base58Alphabet) -> String {
    let checksum = sha256d(payload);
    let mut data = payload.to_vec();
    data.extend_from_slice(&checksum[..4]);
    encode(&data, alphabet)
}

/// Decode and verify the checksum, returning the payload
pub fn decode_check(s: &str, alphabet: Base58Alphabet) -> Option<Vec<u8>> {
    let data = decode(s, alphabet)?;
    if data.len() < 4 {
        return None;
    }
    let (payload, checksum) = data.split_at(data.len() - 4);
    if sha256d(payload)[..4] != *checksum {
        return None;
    }
    Some(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitcoin_check() {
        // P2PKH for hash160 0d0e1cec6c2babe8badde5e9b3dea667da90036d
        let mut payload = vec![0x00];
        payload.extend(hex::decode("0d0e1cec6c2babe8badde5e9b3dea667da90036d").unwrap());
        let address = encode_check(&payload, Base58Alphabet::Bitcoin);
        assert_eq!(address, "12C2h5hXPxyrdvnYUBFaBGFnNNYjpWXhPX");
        assert_eq!(decode_check(&address, Base58Alphabet::Bitcoin).unwrap(), payload);
    }

    #[test]
    fn test_bad_checksum() {
        assert!(decode_check("12C2h5hXPxyrdvnYUBFaBGFnNNYjpWXhPY", Base58Alphabet::Bitcoin).is_none());
        assert!(decode_check("1", Base58Alphabet::Bitcoin).is_none());
        assert!(decode("0OIl", Base58Alphabet::Bitcoin).is_none());
    }

    #[test]
    fn test_ripple_alphabet() {
        let encoded = encode(&[0u8; 3], Base58Alphabet::Ripple);
        assert_eq!(encoded, "rrr");
        assert_eq!(decode("rrr", Base58Alphabet::Ripple).unwrap(), vec![0u8; 3]);
    }
}
