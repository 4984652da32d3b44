//! Bech32 / Bech32m and segwit witness programs

use ::bech32::{FromBase32, ToBase32, Variant};

pub fn encode(hrp: &str, data: &[u8]) -> Option<String> {
    ::bech32::encode(hrp, data.to_base32(), Variant::Bech32).ok()
}

/// Decode a plain bech32 string, returning the HRP and 8-bit payload
pub fn decode(s: &str) -> Option<(String, Vec<u8>)> {
    let (hrp, data, variant) = ::bech32::decode(s).ok()?;
    if variant != Variant::Bech32 {
        return None;
    }
    let bytes = Vec::<u8>::from_base32(&data).ok()?;
    Some((hrp, bytes))
}

/// Encode a witness program: v0 uses bech32, v1+ bech32m
pub fn encode_segwit(hrp: &str, version: u8, program: &[u8]) -> Option<String> {
    if version > 16 {
        return None;
    }
    let mut data = vec![::bech32::u5::try_from_u8(version).ok()?];
    data.extend(program.to_base32());
    let variant = if version == 0 { Variant::Bech32 } else { Variant::Bech32m };
    ::bech32::encode(hrp, data, variant).ok()
}

/// Decode a segwit address with the expected HRP
pub fn decode_segwit(hrp: &str, s: &str) -> Option<(u8, Vec<u8>)> {
    let (decoded_hrp, data, variant) = ::bech32::decode(s).ok()?;
    if decoded_hrp != hrp || data.is_empty() {
        return None;
    }

    let version = data[0].to_u8();
    let program = Vec::<u8>::from_base32(&data[1..]).ok()?;

    let expected = if version == 0 { Variant::Bech32 } else { Variant::Bech32m };
    if variant != expected || version > 16 {
        return None;
    }
    if program.len() < 2 || program.len() > 40 {
        return None;
    }
    if version == 0 && program.len() != 20 && program.len() != 32 {
        return None;
    }
    Some((version, program))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segwit_v0() {
        let program = hex::decode("0d0e1cec6c2babe8badde5e9b3dea667da90036d").unwrap();
        let address = encode_segwit("bc", 0, &program).unwrap();
        assert_eq!(address, "bc1qp58pemrv9w473wkauh5m8h4xvldfqqmdk7s5ju");
        assert_eq!(decode_segwit("bc", &address).unwrap(), (0, program));
        assert!(decode_segwit("ltc", &address).is_none());
    }

    #[test]
    fn test_segwit_v1_uses_bech32m() {
        let address = "bc1pps3sf8cl8xuy42s9gnyacez9wlwjxpyf32lrxlac7fw4wnuf6e9s0v066l";
        let (version, program) = decode_segwit("bc", address).unwrap();
        assert_eq!(version, 1);
        assert_eq!(
            hex::encode(&program),
            "0c23049f1f39b84aaa0544c9dc644577dd2304898abe337fb8f25d574f89d64b"
        );
        assert_eq!(encode_segwit("bc", 1, &program).unwrap(), address);
    }

    #[test]
    fn test_plain_roundtrip() {
        let data = [0x42u8; 20];
        let encoded = encode("cosmos", &data).unwrap();
        assert!(encoded.starts_with("cosmos1"));
        assert_eq!(decode(&encoded).unwrap(), ("cosmos".to_string(), data.to_vec()));
    }
}
