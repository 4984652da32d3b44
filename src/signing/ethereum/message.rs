//! EIP-191 personal message signing

use crate::address::EthereumAddress;
use crate::crypto::hash::keccak256;
use crate::crypto::{CurveType, PrivateKey, PublicKey, PublicKeyType};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

const PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// How the recovery id is folded into the trailing `v` byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// `v = recid + 27`
    Legacy,
    /// `v = recid + 35 + 2 * chain_id`
    Eip155 { chain_id: u64 },
    /// raw recovery id
    ImmutableX,
}

pub fn message_hash(message: &[u8]) -> [u8; 32] {
    let mut data = format!("{}{}", PREFIX, message.len()).into_bytes();
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Sign `message`, returning the 65-byte `r || s || v` signature as hex
pub fn sign_message(private_key: &PrivateKey, message: &str, kind: MessageType) -> CoreResult<String> {
    let hash = message_hash(message.as_bytes());
    let mut signature = private_key.sign(&hash, CurveType::Secp256k1)?;
    let recid = signature[64] as u64;
    let v = match kind {
        MessageType::Legacy => recid + 27,
        MessageType::Eip155 { chain_id } => chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + recid))
            .ok_or_else(|| CoreError::invalid_input(format!("Chain id too large: {}", chain_id)))?,
        MessageType::ImmutableX => recid,
    };
    signature[64] = u8::try_from(v)
        .map_err(|_| CoreError::invalid_input(format!("Chain id too large for a one-byte v: {}", v)))?;
    Ok(hex::encode(signature))
}

fn recovery_id(v: u8) -> u8 {
    match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => (v.wrapping_sub(35)) % 2,
    }
}

/// Public key that produced `signature` over `message`
pub fn recover_public_key(message: &str, signature: &str) -> CoreResult<PublicKey> {
    let mut bytes = crate::encoding::decode_hex(signature)?;
    if bytes.len() != 65 {
        return Err(CoreError::invalid_input(format!(
            "Message signature must be 65 bytes, got {}",
            bytes.len()
        )));
    }
    bytes[64] = recovery_id(bytes[64]);
    PublicKey::recover(&bytes, &message_hash(message.as_bytes()))
}

pub fn recover_address(message: &str, signature: &str) -> CoreResult<EthereumAddress> {
    let public_key = recover_public_key(message, signature)?;
    let hash = keccak256(&public_key.bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(EthereumAddress::new(address))
}

pub fn verify_message(public_key: &PublicKey, message: &str, signature: &str) -> bool {
    let expected = match public_key.key_type() {
        PublicKeyType::Secp256k1 | PublicKeyType::Secp256k1Extended => public_key.uncompressed(),
        _ => return false,
    };
    match (expected, recover_public_key(message, signature)) {
        (Ok(expected), Ok(recovered)) => expected.bytes() == recovered.bytes(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "03a9ca895dca1623c7dfd69693f7b4111f5d819d2e145536e0b03c136025a25d";
    const LEGACY: &str = "21a779d499957e7fd39392d49a079679009e60e492d9654a148829be43d2490736ec72bc4a5644047d979c3cf4ebe2c1c514044cf436b063cb89fc6676be71101b";

    #[test]
    fn test_large_chain_id_rejected() {
        let key = PrivateKey::from_hex(KEY).unwrap();
        let err = sign_message(&key, "Foo", MessageType::Eip155 { chain_id: u64::MAX }).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
        assert!(sign_message(&key, "Foo", MessageType::Eip155 { chain_id: 200 }).is_err());
    }

    #[test]
    fn test_sign_legacy() {
        let key = PrivateKey::from_hex(KEY).unwrap();
        assert_eq!(sign_message(&key, "Foo", MessageType::Legacy).unwrap(), LEGACY);
    }

    #[test]
    fn test_sign_eip155() {
        let key = PrivateKey::from_hex(KEY).unwrap();
        let signature = sign_message(&key, "Foo", MessageType::Eip155 { chain_id: 0 }).unwrap();
        assert_eq!(&signature[..128], &LEGACY[..128]);
        assert!(signature.ends_with("23"));
    }

    #[test]
    fn test_verify_and_recover() {
        let key = PrivateKey::from_hex(KEY).unwrap();
        let public = key.public_key(PublicKeyType::Secp256k1Extended).unwrap();
        assert!(verify_message(&public, "Foo", LEGACY));
        assert!(!verify_message(&public, "Bar", LEGACY));

        let expected = EthereumAddress::new({
            let hash = keccak256(&public.bytes()[1..]);
            let mut a = [0u8; 20];
            a.copy_from_slice(&hash[12..]);
            a
        });
        assert_eq!(recover_address("Foo", LEGACY).unwrap(), expected);
        assert!(recover_address("Foo", "00").is_err());
    }
}
