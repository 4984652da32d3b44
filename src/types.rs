//! Request and response shapes shared by the C ABI and the CLI
//!
//! Every structure here crosses the JSON boundary, so field names are part
//! of the public contract.

use crate::coin::{CoinType, Derivation};
use crate::error::CoreError;
use crate::keystore::{Cipher, EncryptionLevel, StoredKeyType};
use crate::serde_bytes::{hex_bytes, hex_list};
use crate::signing::ethereum::message::MessageType;
use crate::wallet::DerivationPath;
use serde::{Deserialize, Serialize};

// =============================================================================
// Addresses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRequest {
    pub coin: CoinType,
    pub address: String,
    /// Address format to expect; `testnet` selects `tb1` for Bitcoin
    #[serde(default)]
    pub derivation: Derivation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressValidation {
    pub valid: bool,
    pub coin: CoinType,
    /// Canonical rendering of a valid address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Address for a public key, or for the key behind a private key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeriveAddressRequest {
    pub coin: CoinType,
    #[serde(default, with = "hex_bytes")]
    pub public_key: Vec<u8>,
    #[serde(default, with = "hex_bytes")]
    pub private_key: Vec<u8>,
    #[serde(default)]
    pub derivation: Derivation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub coin: CoinType,
    pub address: String,
    pub public_key: String,
}

// =============================================================================
// Mnemonics and HD derivation
// =============================================================================

fn default_strength() -> u32 {
    128
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnemonicRequest {
    #[serde(default = "default_strength")]
    pub strength: u32,
}

impl Default for MnemonicRequest {
    fn default() -> Self {
        Self {
            strength: default_strength(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnemonicResponse {
    pub mnemonic: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnemonicValidateRequest {
    pub mnemonic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
}

/// Key at `path`, or at the coin's path for `derivation` when no path is given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HdDeriveRequest {
    pub mnemonic: String,
    #[serde(default)]
    pub passphrase: String,
    pub coin: CoinType,
    #[serde(default)]
    pub derivation: Derivation,
    #[serde(default)]
    pub path: Option<DerivationPath>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedKey {
    pub coin: CoinType,
    pub path: DerivationPath,
    pub address: String,
    pub public_key: String,
    pub private_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_public_key: Option<String>,
}

// =============================================================================
// Signing
// =============================================================================

/// Chain `SigningInput` wrapped with its coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignRequest {
    pub coin: CoinType,
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    pub coin: CoinType,
    pub input: serde_json::Value,
    #[serde(with = "hex_list")]
    pub signatures: Vec<Vec<u8>>,
    #[serde(with = "hex_list")]
    pub public_keys: Vec<Vec<u8>>,
}

// =============================================================================
// Keystore
// =============================================================================

/// New stored key from a mnemonic, a private key, or a fresh mnemonic when
/// neither is given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreCreateRequest {
    #[serde(default)]
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub mnemonic: Option<String>,
    #[serde(default, with = "hex_bytes")]
    pub private_key: Vec<u8>,
    /// Adds the default account for this coin
    #[serde(default)]
    pub coin: Option<CoinType>,
    #[serde(default)]
    pub level: Option<EncryptionLevel>,
    #[serde(default)]
    pub cipher: Option<Cipher>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreImportRequest {
    /// Keystore file contents, as a JSON string or an inline object
    pub keystore: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreDecryptRequest {
    pub keystore: serde_json::Value,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptedSecret {
    #[serde(rename = "type")]
    pub key_type: StoredKeyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

// =============================================================================
// Messages
// =============================================================================

fn default_message_type() -> MessageType {
    MessageType::Legacy
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSignRequest {
    #[serde(with = "hex_bytes")]
    pub private_key: Vec<u8>,
    pub message: String,
    #[serde(default = "default_message_type")]
    pub message_type: MessageType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSignature {
    pub signature: String,
}

/// Checked against `public_key` when given, otherwise against `address`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageVerifyRequest {
    pub message: String,
    pub signature: String,
    #[serde(default, with = "hex_bytes")]
    pub public_key: Vec<u8>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
}

// =============================================================================
// Response envelope
// =============================================================================

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<CoreError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: CoreError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T> From<crate::error::CoreResult<T>> for ApiResponse<T> {
    fn from(result: crate::error::CoreResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::err(error),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"data":null,"error":{"code":"internal","message":"Serialization failed"}}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_api_response_serialization() {
        let json = ApiResponse::ok(ValidationResult { valid: true }).to_json();
        assert_eq!(json, r#"{"success":true,"data":{"valid":true},"error":null}"#);

        let failed: ApiResponse<()> = ApiResponse::err(CoreError::invalid_address("bad checksum"));
        let value: serde_json::Value = serde_json::from_str(&failed.to_json()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "invalid_address");
    }

    #[test]
    fn test_request_defaults() {
        let request: HdDeriveRequest =
            serde_json::from_str(r#"{"mnemonic":"abandon","coin":"solana"}"#).unwrap();
        assert_eq!(request.derivation, Derivation::Default);
        assert!(request.path.is_none());
        assert!(request.passphrase.is_empty());

        let sign: MessageSignRequest =
            serde_json::from_str(r#"{"private_key":"0x01","message":"hi"}"#).unwrap();
        assert_eq!(sign.message_type, MessageType::Legacy);
        assert_eq!(sign.private_key, vec![1]);
    }

    #[test]
    fn test_unknown_coin_is_rejected() {
        let err = serde_json::from_str::<AddressRequest>(r#"{"coin":"monero","address":"4"}"#)
            .map_err(CoreError::from)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::JsonError);
    }
}
