//! Unified error types for multicoin-core
//!
//! All errors flow through this module for consistent handling
//! and FFI-safe error reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all engine operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_private_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPrivateKey, msg)
    }

    pub fn invalid_public_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPublicKey, msg)
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDerivationPath, msg)
    }

    pub fn invalid_transaction(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransaction, msg)
    }

    pub fn unsupported_coin(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedCoin, msg)
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningFailed, msg)
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientFunds, msg)
    }

    pub fn invalid_password() -> Self {
        Self::new(ErrorCode::InvalidPassword, "Password does not match keystore MAC")
    }

    pub fn keystore(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::KeystoreError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotImplemented, msg)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CoreError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Not an error. Used by signing outputs that carry a code on success.
    #[default]
    Ok,

    // Input errors
    InvalidInput,
    InvalidAddress,
    InvalidMnemonic,
    InvalidPrivateKey,
    InvalidPublicKey,
    InvalidDerivationPath,
    InvalidTransaction,
    UnsupportedCoin,

    // UTXO planning errors
    InsufficientFunds,
    DustAmount,
    NotEnoughUtxos,
    ZeroAmount,

    // Crypto errors
    CryptoError,
    SigningFailed,
    VerificationFailed,

    // Keystore errors
    InvalidPassword,
    KeystoreError,

    // Parse errors
    ParseError,
    JsonError,
    HexError,

    // Internal
    Internal,
    NotImplemented,
}

impl ErrorCode {
    pub fn is_ok(&self) -> bool {
        *self == ErrorCode::Ok
    }
}

/// Result type alias for engine operations
pub type CoreResult<T> = Result<T, CoreError>;

// Conversions from common error types

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<secp256k1::Error> for CoreError {
    fn from(e: secp256k1::Error) -> Self {
        CoreError::new(ErrorCode::CryptoError, format!("Secp256k1 error: {}", e))
    }
}

impl From<bip39::Error> for CoreError {
    fn from(e: bip39::Error) -> Self {
        CoreError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}

impl From<crate::crypto::curves::CurveError> for CoreError {
    fn from(e: crate::crypto::curves::CurveError) -> Self {
        use crate::crypto::curves::CurveError;
        let code = match &e {
            CurveError::InvalidPrivateKey(_) => ErrorCode::InvalidPrivateKey,
            CurveError::InvalidPublicKey(_) => ErrorCode::InvalidPublicKey,
            CurveError::VerificationFailed(_) | CurveError::InvalidSignature(_) => {
                ErrorCode::VerificationFailed
            }
            CurveError::DerivationFailed(_) => ErrorCode::InvalidDerivationPath,
            _ => ErrorCode::CryptoError,
        };
        CoreError::new(code, e.to_string())
    }
}

impl From<crate::signing::preimage::PreImageError> for CoreError {
    fn from(e: crate::signing::preimage::PreImageError) -> Self {
        use crate::signing::preimage::PreImageError;
        let code = match &e {
            PreImageError::InvalidSignature(_) | PreImageError::PublicKeyMismatch => {
                ErrorCode::VerificationFailed
            }
            PreImageError::InvalidPublicKey(_) => ErrorCode::InvalidPublicKey,
            _ => ErrorCode::InvalidTransaction,
        };
        CoreError::new(code, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = CoreError::insufficient_funds("Not enough BTC")
            .with_details("Required: 0.01 BTC, Available: 0.005 BTC");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("insufficient_funds"));
        assert!(json.contains("Not enough BTC"));
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_address("bad checksum");
        assert_eq!(err.to_string(), "[InvalidAddress] bad checksum");
        assert!(ErrorCode::default().is_ok());
    }
}
