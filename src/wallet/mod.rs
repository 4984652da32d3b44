//! Wallet Module
//!
//! Handles mnemonic generation and validation, derivation paths,
//! BIP-32 extended keys and the HD wallet that ties them together.

pub mod derivation_path;
pub mod extended_key;
pub mod hd_wallet;
pub mod mnemonic;

pub use derivation_path::{
    get_standard_path, validate_derivation_path, DerivationComponent, DerivationPath, PathValidation,
};
pub use extended_key::ExtendedKey;
pub use hd_wallet::HDWallet;
