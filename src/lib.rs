//! multicoin-core
//!
//! Offline multi-chain wallet engine: coin registry, key and address
//! handling, HD wallets, transaction signing and encrypted key storage.
//!
//! # Architecture
//!
//! This crate provides:
//! - **coin**: the `CoinType` registry and per-coin parameters
//! - **crypto**: curves, private and public keys, hash functions
//! - **encoding**: base58, bech32, CashAddr, SCALE and friends
//! - **address**: `AnyAddress` and the per-chain address types
//! - **wallet**: BIP-39 mnemonics, derivation paths, `HDWallet`
//! - **signing**: `AnySigner`, per-chain signers, `TransactionCompiler`
//! - **keystore**: password-encrypted `StoredKey` files
//! - **ffi**: C-ABI exports taking and returning JSON
//! - **cli**: the `multicoin` command line
//!
//! # FFI Usage
//!
//! All public FFI functions are in the `ffi` module and follow this pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `multicoin_free_string`)
//!
//! # Security
//!
//! This crate uses `zeroize` to securely clear sensitive data from memory.
//! Private keys, seeds and decrypted keystore payloads are zeroed when dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use multicoin_core::{AnyAddress, CoinType, HDWallet};
//!
//! let wallet = HDWallet::with_mnemonic(phrase, "")?;
//! let address = wallet.get_address_for_coin(CoinType::Bitcoin)?;
//! assert!(AnyAddress::is_valid(&address, CoinType::Bitcoin));
//! ```

pub mod address;
pub mod cli;
pub mod coin;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod ffi;
pub mod keystore;
pub mod operations;
pub mod serde_bytes;
pub mod signing;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use address::AnyAddress;
pub use coin::{Blockchain, CoinType, Derivation};
pub use crypto::{CurveType, PrivateKey, PublicKey, PublicKeyType};
pub use error::{CoreError, CoreResult, ErrorCode};
pub use keystore::StoredKey;
pub use signing::{AnySigner, TransactionCompiler};
pub use wallet::{DerivationPath, HDWallet};

pub use ffi::multicoin_free_string;
