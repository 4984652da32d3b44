//! Cryptographic primitives
//!
//! - Hash functions shared by address encoders and signers
//! - Multi-curve abstractions (secp256k1, ed25519, nist256p1)
//! - Private and public key wrappers

pub mod curves;
pub mod hash;
pub mod keys;

pub use curves::{CurveError, CurveType};
pub use keys::{PrivateKey, PublicKey, PublicKeyType};
