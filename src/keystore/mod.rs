//! Key Storage
//!
//! Web3 Secret Storage (version 3) files extended with a key type, a name and
//! the accounts derived from the stored mnemonic or private key.
//!
//! SECURITY: decrypted secrets are returned in `Zeroizing` buffers.

mod account;
mod encryption;
mod stored_key;

pub use account::Account;
pub use encryption::{Cipher, EncryptedPayload, EncryptionLevel, Kdf, KdfParams, Pbkdf2Params, ScryptParams};
pub use stored_key::{StoredKey, StoredKeyType};
