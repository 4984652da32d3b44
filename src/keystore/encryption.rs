//! Password encryption of keystore payloads
//!
//! Scrypt or PBKDF2-HMAC-SHA256 stretches the password, AES-CTR encrypts the
//! secret with the first 16 or 32 derived bytes, and
//! `keccak256(derived[16..32] ‖ ciphertext)` authenticates it.

use crate::crypto::hash::keccak256;
use crate::error::{CoreError, CoreResult};
use crate::log_debug;
use crate::serde_bytes::hex_bytes;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::Hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

const SALT_SIZE: usize = 32;
const IV_SIZE: usize = 16;
const DERIVED_KEY_SIZE: usize = 32;
const PBKDF2_ITERATIONS: u32 = 262_144;
const PRF_HMAC_SHA256: &str = "hmac-sha256";

/// Scrypt cost presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionLevel {
    /// n = 4096, p = 6
    Light,
    /// n = 16384, p = 4
    #[default]
    Weak,
    /// n = 262144, p = 1
    Standard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cipher {
    #[default]
    #[serde(rename = "aes-128-ctr")]
    Aes128Ctr,
    #[serde(rename = "aes-256-ctr")]
    Aes256Ctr,
}

impl Cipher {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cipher::Aes128Ctr => "aes-128-ctr",
            Cipher::Aes256Ctr => "aes-256-ctr",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "aes-128-ctr" => Some(Cipher::Aes128Ctr),
            "aes-256-ctr" => Some(Cipher::Aes256Ctr),
            _ => None,
        }
    }

    fn key_size(&self) -> usize {
        match self {
            Cipher::Aes128Ctr => 16,
            Cipher::Aes256Ctr => 32,
        }
    }

    fn apply(&self, key: &[u8], iv: &[u8], data: &mut [u8]) -> CoreResult<()> {
        let invalid = |_| CoreError::keystore("Invalid cipher key or IV length");
        match self {
            Cipher::Aes128Ctr => Aes128Ctr::new_from_slices(key, iv).map_err(invalid)?.apply_keystream(data),
            Cipher::Aes256Ctr => Aes256Ctr::new_from_slices(key, iv).map_err(invalid)?.apply_keystream(data),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherParams {
    #[serde(with = "hex_bytes")]
    pub iv: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kdf {
    Scrypt,
    Pbkdf2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParams {
    pub dklen: usize,
    pub n: u32,
    pub p: u32,
    pub r: u32,
    #[serde(with = "hex_bytes")]
    pub salt: Vec<u8>,
}

impl ScryptParams {
    pub fn for_level(level: EncryptionLevel) -> Self {
        let (n, p) = match level {
            EncryptionLevel::Light => (4096, 6),
            EncryptionLevel::Weak => (16384, 4),
            EncryptionLevel::Standard => (262_144, 1),
        };
        Self {
            dklen: DERIVED_KEY_SIZE,
            n,
            p,
            r: 8,
            salt: random_bytes(SALT_SIZE),
        }
    }
}

fn default_prf() -> String {
    PRF_HMAC_SHA256.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pbkdf2Params {
    pub c: u32,
    pub dklen: usize,
    #[serde(default = "default_prf")]
    pub prf: String,
    #[serde(with = "hex_bytes")]
    pub salt: Vec<u8>,
}

impl Default for Pbkdf2Params {
    fn default() -> Self {
        Self {
            c: PBKDF2_ITERATIONS,
            dklen: DERIVED_KEY_SIZE,
            prf: default_prf(),
            salt: random_bytes(SALT_SIZE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KdfParams {
    Scrypt(ScryptParams),
    Pbkdf2(Pbkdf2Params),
}

impl KdfParams {
    fn kdf(&self) -> Kdf {
        match self {
            KdfParams::Scrypt(_) => Kdf::Scrypt,
            KdfParams::Pbkdf2(_) => Kdf::Pbkdf2,
        }
    }

    /// Same function and cost with a fresh salt
    fn resalted(&self) -> Self {
        let salt = random_bytes(SALT_SIZE);
        match self {
            KdfParams::Scrypt(p) => KdfParams::Scrypt(ScryptParams { salt, ..p.clone() }),
            KdfParams::Pbkdf2(p) => KdfParams::Pbkdf2(Pbkdf2Params { salt, ..p.clone() }),
        }
    }

    fn derive_key(&self, password: &[u8]) -> CoreResult<Zeroizing<Vec<u8>>> {
        match self {
            KdfParams::Scrypt(p) => {
                check_dklen(p.dklen)?;
                if p.n < 2 || !p.n.is_power_of_two() {
                    return Err(CoreError::keystore(format!("Scrypt n must be a power of two, got {}", p.n)));
                }
                let params = scrypt::Params::new(p.n.trailing_zeros() as u8, p.r, p.p, p.dklen)
                    .map_err(|e| CoreError::keystore(format!("Invalid scrypt parameters: {}", e)))?;
                let mut key = Zeroizing::new(vec![0u8; p.dklen]);
                scrypt::scrypt(password, &p.salt, &params, &mut key)
                    .map_err(|e| CoreError::keystore(format!("Scrypt failed: {}", e)))?;
                Ok(key)
            }
            KdfParams::Pbkdf2(p) => {
                check_dklen(p.dklen)?;
                if p.prf != PRF_HMAC_SHA256 {
                    return Err(CoreError::keystore(format!("Unsupported PBKDF2 prf {}", p.prf)));
                }
                let mut key = Zeroizing::new(vec![0u8; p.dklen]);
                pbkdf2::pbkdf2::<Hmac<Sha256>>(password, &p.salt, p.c, &mut key)
                    .map_err(|e| CoreError::keystore(format!("PBKDF2 failed: {}", e)))?;
                Ok(key)
            }
        }
    }
}

fn check_dklen(dklen: usize) -> CoreResult<()> {
    if dklen < DERIVED_KEY_SIZE {
        return Err(CoreError::keystore(format!(
            "Derived key length must be at least {}, got {}",
            DERIVED_KEY_SIZE, dklen
        )));
    }
    Ok(())
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn mac(derived: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(16 + ciphertext.len());
    preimage.extend_from_slice(&derived[16..32]);
    preimage.extend_from_slice(ciphertext);
    keccak256(&preimage)
}

/// The `crypto` object of a Web3 Secret Storage file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub cipher: Cipher,
    pub cipherparams: CipherParams,
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
    pub kdf: Kdf,
    pub kdfparams: KdfParams,
    #[serde(with = "hex_bytes")]
    pub mac: Vec<u8>,
}

impl EncryptedPayload {
    pub fn encrypt(password: &[u8], data: &[u8], level: EncryptionLevel, cipher: Cipher) -> CoreResult<Self> {
        Self::encrypt_with(password, data, KdfParams::Scrypt(ScryptParams::for_level(level)), cipher)
    }

    pub fn encrypt_with(password: &[u8], data: &[u8], kdfparams: KdfParams, cipher: Cipher) -> CoreResult<Self> {
        let derived = kdfparams.derive_key(password)?;
        let iv = random_bytes(IV_SIZE);
        let mut ciphertext = data.to_vec();
        cipher.apply(&derived[..cipher.key_size()], &iv, &mut ciphertext)?;
        let mac = mac(&derived, &ciphertext).to_vec();
        log_debug!("keystore", "Encrypted payload", cipher = cipher.as_str(), size = data.len());
        Ok(Self {
            cipher,
            cipherparams: CipherParams { iv },
            ciphertext,
            kdf: kdfparams.kdf(),
            kdfparams,
            mac,
        })
    }

    /// Fails with `InvalidPassword` when the MAC does not match
    pub fn decrypt(&self, password: &[u8]) -> CoreResult<Zeroizing<Vec<u8>>> {
        if self.kdf != self.kdfparams.kdf() {
            return Err(CoreError::keystore("kdf does not match kdfparams"));
        }
        let derived = self.kdfparams.derive_key(password)?;
        let expected = mac(&derived, &self.ciphertext);
        if !bool::from(expected.as_slice().ct_eq(&self.mac)) {
            return Err(CoreError::invalid_password());
        }
        let mut plain = Zeroizing::new(self.ciphertext.clone());
        self.cipher
            .apply(&derived[..self.cipher.key_size()], &self.cipherparams.iv, &mut plain)?;
        Ok(plain)
    }

    /// Re-encrypt under a new password, keeping the cipher and KDF cost
    pub fn reencrypt(&self, old_password: &[u8], new_password: &[u8]) -> CoreResult<Self> {
        let plain = self.decrypt(old_password)?;
        Self::encrypt_with(new_password, &plain, self.kdfparams.resalted(), self.cipher)
    }
}
