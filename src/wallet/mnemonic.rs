//! BIP-39 Mnemonics
//!
//! Generation, validation, word suggestions and seed computation over the
//! English word list.
//!
//! SECURITY: Entropy and seeds are returned in `Zeroizing` wrappers.

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::utils::config;

/// Allowed entropy sizes in bits
pub const STRENGTHS: [u32; 5] = [128, 160, 192, 224, 256];

const MAX_SUGGESTIONS: usize = 10;

/// Collapse whitespace and apply NFKD
pub fn normalize(phrase: &str) -> String {
    phrase
        .nfkd()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse(phrase: &str) -> CoreResult<Mnemonic> {
    let normalized = Zeroizing::new(normalize(phrase));
    let words = normalized.split(' ').count();
    let max_words = config::global().max_mnemonic_words;
    if words > max_words {
        return Err(CoreError::new(
            ErrorCode::InvalidMnemonic,
            format!("Mnemonic has {} words, limit is {}", words, max_words),
        ));
    }
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| CoreError::new(ErrorCode::InvalidMnemonic, format!("Invalid mnemonic: {}", e)))
}

/// Generate a new phrase with `strength` bits of entropy
pub fn generate(strength: u32) -> CoreResult<Zeroizing<String>> {
    if !STRENGTHS.contains(&strength) {
        return Err(CoreError::invalid_input(format!(
            "Strength must be one of {:?} bits, got {}",
            STRENGTHS, strength
        )));
    }
    let mut entropy = Zeroizing::new(vec![0u8; (strength / 8) as usize]);
    OsRng.fill_bytes(entropy.as_mut());
    from_entropy(&entropy)
}

pub fn from_entropy(entropy: &[u8]) -> CoreResult<Zeroizing<String>> {
    let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy)
        .map_err(|e| CoreError::invalid_input(format!("Invalid entropy: {}", e)))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

pub fn to_entropy(phrase: &str) -> CoreResult<Zeroizing<Vec<u8>>> {
    Ok(Zeroizing::new(parse(phrase)?.to_entropy()))
}

pub fn is_valid(phrase: &str) -> bool {
    parse(phrase).is_ok()
}

pub fn is_valid_word(word: &str) -> bool {
    Language::English.find_word(&word.trim().to_lowercase()).is_some()
}

/// Words starting with `prefix`, space separated, at most ten
pub fn suggest(prefix: &str) -> String {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return String::new();
    }
    Language::English
        .word_list()
        .iter()
        .filter(|w| w.starts_with(prefix.as_str()))
        .take(MAX_SUGGESTIONS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// BIP-39 seed (PBKDF2-HMAC-SHA512, 2048 rounds)
pub fn to_seed(phrase: &str, passphrase: &str) -> CoreResult<Zeroizing<[u8; 64]>> {
    let mnemonic = parse(phrase)?;
    let passphrase = Zeroizing::new(passphrase.nfkd().collect::<String>());
    Ok(Zeroizing::new(mnemonic.to_seed_normalized(&passphrase)))
}
