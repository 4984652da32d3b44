//! Key Derivation Path Parsing and Validation
//!
//! Parses BIP-32/44/49/84 derivation paths and checks them against the
//! conventions of a coin:
//! - Correct format and syntax
//! - Coin-appropriate purpose and coin type
//! - Warnings for unusual paths

use crate::coin::CoinType;
use crate::crypto::CurveType;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Standard BIP purposes
pub mod bip_purposes {
    pub const BIP44: u32 = 44; // Legacy (P2PKH)
    pub const BIP49: u32 = 49; // SegWit compatible (P2SH-P2WPKH)
    pub const BIP84: u32 = 84; // Native SegWit (P2WPKH)
}

/// SLIP-44 coin type shared by every testnet
pub const TESTNET_COIN_TYPE: u32 = 1;

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Single component of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    /// Get the full index including hardened bit
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }

    pub fn from_full_index(value: u32) -> Self {
        Self::new(value & !HARDENED, value & HARDENED != 0)
    }
}

impl fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Parsed derivation path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    components: Vec<DerivationComponent>,
}

impl DerivationPath {
    pub fn new(components: Vec<DerivationComponent>) -> Self {
        Self { components }
    }

    /// Build from full indices (hardened bit included)
    pub fn from_indices(indices: &[u32]) -> Self {
        Self::new(indices.iter().map(|i| DerivationComponent::from_full_index(*i)).collect())
    }

    /// `m/purpose'/coin'/account'/change/address`
    pub fn bip44(purpose: u32, coin: u32, account: u32, change: u32, address: u32) -> Self {
        Self::new(vec![
            DerivationComponent::new(purpose, true),
            DerivationComponent::new(coin, true),
            DerivationComponent::new(account, true),
            DerivationComponent::new(change, false),
            DerivationComponent::new(address, false),
        ])
    }

    pub fn parse(path: &str) -> CoreResult<Self> {
        parse_path(path).map_err(|e| CoreError::invalid_path(format!("'{}': {}", path.trim(), e)))
    }

    pub fn components(&self) -> &[DerivationComponent] {
        &self.components
    }

    pub fn indices(&self) -> Vec<u32> {
        self.components.iter().map(|c| c.full_index()).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn purpose(&self) -> Option<u32> {
        self.components.first().map(|c| c.index)
    }

    pub fn coin(&self) -> Option<u32> {
        self.components.get(1).map(|c| c.index)
    }

    pub fn account(&self) -> Option<u32> {
        self.components.get(2).map(|c| c.index)
    }

    pub fn change(&self) -> Option<u32> {
        self.components.get(3).map(|c| c.index)
    }

    pub fn address(&self) -> Option<u32> {
        self.components.get(4).map(|c| c.index)
    }

    pub fn is_fully_hardened(&self) -> bool {
        self.components.iter().all(|c| c.hardened)
    }

    /// Path with the first `n` components
    pub fn prefix(&self, n: usize) -> Self {
        Self::new(self.components.iter().take(n).copied().collect())
    }

    /// Components after the first `n`
    pub fn suffix(&self, n: usize) -> &[DerivationComponent] {
        self.components.get(n..).unwrap_or(&[])
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DerivationPath::parse(s)
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DerivationPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Derivation path validation result
#[derive(Debug, Clone, Serialize)]
pub struct PathValidation {
    pub is_valid: bool,
    #[serde(skip)]
    pub path: Option<DerivationPath>,
    pub normalized: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Parse and validate a derivation path string
pub fn validate_derivation_path(path: &str, coin: CoinType) -> PathValidation {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let parsed = match parse_path(path) {
        Ok(p) => p,
        Err(e) => {
            return PathValidation {
                is_valid: false,
                path: None,
                normalized: None,
                warnings: vec![],
                errors: vec![e],
            };
        }
    };

    if let Some(purpose) = parsed.purpose() {
        match purpose {
            bip_purposes::BIP44 => {
                if coin == CoinType::Bitcoin {
                    warnings.push("BIP44 creates legacy addresses - consider BIP84 (SegWit) for lower fees".to_string());
                }
            }
            bip_purposes::BIP49 | bip_purposes::BIP84 => {
                if !matches!(coin, CoinType::Bitcoin | CoinType::Litecoin) {
                    warnings.push(format!("BIP{} is not standard for {}", purpose, coin.symbol()));
                }
            }
            _ => {
                warnings.push(format!("Non-standard purpose: {}. Standard purposes are 44, 49, 84", purpose));
            }
        }
    }

    if let Some(coin_type) = parsed.coin() {
        let expected = expected_coin_type(coin);
        if coin_type == TESTNET_COIN_TYPE && expected != TESTNET_COIN_TYPE {
            if coin.derivations().contains(&crate::coin::Derivation::Testnet) {
                warnings.push("Testnet coin type: addresses are for test networks only".to_string());
            } else {
                errors.push("Using testnet coin type on mainnet - funds may be lost!".to_string());
            }
        } else if coin_type != expected {
            warnings.push(format!(
                "Coin type {} is not standard for {} (expected {})",
                coin_type,
                coin.symbol(),
                expected
            ));
        }
    }

    if let Some(account) = parsed.account() {
        if account > 100 {
            warnings.push(format!("Unusual account number: {}. Most wallets use 0", account));
        }
    }

    if coin.curve() == CurveType::Ed25519 {
        if !parsed.is_fully_hardened() {
            errors.push(format!("{} keys only support hardened derivation", coin.curve()));
        }
    } else {
        if let Some(change) = parsed.change() {
            if change > 1 {
                warnings.push(format!(
                    "Non-standard change value: {}. Should be 0 (external) or 1 (internal/change)",
                    change
                ));
            }
        }
        let has_unhardened_before_account =
            parsed.len() >= 3 && parsed.components.iter().take(3).any(|c| !c.hardened);
        if has_unhardened_before_account {
            warnings.push("Purpose, coin type, and account should be hardened (')".to_string());
        }
    }

    if let Some(index) = parsed.address() {
        if index > 10000 {
            warnings.push(format!("Very high address index: {}. This may indicate a problem", index));
        }
    }

    let normalized = parsed.to_string();

    PathValidation {
        is_valid: errors.is_empty(),
        path: Some(parsed),
        normalized: Some(normalized),
        warnings,
        errors,
    }
}

fn parse_path(path: &str) -> Result<DerivationPath, String> {
    let trimmed = path.trim();

    let path_part = match trimmed {
        "m" | "M" => return Ok(DerivationPath::new(Vec::new())),
        _ if trimmed.starts_with("m/") || trimmed.starts_with("M/") => &trimmed[2..],
        _ => return Err("Derivation path must start with 'm/'".to_string()),
    };
    if path_part.is_empty() {
        return Err("Empty derivation path".to_string());
    }

    let components = path_part
        .split('/')
        .map(parse_component)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DerivationPath::new(components))
}

fn parse_component(s: &str) -> Result<DerivationComponent, String> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err("Empty path component".to_string());
    }

    let (number_str, hardened) = match trimmed.strip_suffix(['\'', 'h', 'H']) {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };

    if !number_str.bytes().all(|b| b.is_ascii_digit()) || number_str.is_empty() {
        return Err(format!("Invalid path component '{}'", s));
    }
    let index: u32 = number_str
        .parse()
        .map_err(|e| format!("Invalid path component '{}': {}", s, e))?;

    // Overflow check before the hardened bit is applied
    if index >= HARDENED {
        return Err(format!("Path component {} exceeds maximum value", index));
    }

    Ok(DerivationComponent::new(index, hardened))
}

fn expected_coin_type(coin: CoinType) -> u32 {
    coin.derivation_path(crate::coin::Derivation::Default)
        .coin()
        .unwrap_or_else(|| coin.slip44())
}

/// Standard path for a coin with the account, change and index substituted
///
/// Coins whose default path is shorter than five levels keep their shape:
/// the account is substituted into the third level.
pub fn get_standard_path(coin: CoinType, account: u32, change: u32, index: u32) -> DerivationPath {
    let default = coin.derivation_path(crate::coin::Derivation::Default);
    let mut components = default.components().to_vec();
    let values = [account, change, index];
    for (slot, value) in components.iter_mut().skip(2).zip(values) {
        slot.index = value;
    }
    DerivationPath::new(components)
}

/// Require valid derivation path
pub fn require_valid_path(path: &str, coin: CoinType) -> CoreResult<DerivationPath> {
    let validation = validate_derivation_path(path, coin);

    if !validation.is_valid {
        let errors = validation.errors.join("; ");
        return Err(CoreError::invalid_path(format!(
            "Invalid derivation path '{}': {}",
            path, errors
        )));
    }

    validation
        .path
        .ok_or_else(|| CoreError::internal("Path validation succeeded but path is None"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_path() {
        let result = validate_derivation_path("m/84'/0'/0'/0/0", CoinType::Bitcoin);
        assert!(result.is_valid);

        let path = result.path.unwrap();
        assert_eq!(path.purpose(), Some(84));
        assert_eq!(path.coin(), Some(0));
        assert_eq!(path.account(), Some(0));
        assert_eq!(path.change(), Some(0));
        assert_eq!(path.address(), Some(0));
        assert_eq!(path.indices(), vec![84 | HARDENED, HARDENED, HARDENED, 0, 0]);
    }

    #[test]
    fn test_hardened_markers() {
        let a = DerivationPath::parse("m/44h/60H/0'/0/1").unwrap();
        assert_eq!(a.to_string(), "m/44'/60'/0'/0/1");
        assert_eq!("m/44'/60'/0'/0/1".parse::<DerivationPath>().unwrap(), a);
        assert_eq!(DerivationPath::parse("m").unwrap().len(), 0);
    }

    #[test]
    fn test_index_overflow_rejected() {
        assert!(DerivationPath::parse("m/2147483647'").is_ok());
        assert!(DerivationPath::parse("m/2147483648").is_err());
        assert!(DerivationPath::parse("m/-1").is_err());
        assert!(DerivationPath::parse("m/+1").is_err());
    }

    #[test]
    fn test_wrong_coin_type_warning() {
        let result = validate_derivation_path("m/44'/60'/0'/0/0", CoinType::Bitcoin);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("not standard")));
    }

    #[test]
    fn test_testnet_coin_type() {
        let result = validate_derivation_path("m/84'/1'/0'/0/0", CoinType::Litecoin);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("testnet")));

        let result = validate_derivation_path("m/84'/1'/0'/0/0", CoinType::Bitcoin);
        assert!(result.is_valid);
    }

    #[test]
    fn test_unhardened_warning() {
        let result = validate_derivation_path("m/84/0'/0'/0/0", CoinType::Bitcoin);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("hardened")));
    }

    #[test]
    fn test_ed25519_requires_hardened() {
        assert!(validate_derivation_path("m/44'/501'/0'", CoinType::Solana).is_valid);
        let result = validate_derivation_path("m/44'/501'/0'/0", CoinType::Solana);
        assert!(!result.is_valid);
        assert!(require_valid_path("m/44'/501'/0'/0", CoinType::Solana).is_err());
    }

    #[test]
    fn test_get_standard_path() {
        assert_eq!(get_standard_path(CoinType::Bitcoin, 0, 0, 0).to_string(), "m/84'/0'/0'/0/0");
        assert_eq!(get_standard_path(CoinType::Ethereum, 1, 0, 5).to_string(), "m/44'/60'/1'/0/5");
        assert_eq!(get_standard_path(CoinType::Solana, 2, 0, 0).to_string(), "m/44'/501'/2'");
    }

    #[test]
    fn test_invalid_paths() {
        assert!(!validate_derivation_path("84'/0'/0'/0/0", CoinType::Bitcoin).is_valid);
        assert!(!validate_derivation_path("m/84'/abc/0'/0/0", CoinType::Bitcoin).is_valid);
        assert!(!validate_derivation_path("m//0", CoinType::Bitcoin).is_valid);
    }

    #[test]
    fn test_path_display() {
        let result = validate_derivation_path("m/84'/0'/0'/0/0", CoinType::Bitcoin);
        assert_eq!(result.normalized, Some("m/84'/0'/0'/0/0".to_string()));
    }
}
