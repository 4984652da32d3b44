//! Engine configuration
//!
//! Settings presets (standard, light), JSON file loading and environment
//! overrides. A single process-wide instance is held behind an `RwLock`.

use super::logging::LogLevel;
use crate::error::{CoreError, CoreResult};
use crate::keystore::{Cipher, EncryptionLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;

lazy_static::lazy_static! {
    static ref GLOBAL: RwLock<CoreConfig> = RwLock::new(CoreConfig::default());
}

/// What the UTXO planner does with change below the dust threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DustPolicy {
    AddToFee,
    KeepChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub kdf_preset: EncryptionLevel,
    pub default_cipher: Cipher,
    pub debug_logging: bool,
    /// Upper bound on accepted mnemonic length
    pub max_mnemonic_words: usize,
    pub dust_policy: DustPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl CoreConfig {
    pub fn standard() -> Self {
        Self {
            kdf_preset: EncryptionLevel::Standard,
            default_cipher: Cipher::Aes128Ctr,
            debug_logging: false,
            max_mnemonic_words: 24,
            dust_policy: DustPolicy::AddToFee,
        }
    }

    /// Cheap KDF for tests and constrained devices
    pub fn light() -> Self {
        Self {
            kdf_preset: EncryptionLevel::Light,
            ..Self::standard()
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::invalid_input(format!("Cannot read config {}", path.display()))
                .with_details(e.to_string())
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> CoreResult<Self> {
        let config: CoreConfig = serde_json::from_str(raw)?;
        if config.max_mnemonic_words < 12 || config.max_mnemonic_words % 3 != 0 {
            return Err(CoreError::invalid_input(format!(
                "max_mnemonic_words must be a multiple of 3 and at least 12, got {}",
                config.max_mnemonic_words
            )));
        }
        Ok(config)
    }

    /// Apply `MULTICOIN_DEBUG` and `MULTICOIN_KDF` on top of these settings
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var("MULTICOIN_DEBUG").ok().as_deref(),
            std::env::var("MULTICOIN_KDF").ok().as_deref(),
        )
    }

    fn with_overrides(mut self, debug: Option<&str>, kdf: Option<&str>) -> Self {
        if let Some(value) = debug {
            self.debug_logging = matches!(value, "1" | "true" | "yes");
        }
        match kdf {
            Some("light") => self.kdf_preset = EncryptionLevel::Light,
            Some("weak") => self.kdf_preset = EncryptionLevel::Weak,
            Some("standard") => self.kdf_preset = EncryptionLevel::Standard,
            _ => {}
        }
        self
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.kdf_preset == EncryptionLevel::Light {
            warnings.push(
                "Warning: light scrypt parameters make keystores cheaper to brute force".to_string(),
            );
        }

        if self.debug_logging {
            warnings.push("Warning: debug logging is enabled".to_string());
        }

        if self.dust_policy == DustPolicy::KeepChange {
            warnings.push(
                "Warning: dust change outputs may be rejected by relay policy".to_string(),
            );
        }

        warnings
    }

    /// Push logging settings into the logger
    pub fn apply(&self) {
        super::logging::set_min_level(if self.debug_logging {
            LogLevel::Debug
        } else {
            LogLevel::Info
        });
    }
}

pub fn global() -> CoreConfig {
    GLOBAL
        .read()
        .map(|c| c.clone())
        .unwrap_or_else(|_| CoreConfig::standard())
}

pub fn set_global(config: CoreConfig) -> Vec<String> {
    let warnings = config.validate();
    config.apply();
    if let Ok(mut current) = GLOBAL.write() {
        *current = config;
    }
    warnings
}
