//! Structured logging with secret redaction
//!
//! Every line goes to stderr as
//! `[timestamp] LEVEL [module] message | key=value ...`.
//! Values are redacted by key name: key material, mnemonics and passwords
//! never reach the log, addresses and hashes are shortened.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

static MIN_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Drop entries below `level`
pub fn set_min_level(level: LogLevel) {
    MIN_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn enabled(level: LogLevel) -> bool {
    level as u8 >= MIN_LEVEL.load(Ordering::Relaxed)
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Keys whose values are never printed
const SECRET_KEYS: &[&str] = &[
    "private_key", "privatekey", "secret", "seed", "mnemonic", "password",
    "passphrase", "wif", "xprv", "extended_private", "signing_key", "entropy",
    "derived_key",
];

/// Keys holding addresses (partially shown)
const ADDRESS_KEYS: &[&str] = &["address", "recipient", "sender", "from", "to", "destination"];

/// Keys holding hashes (shortened)
const HASH_KEYS: &[&str] = &["txid", "tx_hash", "hash", "block", "genesis"];

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, redacting it according to its key
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let redacted = redact_if_sensitive(key, &value.to_string());
        self.fields.push((key, redacted));
        self
    }

    /// Render the line without the timestamp
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            line.push_str(" | ");
            line.push_str(&fields);
        }
        line
    }

    pub fn log(self) {
        if enabled(self.level) {
            eprintln!("[{}] {}", chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true), self.render());
        }
    }
}

fn key_matches(key: &str, list: &[&str]) -> bool {
    list.iter().any(|candidate| key.contains(candidate))
}

fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    if key_matches(&key_lower, SECRET_KEYS) {
        return redact_value(value);
    }
    if key_matches(&key_lower, ADDRESS_KEYS) {
        return redact_address(value);
    }
    if key_matches(&key_lower, HASH_KEYS) {
        return redact_hash(value);
    }
    value.to_string()
}

fn redact_value(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        len => format!("[REDACTED:{}chars]", len),
    }
}

/// Show the first 6 (8 with `0x`) and last 4 characters
fn redact_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 8 } else { 6 };
    let suffix_len = 4;
    if !trimmed.is_ascii() || trimmed.len() <= prefix_len + suffix_len + 3 {
        return redact_value(trimmed);
    }

    format!(
        "{}...{}",
        &trimmed[..prefix_len],
        &trimmed[trimmed.len() - suffix_len..]
    )
}

/// Show the first 10 (12 with `0x`) and last 6 characters
fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if trimmed.len() <= 20 || !trimmed.is_ascii() {
        return trimmed.to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 12 } else { 10 };
    format!("{}...{}", &trimmed[..prefix_len], &trimmed[trimmed.len() - 6..])
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_entry {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)*) => {
        $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::$level, $module, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
    };
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_entry!(Debug, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_entry!(Info, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_entry!(Warn, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_entry!(Error, $module, $msg $(, $key = $value)*)
    };
}
