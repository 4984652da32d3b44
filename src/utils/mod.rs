//! Utilities Module
//!
//! Logging and engine configuration shared across the crate.

pub mod config;
pub mod logging;
