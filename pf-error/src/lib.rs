//! Unified error handling for pifan
//!
//! This crate provides a single error type used across all pifan components.
//! It uses thiserror for ergonomic error definitions with proper Display and Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using PifanError
pub type Result<T> = std::result::Result<T, PifanError>;

/// Unified error type for all pifan operations
#[derive(thiserror::Error, Debug)]
pub enum PifanError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Hardware Access Errors
    // ============================================================================
    #[error("Failed to read temperature from {path}: {reason}")]
    TemperatureRead {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to write PWM to {path}: {reason}")]
    PwmWrite {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to set up PWM channel {channel} on {chip}: {reason}")]
    PwmSetup {
        chip: PathBuf,
        channel: u32,
        reason: String,
    },

    #[error("GPIO {pin} error: {reason}")]
    Gpio {
        pin: u32,
        reason: String,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    #[error("Speed table validation failed: {0}")]
    InvalidTable(String),

    // ============================================================================
    // Validation Errors
    // ============================================================================
    #[error("Invalid percentage: {value} (must be 0-100)")]
    InvalidPercentage {
        value: i32,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl PifanError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid config error for a named field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a GPIO error for a pin
    pub fn gpio(pin: u32, reason: impl Into<String>) -> Self {
        Self::Gpio {
            pin,
            reason: reason.into(),
        }
    }
}

// Allow converting from String to PifanError
impl From<String> for PifanError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to PifanError
impl From<&str> for PifanError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}
