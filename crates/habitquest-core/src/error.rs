//! Core error types for habitquest-core.
//!
//! State transitions in this crate are total and never fail. Errors only
//! appear at the seams: parsing user input, reading configuration and
//! talking to the key-value store.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitquest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// Read failed
    #[error("Failed to read key '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Write failed
    #[error("Failed to write key '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Document could not be encoded
    #[error("Failed to encode document: {0}")]
    Encode(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The stored document could not be read, so it must not be overwritten
    #[error("Refusing to overwrite '{key}': it could not be read on load")]
    ReadBlocked { key: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a `YYYY-MM-DD` calendar date
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Not a `YYYY-MM` calendar month
    #[error("Invalid month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    /// Not a known badge identifier
    #[error("Unknown badge '{0}'")]
    UnknownBadge(String),

    /// Not an `HH:MM` wall-clock time
    #[error("Invalid reminder time '{0}': expected HH:MM")]
    InvalidReminderTime(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}
