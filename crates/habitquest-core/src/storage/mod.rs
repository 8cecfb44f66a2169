mod config;
pub mod database;
pub mod gateway;
pub mod kv;
pub mod migrations;

pub use config::{ClockConfig, Config, HabitsConfig, StorageBackend, StorageConfig};
pub use database::Database;
pub use gateway::{Persistence, STORAGE_KEY};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/habitquest[-dev]/` based on HABITQUEST_ENV.
///
/// Set HABITQUEST_ENV=dev to use development data directory, or
/// HABITQUEST_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HABITQUEST_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("HABITQUEST_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("habitquest-dev")
            } else {
                base_dir.join("habitquest")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
