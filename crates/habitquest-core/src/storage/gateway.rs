//! Load and save the application state document.
//!
//! Loading never fails. A missing document is an empty state. A document
//! that cannot be decoded is logged, copied aside under `<key>.corrupt`, and
//! replaced by an empty state. A store that cannot be read also yields an
//! empty state, but then saving is refused until a later load reads the key
//! again, so the unseen document is never overwritten. Saving reports errors
//! so the caller can surface them, but the in-memory state stays valid either
//! way.

use std::cell::Cell;

use super::kv::KeyValueStore;
use super::migrations::{migrate, MigrationContext};
use crate::clock::Clock;
use crate::error::{CoreError, StorageError};
use crate::habit::AppData;

/// Key the state document is stored under.
pub const STORAGE_KEY: &str = "habit-tracker-data";

/// Versioned document codec on top of a [`KeyValueStore`].
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    key: String,
    /// The last load could not read the key.
    read_failed: Cell<bool>,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            read_failed: Cell::new(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether saving is blocked because the last load could not read.
    pub fn is_read_blocked(&self) -> bool {
        self.read_failed.get()
    }

    /// Load the stored state, migrating older shapes.
    pub fn load(&self, clock: &impl Clock) -> AppData {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.read_failed.set(false);
                return AppData::empty();
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read habit data, starting empty");
                self.read_failed.set(true);
                return AppData::empty();
            }
        };
        self.read_failed.set(false);

        match decode(&raw, &MigrationContext::from_clock(clock)) {
            Ok(data) => {
                tracing::debug!(habits = data.habits.len(), "habit data loaded");
                data
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored habit data is corrupt, starting empty");
                self.quarantine(&raw);
                AppData::empty()
            }
        }
    }

    /// Write `data` as the current document.
    ///
    /// # Errors
    /// Returns an error if the last load could not read the key, or if the
    /// document cannot be encoded or written.
    pub fn save(&self, data: &AppData) -> Result<(), StorageError> {
        if self.read_failed.get() {
            return Err(StorageError::ReadBlocked {
                key: self.key.clone(),
            });
        }
        let blob = encode(data).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.store.set(&self.key, &blob)
    }

    fn quarantine(&self, raw: &str) {
        let key = format!("{}.corrupt", self.key);
        if let Err(e) = self.store.set(&key, raw) {
            tracing::warn!(error = %e, "could not keep a copy of corrupt habit data");
        }
    }
}

/// Parse and migrate a stored document.
///
/// # Errors
/// Returns an error if the text is not JSON, is not an object, or does not
/// match the current schema after migration.
pub fn decode(raw: &str, ctx: &MigrationContext) -> Result<AppData, CoreError> {
    let doc: serde_json::Value = serde_json::from_str(raw)?;
    let doc = migrate(doc, ctx)?;
    Ok(serde_json::from_value(doc)?)
}

/// Serialize `data` as a stored document.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode(data: &AppData) -> Result<String, CoreError> {
    Ok(serde_json::to_string(data)?)
}
