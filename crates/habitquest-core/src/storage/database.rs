//! SQLite-backed key-value storage.
//!
//! The whole application state lives in a single row of the `kv` table; the
//! table leaves room for other documents (e.g. the quarantined copy of a
//! corrupt state blob).

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::kv::KeyValueStore;
use crate::error::StorageError;

/// SQLite database holding the `kv` table.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/habitquest/habitquest.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::OpenFailed {
            path: ".".into(),
            message: e.to_string(),
        })?;
        Self::open_at(dir.join("habitquest.db"))
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| StorageError::OpenFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::with_connection(conn, path)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::OpenFailed {
            path: ":memory:".into(),
            message: e.to_string(),
        })?;
        Self::with_connection(conn, Path::new(":memory:"))
    }

    fn with_connection(conn: Connection, path: &Path) -> Result<Self, StorageError> {
        let db = Self { conn };
        db.migrate().map_err(|e| StorageError::OpenFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn is_locked(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::DatabaseBusy
                || code.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.kv_get(key).map_err(|e| {
            if is_locked(&e) {
                StorageError::Locked
            } else {
                StorageError::ReadFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.kv_set(key, value).map_err(|e| {
            if is_locked(&e) {
                StorageError::Locked
            } else {
                StorageError::WriteFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}
