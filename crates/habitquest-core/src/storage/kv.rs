//! Key-value capability the persistence gateway runs on.
//!
//! The gateway only needs to read and write one string blob per key, so any
//! backend that can do that will do: the SQLite [`Database`](super::Database),
//! a directory of JSON files, or an in-process map.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// String blobs addressed by key.
pub trait KeyValueStore {
    /// Read the value for `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite the value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    read_only: bool,
    failing_reads: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, for exercising save errors.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Make every read fail until switched back, for exercising load errors.
    pub fn fail_reads(&self, failing: bool) {
        self.failing_reads.set(failing);
    }

    /// Seed a value, bypassing the read-only flag.
    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.failing_reads.get() {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                message: "store is unreadable".to_string(),
            });
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                message: "store is read-only".to_string(),
            });
        }
        self.insert(key, value);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Use `dir`, creating it when missing.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::OpenFailed {
            path: dir.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Write beside the target and rename so a crash never leaves half a file.
        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");
        let write_failed = |e: std::io::Error| StorageError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        };
        std::fs::write(&staging, value).map_err(write_failed)?;
        std::fs::rename(&staging, &target).map_err(write_failed)?;
        Ok(())
    }
}
