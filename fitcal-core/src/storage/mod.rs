//! Key-value persistence for the ledger.
//!
//! Stores know nothing about records; they move opaque strings under string
//! keys. Each ledger operation holds the store's lock while it reads and
//! writes, so ledgers in separate processes see each other's changes.

mod file;
mod memory;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Durable string key-value store.
pub trait KeyValueStore: Send {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;

    /// Blocks until the caller is the only writer, across processes.
    ///
    /// Stores that cannot be shared between processes need no lock.
    fn lock(&self) -> Result<StoreLock, StorageError> {
        Ok(StoreLock::unshared())
    }
}

/// Exclusive hold on a store, released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: Option<File>,
}

impl StoreLock {
    pub fn unshared() -> Self {
        Self { file: None }
    }

    fn held(file: File) -> Self {
        Self { file: Some(file) }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    #[error("I/O error for {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] io::Error),

    /// Key is empty or cannot be mapped to a storage location.
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    /// Value could not be encoded for storage.
    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    /// Backend refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
