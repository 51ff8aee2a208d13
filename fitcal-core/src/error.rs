//! Ledger error types.

use thiserror::Error;

use crate::storage::StorageError;
use crate::validate::ValidationError;

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input rejected before any state changed.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The backing store could not be read or written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// A persisted value did not decode into a valid record.
    #[error("Corrupt record at '{key}': {reason}")]
    CorruptRecord { key: String, reason: String },
}

impl LedgerError {
    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        LedgerError::CorruptRecord {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
