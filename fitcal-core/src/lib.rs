//! FitCal Core Library
//!
//! Owns the daily activity ledger: the current day's record, the bounded
//! history of past days, their persistence, and the day-rollover engine.

pub mod clock;
pub mod error;
pub mod ledger;
pub mod models;
pub mod storage;
pub mod validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::LedgerError;
pub use ledger::{
    Applied, Ledger, LedgerHandle, LedgerOptions, RolloverOutcome, RolloverScheduler,
    DEFAULT_CHECK_INTERVAL,
};
pub use models::{
    DayPatch, DayRecord, HistoryLog, MealEntry, MealType, WorkoutEntry, DEFAULT_CALORIE_TARGET,
    DEFAULT_WATER_TARGET, HISTORY_CAPACITY,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StoreLock};
pub use validate::ValidationError;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
