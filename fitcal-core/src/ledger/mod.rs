//! The daily ledger: current day, history, persistence and rollover.
//!
//! # Persisted layout
//!
//! - `day-record:{YYYY-MM-DD}`: the [`DayRecord`] for that date
//! - `current-day`: date of the record last treated as current
//! - `history-log`: archived days, newest first
//!
//! Every mutation computes a whole new record, persists it, then publishes it
//! to subscribers. A failed write keeps the in-memory change and is reported
//! through [`Applied::storage_error`].
//!
//! Each operation holds the store lock and first reloads what other ledgers on
//! the same store wrote, so a long-running session never acts on a stale day.

mod handle;
mod rollover;
mod scheduler;

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::clock::Clock;
use crate::error::LedgerError;
use crate::models::{
    DayPatch, DayRecord, HistoryLog, MealEntry, MealType, WorkoutEntry, HISTORY_CAPACITY,
};
use crate::storage::{KeyValueStore, StorageError, StoreLock};
use crate::validate;

pub use handle::LedgerHandle;
pub use rollover::RolloverOutcome;
pub use scheduler::RolloverScheduler;

pub const HISTORY_KEY: &str = "history-log";
pub const CURRENT_DAY_KEY: &str = "current-day";

/// How often the scheduler looks for a date change.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Storage key for one day's record.
pub fn day_key(date: NaiveDate) -> String {
    format!("day-record:{}", date)
}

#[derive(Debug, Clone)]
pub struct LedgerOptions {
    /// Archived days kept, at most [`HISTORY_CAPACITY`].
    pub history_capacity: usize,
    pub check_interval: Duration,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

/// Result of a mutation that was applied in memory.
///
/// `storage_error` is set when the change, or history archived along with it,
/// could not be written. The ledger keeps running on its in-memory state until
/// a later write succeeds.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub storage_error: Option<StorageError>,
}

impl<T> Applied<T> {
    fn durable(value: T) -> Self {
        Self {
            value,
            storage_error: None,
        }
    }

    pub fn is_durable(&self) -> bool {
        self.storage_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Sole owner of the current day and the history log.
pub struct Ledger {
    store: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    options: LedgerOptions,
    current: DayRecord,
    /// The current record has changes the store does not.
    current_dirty: bool,
    history: HistoryLog,
    history_dirty: bool,
    /// False until the persisted history has been read once. Until then
    /// archived days are held in memory and never written over it.
    history_synced: bool,
    degraded: bool,
    updates: watch::Sender<DayRecord>,
}

impl Ledger {
    /// Loads persisted state and runs the rollover check.
    ///
    /// Never fails: unreadable or corrupt state is logged and replaced with an
    /// empty day for today.
    pub fn open(
        store: impl KeyValueStore + 'static,
        clock: impl Clock + 'static,
        options: LedgerOptions,
    ) -> Self {
        let store: Box<dyn KeyValueStore> = Box::new(store);
        let clock: Arc<dyn Clock> = Arc::new(clock);
        let options = LedgerOptions {
            history_capacity: options.history_capacity.clamp(1, HISTORY_CAPACITY),
            ..options
        };
        let today = clock.today();
        let _lock = lock_store(store.as_ref());
        let mut degraded = false;
        let mut history_synced = true;

        let mut history = match load_history(store.as_ref()) {
            Ok(history) => history,
            Err(LedgerError::StorageUnavailable(e)) => {
                tracing::warn!("Failed to read history, holding new days in memory: {}", e);
                degraded = true;
                history_synced = false;
                HistoryLog::new()
            }
            Err(e) => {
                tracing::info!("Discarding history: {}", e);
                HistoryLog::new()
            }
        };
        let trimmed = history.truncate(options.history_capacity);

        let mut discard = Vec::new();
        let mut unreadable = false;
        let pointer = match read_pointer(store.as_ref()) {
            Ok(pointer) => pointer,
            Err(LedgerError::CorruptRecord { key, reason }) => {
                tracing::info!("Discarding corrupt record '{}': {}", key, reason);
                discard.push(key);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read current-day pointer: {}", e);
                degraded = true;
                None
            }
        };
        let loaded = match load_record(store.as_ref(), pointer.unwrap_or(today)) {
            Ok(record) => record,
            Err(LedgerError::CorruptRecord { key, reason }) => {
                tracing::info!("Discarding corrupt record '{}': {}", key, reason);
                discard.push(key);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read current day, starting fresh: {}", e);
                degraded = true;
                unreadable = true;
                None
            }
        };
        let fresh = loaded.is_none() && !unreadable;
        let current = loaded.unwrap_or_else(|| DayRecord::empty(today));

        let (updates, _) = watch::channel(current.clone());
        let mut ledger = Self {
            store,
            clock,
            options,
            current,
            current_dirty: false,
            history,
            history_dirty: !trimmed.is_empty(),
            history_synced,
            degraded,
            updates,
        };

        for key in discard {
            if let Err(e) = ledger.store.delete(&key) {
                tracing::warn!("Failed to delete corrupt record '{}': {}", key, e);
            }
        }

        let outcome = ledger.roll_over();
        if fresh && outcome == RolloverOutcome::Unchanged {
            ledger.flush_current();
        }
        if ledger.history_dirty {
            ledger.flush_history();
        }

        tracing::debug!(
            "Ledger open for {} with {} archived day(s)",
            ledger.current.date,
            ledger.history.len()
        );
        ledger
    }

    /// Snapshot of today's record.
    pub fn current_day(&self) -> DayRecord {
        self.current.clone()
    }

    /// Archived days, newest first.
    pub fn history(&self) -> Vec<DayRecord> {
        self.history.days().to_vec()
    }

    pub fn options(&self) -> &LedgerOptions {
        &self.options
    }

    /// True while some state could not be read or written.
    pub fn is_degraded(&self) -> bool {
        self.degraded || self.current_dirty || self.history_dirty || !self.history_synced
    }

    /// Receiver that always holds the latest current-day snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DayRecord> {
        self.updates.subscribe()
    }

    pub fn add_workout(
        &mut self,
        kind: &str,
        duration_minutes: u32,
        calories: u32,
    ) -> Result<Applied<DayRecord>, LedgerError> {
        let kind = validate::check_name("workout type", kind)?;
        let duration_minutes = validate::check_positive("duration", duration_minutes)?;

        let _lock = lock_store(self.store.as_ref());
        self.catch_up();
        let entry = WorkoutEntry {
            kind,
            duration_minutes,
            calories,
            logged_at: self.clock.now(),
        };
        let next = self.current.with_workout(entry)?;
        Ok(self.commit(next))
    }

    pub fn add_meal(
        &mut self,
        name: &str,
        calories: u32,
        meal_type: MealType,
    ) -> Result<Applied<DayRecord>, LedgerError> {
        let name = validate::check_name("meal name", name)?;

        let _lock = lock_store(self.store.as_ref());
        self.catch_up();
        let entry = MealEntry {
            name,
            calories,
            meal_type,
            logged_at: self.clock.now(),
        };
        let next = self.current.with_meal(entry)?;
        Ok(self.commit(next))
    }

    /// Adds one glass. At the target this is a no-op.
    pub fn add_water(&mut self) -> Applied<DayRecord> {
        let _lock = lock_store(self.store.as_ref());
        self.catch_up();
        let next = self.current.with_water_added();
        if next == self.current {
            return self.unchanged();
        }
        self.commit(next)
    }

    pub fn update_target(&mut self, target: u32) -> Result<Applied<DayRecord>, LedgerError> {
        self.update_current_day(&DayPatch::calorie_target(target))
    }

    /// Replaces the patchable fields of the current day.
    pub fn update_current_day(
        &mut self,
        patch: &DayPatch,
    ) -> Result<Applied<DayRecord>, LedgerError> {
        // Validate against the current record first so a rejected patch is inert
        self.current.with_patch(patch)?;

        let _lock = lock_store(self.store.as_ref());
        self.catch_up();
        let next = self.current.with_patch(patch)?;
        if next == self.current {
            return Ok(self.unchanged());
        }
        Ok(self.commit(next))
    }

    /// Reloads from the store, then rolls over if the date moved on. Callers
    /// hold the store lock.
    fn catch_up(&mut self) -> RolloverOutcome {
        self.refresh();
        self.roll_over()
    }

    /// Adopts what other ledgers on the same store wrote since this one last
    /// looked. State with unsaved changes is kept as it is.
    fn refresh(&mut self) {
        if !self.history_synced {
            if let Err(e) = self.sync_history() {
                tracing::debug!("History still unreadable: {}", e);
            }
        } else if !self.history_dirty {
            match load_history(self.store.as_ref()) {
                Ok(mut stored) => {
                    if !stored.truncate(self.options.history_capacity).is_empty() {
                        self.history_dirty = true;
                    }
                    self.history = stored;
                }
                Err(e) => tracing::debug!("Keeping in-memory history: {}", e),
            }
        }

        if self.current_dirty {
            return;
        }
        let date = match read_pointer(self.store.as_ref()) {
            Ok(Some(date)) if date > self.current.date => date,
            _ => self.current.date,
        };
        match load_record(self.store.as_ref(), date) {
            Ok(Some(record)) if record != self.current => {
                tracing::debug!("Picked up stored changes for {}", record.date);
                self.current = record;
                self.publish();
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Keeping in-memory day: {}", e),
        }
    }

    fn commit(&mut self, next: DayRecord) -> Applied<DayRecord> {
        self.current = next;
        let current_error = self.flush_current();
        let history_error = if self.history_dirty {
            self.flush_history()
        } else {
            None
        };
        self.publish();

        Applied {
            value: self.current.clone(),
            storage_error: current_error.or(history_error),
        }
    }

    /// Result of a mutation that left the record as it was. Writes that
    /// failed earlier are retried so their state is reported.
    fn unchanged(&mut self) -> Applied<DayRecord> {
        if !self.current_dirty && !self.history_dirty {
            return Applied::durable(self.current.clone());
        }
        let current_error = if self.current_dirty {
            self.flush_current()
        } else {
            None
        };
        let history_error = if self.history_dirty {
            self.flush_history()
        } else {
            None
        };
        Applied {
            value: self.current.clone(),
            storage_error: current_error.or(history_error),
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.current.clone());
    }

    fn persist_current(&mut self) -> Result<(), StorageError> {
        let value = serde_json::to_string(&self.current)?;
        self.store.set(&day_key(self.current.date), &value)?;
        let pointer = serde_json::to_string(&self.current.date)?;
        self.store.set(CURRENT_DAY_KEY, &pointer)
    }

    fn persist_history(&mut self) -> Result<(), StorageError> {
        let value = serde_json::to_string(&self.history)?;
        self.store.set(HISTORY_KEY, &value)
    }

    fn flush_current(&mut self) -> Option<StorageError> {
        let result = self.persist_current();
        self.current_dirty = result.is_err();
        self.note_write(result)
    }

    fn flush_history(&mut self) -> Option<StorageError> {
        if !self.history_synced {
            if let Err(e) = self.sync_history() {
                tracing::warn!(
                    "History unreadable, holding {} archived day(s) in memory: {}",
                    self.history.len(),
                    e
                );
                self.degraded = true;
                return Some(e);
            }
        }
        let result = self.persist_history();
        self.history_dirty = result.is_err();
        self.note_write(result)
    }

    /// Reads the persisted history and folds in days archived while it could
    /// not be read.
    fn sync_history(&mut self) -> Result<(), StorageError> {
        let stored = match load_history(self.store.as_ref()) {
            Ok(history) => history,
            Err(LedgerError::StorageUnavailable(e)) => return Err(e),
            Err(e) => {
                tracing::info!("Discarding history: {}", e);
                HistoryLog::new()
            }
        };
        let pending = std::mem::replace(&mut self.history, stored);
        let capacity = self.options.history_capacity;
        for day in pending.days() {
            self.history.archive(day.clone(), capacity);
        }
        let trimmed = self.history.truncate(capacity);
        if !pending.is_empty() || !trimmed.is_empty() {
            self.history_dirty = true;
        }
        self.history_synced = true;
        Ok(())
    }

    fn note_write(&mut self, result: Result<(), StorageError>) -> Option<StorageError> {
        match result {
            Ok(()) => {
                if self.degraded {
                    tracing::info!("Storage writable again");
                }
                self.degraded = false;
                None
            }
            Err(e) => {
                tracing::warn!("Persisting ledger failed, keeping change in memory: {}", e);
                self.degraded = true;
                Some(e)
            }
        }
    }
}

fn load_history(store: &dyn KeyValueStore) -> Result<HistoryLog, LedgerError> {
    let Some(raw) = store.get(HISTORY_KEY)? else {
        return Ok(HistoryLog::new());
    };
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(&raw).map_err(|e| LedgerError::corrupt(HISTORY_KEY, e))?;

    let mut days = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let parsed = serde_json::from_value::<DayRecord>(entry)
            .map_err(|e| e.to_string())
            .and_then(|record| record.validate().map(|_| record));
        match parsed {
            Ok(record) => days.push(record),
            Err(reason) => {
                tracing::info!("Dropping history entry {}: {}", index, reason);
            }
        }
    }
    Ok(HistoryLog::from_days(days))
}

fn lock_store(store: &dyn KeyValueStore) -> StoreLock {
    store.lock().unwrap_or_else(|e| {
        tracing::warn!("Failed to lock store, continuing without it: {}", e);
        StoreLock::unshared()
    })
}

fn read_pointer(store: &dyn KeyValueStore) -> Result<Option<NaiveDate>, LedgerError> {
    let Some(raw) = store.get(CURRENT_DAY_KEY)? else {
        return Ok(None);
    };
    let date =
        serde_json::from_str(&raw).map_err(|e| LedgerError::corrupt(CURRENT_DAY_KEY, e))?;
    Ok(Some(date))
}

fn load_record(
    store: &dyn KeyValueStore,
    date: NaiveDate,
) -> Result<Option<DayRecord>, LedgerError> {
    let key = day_key(date);
    let Some(raw) = store.get(&key)? else {
        return Ok(None);
    };
    let record: DayRecord =
        serde_json::from_str(&raw).map_err(|e| LedgerError::corrupt(key.as_str(), e))?;
    record
        .validate()
        .map_err(|reason| LedgerError::corrupt(key.as_str(), reason))?;
    if record.date != date {
        return Err(LedgerError::corrupt(
            key.as_str(),
            format!("record is dated {}", record.date),
        ));
    }
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{FileStore, MemoryStore};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_at(store: &MemoryStore, day: NaiveDate) -> (Ledger, ManualClock) {
        let clock = ManualClock::at_date(day);
        let ledger = Ledger::open(store.clone(), clock.clone(), LedgerOptions::default());
        (ledger, clock)
    }

    /// Memory store whose writes, or history reads and writes, can be
    /// switched off.
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        down: Arc<AtomicBool>,
        history_down: Arc<AtomicBool>,
        failing_history_reads: Arc<AtomicUsize>,
    }

    impl FlakyStore {
        fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        fn set_history_down(&self, down: bool) {
            self.history_down.store(down, Ordering::SeqCst);
        }

        fn fail_history_reads(&self, count: usize) {
            self.failing_history_reads.store(count, Ordering::SeqCst);
        }

        fn persisted_history(&self) -> Option<Vec<DayRecord>> {
            self.inner
                .get(HISTORY_KEY)
                .unwrap()
                .map(|raw| serde_json::from_str(&raw).unwrap())
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if key == HISTORY_KEY {
                let failing = self.failing_history_reads.load(Ordering::SeqCst);
                if failing > 0 {
                    self.failing_history_reads.store(failing - 1, Ordering::SeqCst);
                    return Err(StorageError::Unavailable("read timed out".to_string()));
                }
            }
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.down.load(Ordering::SeqCst)
                || (key == HISTORY_KEY && self.history_down.load(Ordering::SeqCst))
            {
                return Err(StorageError::Unavailable("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn delete(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn test_first_open_creates_and_persists_empty_day() {
        let store = MemoryStore::new();
        let (ledger, _clock) = open_at(&store, date(2024, 1, 1));

        assert_eq!(ledger.current_day(), DayRecord::empty(date(2024, 1, 1)));
        assert!(ledger.history().is_empty());
        assert!(store.get("day-record:2024-01-01").unwrap().is_some());
        assert_eq!(
            store.get(CURRENT_DAY_KEY).unwrap(),
            Some("\"2024-01-01\"".to_string())
        );
    }

    #[test]
    fn test_add_meal_scenario() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));

        let record = ledger
            .add_meal("Banana", 105, MealType::Snack)
            .unwrap()
            .into_value();

        assert_eq!(record.calories_consumed, 105);
        assert_eq!(record.meals_logged, 1);
        assert_eq!(record.meals.len(), 1);
        assert_eq!(record.meals[0].name, "Banana");
        assert_eq!(record.meals[0].calories, 105);
        assert_eq!(record.meals[0].meal_type, MealType::Snack);
        assert_eq!(record.calorie_target, 2200);
    }

    #[test]
    fn test_add_workout_scenario() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));
        ledger.add_workout("Cycling", 60, 450).unwrap();
        let before = ledger.current_day();
        assert_eq!(before.calories_burned, 450);

        let after = ledger.add_workout("Running", 30, 280).unwrap().into_value();

        assert_eq!(after.calories_burned, 730);
        assert_eq!(after.workouts_today, before.workouts_today + 1);
        assert_eq!(after.workouts.last().unwrap().kind, "Running");
        assert_eq!(after.workouts.last().unwrap().duration_minutes, 30);
    }

    #[test]
    fn test_entries_are_stamped_by_clock() {
        let store = MemoryStore::new();
        let (mut ledger, clock) = open_at(&store, date(2024, 1, 1));

        let record = ledger.add_meal("Apple", 80, MealType::Snack).unwrap().value;
        assert_eq!(record.meals[0].logged_at, clock.now());
    }

    #[test]
    fn test_counters_match_lists_after_mixed_logging() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));

        for i in 0..5 {
            ledger.add_workout("Yoga", 20 + i, 60).unwrap();
            ledger.add_meal("Apple", 80, MealType::Snack).unwrap();
            ledger.add_water();
        }
        let _ = ledger.add_workout("", 10, 10);
        let _ = ledger.add_workout("Walking", 0, 10);

        let record = ledger.current_day();
        assert_eq!(record.workouts_today as usize, record.workouts.len());
        assert_eq!(record.meals_logged as usize, record.meals.len());
        assert_eq!(record.workouts_today, 5);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_invalid_workout_leaves_state_unchanged() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));
        let before = ledger.current_day();

        let err = ledger.add_workout("Running", 0, 100).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));

        let err = ledger.add_workout("   ", 30, 100).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));

        assert_eq!(ledger.current_day(), before);
    }

    #[test]
    fn test_water_clamps_and_noop_at_target() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));
        let target = ledger.current_day().water_target;

        for _ in 0..(target + 5) {
            let applied = ledger.add_water();
            assert!(applied.is_durable());
            assert!(applied.value.water_intake <= target);
        }

        assert_eq!(ledger.current_day().water_intake, target);
    }

    #[test]
    fn test_update_target_out_of_range_is_invalid_input() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));
        ledger.add_meal("Banana", 105, MealType::Snack).unwrap();
        let before = ledger.current_day();
        let persisted = store.get("day-record:2024-01-01").unwrap();

        let err = ledger.update_target(6000).unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InvalidInput(validate::ValidationError::OutOfRange { value: 6000, .. })
        ));
        assert_eq!(ledger.current_day(), before);
        assert_eq!(store.get("day-record:2024-01-01").unwrap(), persisted);
    }

    #[test]
    fn test_update_target_persists() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));

        ledger.update_target(1800).unwrap();

        let (reopened, _clock) = open_at(&store, date(2024, 1, 1));
        assert_eq!(reopened.current_day().calorie_target, 1800);
    }

    #[test]
    fn test_update_current_day_clamps_water() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));

        let patch = DayPatch {
            water_intake: Some(100),
            ..DayPatch::default()
        };
        let record = ledger.update_current_day(&patch).unwrap().into_value();
        assert_eq!(record.water_intake, record.water_target);
    }

    #[test]
    fn test_reopen_roundtrips_record() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));
        ledger.add_workout("HIIT", 20, 198).unwrap();
        ledger.add_meal("Greek Yogurt", 130, MealType::Breakfast).unwrap();
        ledger.add_water();
        let expected = ledger.current_day();
        drop(ledger);

        let (reopened, _clock) = open_at(&store, date(2024, 1, 1));
        assert_eq!(reopened.current_day(), expected);
    }

    #[test]
    fn test_subscribers_see_every_update() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));
        let mut rx = ledger.subscribe();
        assert!(!rx.has_changed().unwrap());

        ledger.add_meal("Apple", 80, MealType::Snack).unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().calories_consumed, 80);
    }

    #[test]
    fn test_rejected_input_does_not_notify() {
        let store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));
        let rx = ledger.subscribe();

        let _ = ledger.update_target(0);

        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_corrupt_current_record_falls_back_to_empty() {
        let mut store = MemoryStore::new();
        store.set(CURRENT_DAY_KEY, "\"2024-01-01\"").unwrap();
        store.set("day-record:2024-01-01", "{not json").unwrap();

        let (ledger, _clock) = open_at(&store, date(2024, 1, 1));

        assert_eq!(ledger.current_day(), DayRecord::empty(date(2024, 1, 1)));
        let persisted: DayRecord =
            serde_json::from_str(&store.get("day-record:2024-01-01").unwrap().unwrap()).unwrap();
        assert_eq!(persisted, DayRecord::empty(date(2024, 1, 1)));
    }

    #[test]
    fn test_record_breaking_invariants_is_treated_as_corrupt() {
        let mut store = MemoryStore::new();
        let mut bad = DayRecord::empty(date(2024, 1, 1));
        bad.meals_logged = 3;
        store
            .set("day-record:2024-01-01", &serde_json::to_string(&bad).unwrap())
            .unwrap();

        let (ledger, _clock) = open_at(&store, date(2024, 1, 1));
        assert_eq!(ledger.current_day().meals_logged, 0);
    }

    #[test]
    fn test_corrupt_stale_record_is_deleted() {
        let mut store = MemoryStore::new();
        store.set(CURRENT_DAY_KEY, "\"2023-12-30\"").unwrap();
        store.set("day-record:2023-12-30", "garbage").unwrap();

        let (ledger, _clock) = open_at(&store, date(2024, 1, 1));

        assert_eq!(ledger.current_day().date, date(2024, 1, 1));
        assert!(ledger.history().is_empty());
        assert!(store.get("day-record:2023-12-30").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_pointer_falls_back_to_today() {
        let mut store = MemoryStore::new();
        store.set(CURRENT_DAY_KEY, "yesterday-ish").unwrap();

        let (ledger, _clock) = open_at(&store, date(2024, 1, 1));

        assert_eq!(ledger.current_day().date, date(2024, 1, 1));
        assert_eq!(
            store.get(CURRENT_DAY_KEY).unwrap(),
            Some("\"2024-01-01\"".to_string())
        );
    }

    #[test]
    fn test_corrupt_pointer_keeps_todays_record() {
        let mut store = MemoryStore::new();
        let (mut ledger, _clock) = open_at(&store, date(2024, 1, 1));
        ledger.add_meal("Banana", 105, MealType::Snack).unwrap();
        let logged = ledger.current_day();
        drop(ledger);
        store.set(CURRENT_DAY_KEY, "garbage").unwrap();

        let (reopened, _clock) = open_at(&store, date(2024, 1, 1));

        assert_eq!(reopened.current_day(), logged);
        let persisted: DayRecord =
            serde_json::from_str(&store.get("day-record:2024-01-01").unwrap().unwrap()).unwrap();
        assert_eq!(persisted.meals_logged, 1);
        assert_ne!(
            store.get(CURRENT_DAY_KEY).unwrap(),
            Some("garbage".to_string())
        );
    }

    #[test]
    fn test_corrupt_history_is_discarded() {
        let mut store = MemoryStore::new();
        store.set(HISTORY_KEY, "[{\"date\": 12}").unwrap();

        let (ledger, _clock) = open_at(&store, date(2024, 1, 1));
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn test_bad_history_entries_are_dropped_individually() {
        let mut store = MemoryStore::new();
        let good = DayRecord::empty(date(2023, 12, 31)).with_water_added();
        let raw = format!(
            "[{}, {{\"date\": \"2023-12-30\"}}]",
            serde_json::to_string(&good).unwrap()
        );
        store.set(HISTORY_KEY, &raw).unwrap();

        let (ledger, _clock) = open_at(&store, date(2024, 1, 1));
        assert_eq!(ledger.history(), vec![good]);
    }

    #[test]
    fn test_history_capacity_option_trims_on_open() {
        let mut store = MemoryStore::new();
        let days: Vec<DayRecord> = (1..=10)
            .map(|d| DayRecord::empty(date(2023, 12, d)).with_water_added())
            .collect();
        store
            .set(HISTORY_KEY, &serde_json::to_string(&HistoryLog::from_days(days)).unwrap())
            .unwrap();

        let clock = ManualClock::at_date(date(2024, 1, 1));
        let options = LedgerOptions {
            history_capacity: 7,
            ..LedgerOptions::default()
        };
        let ledger = Ledger::open(store.clone(), clock, options);

        assert_eq!(ledger.history().len(), 7);
        assert_eq!(ledger.history()[0].date, date(2023, 12, 10));
        let persisted: Vec<DayRecord> =
            serde_json::from_str(&store.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted.len(), 7);
    }

    #[test]
    fn test_storage_failure_keeps_change_in_memory() {
        let store = FlakyStore::default();
        let clock = ManualClock::at_date(date(2024, 1, 1));
        let mut ledger = Ledger::open(store.clone(), clock, LedgerOptions::default());

        store.set_down(true);
        let applied = ledger.add_meal("Banana", 105, MealType::Snack).unwrap();

        assert!(!applied.is_durable());
        assert!(matches!(
            applied.storage_error,
            Some(StorageError::Unavailable(_))
        ));
        assert_eq!(ledger.current_day().calories_consumed, 105);
        assert!(ledger.is_degraded());

        store.set_down(false);
        let applied = ledger.add_water();
        assert!(applied.is_durable());
        assert!(!ledger.is_degraded());

        let persisted: DayRecord = serde_json::from_str(
            &store.get("day-record:2024-01-01").unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(persisted.calories_consumed, 105);
        assert_eq!(persisted.water_intake, 1);
    }

    #[test]
    fn test_open_with_unwritable_store_still_serves_today() {
        let store = FlakyStore::default();
        store.set_down(true);
        let clock = ManualClock::at_date(date(2024, 1, 1));

        let ledger = Ledger::open(store, clock, LedgerOptions::default());

        assert_eq!(ledger.current_day().date, date(2024, 1, 1));
        assert!(ledger.is_degraded());
    }

    #[test]
    fn test_failed_history_write_is_reported() {
        let store = FlakyStore::default();
        let clock = ManualClock::at_date(date(2024, 1, 1));
        let mut ledger = Ledger::open(store.clone(), clock.clone(), LedgerOptions::default());
        ledger.add_meal("Banana", 105, MealType::Snack).unwrap();

        store.set_history_down(true);
        clock.advance_days(1);
        let applied = ledger.add_water();

        assert!(!applied.is_durable());
        assert!(ledger.is_degraded());
        assert_eq!(ledger.history().len(), 1);
        assert!(store.persisted_history().is_none());

        store.set_history_down(false);
        let applied = ledger.add_water();

        assert!(applied.is_durable());
        assert!(!ledger.is_degraded());
        let persisted = store.persisted_history().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].meals_logged, 1);
    }

    #[test]
    fn test_failed_history_write_reported_on_noop_change() {
        let store = FlakyStore::default();
        let clock = ManualClock::at_date(date(2024, 1, 1));
        let mut ledger = Ledger::open(store.clone(), clock.clone(), LedgerOptions::default());
        ledger.add_water();

        store.set_history_down(true);
        clock.advance_days(1);
        let applied = ledger.update_target(crate::models::DEFAULT_CALORIE_TARGET).unwrap();

        assert!(!applied.is_durable());
        assert_eq!(applied.value.date, date(2024, 1, 2));
    }

    fn seed_history(store: &FlakyStore, days: &[u32]) -> Vec<DayRecord> {
        let records: Vec<DayRecord> = days
            .iter()
            .map(|d| DayRecord::empty(date(2023, 12, *d)).with_water_added())
            .collect();
        let history = HistoryLog::from_days(records);
        store
            .clone()
            .set(HISTORY_KEY, &serde_json::to_string(&history).unwrap())
            .unwrap();
        history.days().to_vec()
    }

    #[test]
    fn test_history_read_failing_once_is_retried() {
        let store = FlakyStore::default();
        seed_history(&store, &[29, 30, 31]);
        store.fail_history_reads(1);
        let clock = ManualClock::at_date(date(2024, 1, 1));

        let mut ledger = Ledger::open(store.clone(), clock.clone(), LedgerOptions::default());
        assert!(ledger.history().is_empty());

        ledger.add_meal("Apple", 80, MealType::Snack).unwrap();
        assert_eq!(ledger.history().len(), 3);

        clock.advance_days(1);
        ledger.check_rollover();

        let persisted = store.persisted_history().unwrap();
        assert_eq!(persisted.len(), 4);
        assert_eq!(persisted[0].date, date(2024, 1, 1));
        assert_eq!(persisted[3].date, date(2023, 12, 29));
    }

    #[test]
    fn test_unreadable_history_is_never_overwritten() {
        let store = FlakyStore::default();
        let seeded = seed_history(&store, &[29, 30, 31]);
        store.fail_history_reads(100);
        let clock = ManualClock::at_date(date(2024, 1, 1));
        let mut ledger = Ledger::open(store.clone(), clock.clone(), LedgerOptions::default());
        ledger.add_meal("Apple", 80, MealType::Snack).unwrap();

        clock.advance_days(1);
        ledger.check_rollover();

        assert_eq!(ledger.history().len(), 1);
        assert!(ledger.is_degraded());
        assert_eq!(store.persisted_history().unwrap(), seeded);

        store.fail_history_reads(0);
        let applied = ledger.add_water();

        assert!(applied.is_durable());
        let persisted = store.persisted_history().unwrap();
        assert_eq!(persisted.len(), 4);
        assert_eq!(persisted[0].meals_logged, 1);
        assert_eq!(ledger.history(), persisted);
    }

    fn open_dir(dir: &TempDir, clock: &ManualClock) -> Ledger {
        Ledger::open(
            FileStore::new(dir.path().to_path_buf()),
            clock.clone(),
            LedgerOptions::default(),
        )
    }

    #[test]
    fn test_rollover_archives_entries_written_by_another_ledger() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::at_date(date(2024, 1, 1));
        let mut session = open_dir(&dir, &clock);
        let mut other = open_dir(&dir, &clock);

        other.add_meal("Banana", 105, MealType::Snack).unwrap();
        drop(other);

        clock.set_date(date(2024, 1, 2));
        let outcome = session.check_rollover();

        assert_eq!(
            outcome,
            RolloverOutcome::RolledOver {
                from: date(2024, 1, 1),
                to: date(2024, 1, 2),
                archived: true,
            }
        );
        let reopened = open_dir(&dir, &clock);
        assert_eq!(reopened.history().len(), 1);
        assert_eq!(reopened.history()[0].meals[0].name, "Banana");
        assert_eq!(reopened.current_day(), DayRecord::empty(date(2024, 1, 2)));
    }

    #[test]
    fn test_ledgers_on_one_directory_do_not_lose_entries() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::at_date(date(2024, 1, 1));
        let mut session = open_dir(&dir, &clock);
        let mut other = open_dir(&dir, &clock);

        other.add_meal("Banana", 105, MealType::Snack).unwrap();
        let record = session.add_water().into_value();

        assert_eq!(record.meals_logged, 1);
        assert_eq!(record.water_intake, 1);

        let record = other.add_workout("Yoga", 20, 60).unwrap().into_value();
        assert_eq!(record.meals_logged, 1);
        assert_eq!(record.water_intake, 1);
        assert_eq!(record.workouts_today, 1);
    }

    #[test]
    fn test_session_follows_rollover_done_elsewhere() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::at_date(date(2024, 1, 1));
        let mut session = open_dir(&dir, &clock);
        session.add_water();
        let mut rx = session.subscribe();

        clock.advance_days(1);
        let mut other = open_dir(&dir, &clock);
        other.add_meal("Apple", 80, MealType::Breakfast).unwrap();
        drop(other);

        assert_eq!(session.check_rollover(), RolloverOutcome::Unchanged);
        assert_eq!(session.current_day().date, date(2024, 1, 2));
        assert_eq!(session.current_day().meals_logged, 1);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].water_intake, 1);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().meals_logged, 1);
    }
}
