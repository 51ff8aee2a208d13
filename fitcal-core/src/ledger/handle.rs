use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

use super::{Applied, Ledger, RolloverOutcome, RolloverScheduler};
use crate::error::LedgerError;
use crate::models::{DayPatch, DayRecord, MealType};

/// Cloneable handle to a ledger shared between the UI and the scheduler.
///
/// Each call holds the lock for one whole compute, persist and notify step, so
/// user actions and scheduled rollover checks never interleave mid-update.
#[derive(Clone)]
pub struct LedgerHandle {
    inner: Arc<Mutex<Ledger>>,
}

impl LedgerHandle {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_day(&self) -> DayRecord {
        self.lock().current_day()
    }

    pub fn history(&self) -> Vec<DayRecord> {
        self.lock().history()
    }

    pub fn subscribe(&self) -> watch::Receiver<DayRecord> {
        self.lock().subscribe()
    }

    pub fn is_degraded(&self) -> bool {
        self.lock().is_degraded()
    }

    pub fn add_workout(
        &self,
        kind: &str,
        duration_minutes: u32,
        calories: u32,
    ) -> Result<Applied<DayRecord>, LedgerError> {
        self.lock().add_workout(kind, duration_minutes, calories)
    }

    pub fn add_meal(
        &self,
        name: &str,
        calories: u32,
        meal_type: MealType,
    ) -> Result<Applied<DayRecord>, LedgerError> {
        self.lock().add_meal(name, calories, meal_type)
    }

    pub fn add_water(&self) -> Applied<DayRecord> {
        self.lock().add_water()
    }

    pub fn update_target(&self, target: u32) -> Result<Applied<DayRecord>, LedgerError> {
        self.lock().update_target(target)
    }

    pub fn update_current_day(&self, patch: &DayPatch) -> Result<Applied<DayRecord>, LedgerError> {
        self.lock().update_current_day(patch)
    }

    pub fn check_rollover(&self) -> RolloverOutcome {
        self.lock().check_rollover()
    }

    /// Starts periodic rollover checks at the ledger's configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_rollover(&self) -> RolloverScheduler {
        let period = self.check_interval();
        RolloverScheduler::spawn(self.clone(), period)
    }

    fn check_interval(&self) -> Duration {
        self.lock().options().check_interval
    }
}
