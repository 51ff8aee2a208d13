//! Day rollover: archive the finished day and start a fresh one.

use chrono::NaiveDate;

use super::Ledger;
use crate::models::DayRecord;

/// What a rollover check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverOutcome {
    /// Today still matches the current record.
    Unchanged,
    /// The clock reads a date before the current record. Nothing changes
    /// until the clock catches up.
    ClockBehind { today: NaiveDate, current: NaiveDate },
    /// A new day started. `archived` is false when the old day was idle.
    RolledOver {
        from: NaiveDate,
        to: NaiveDate,
        archived: bool,
    },
}

impl Ledger {
    /// Compares the clock's date with the current record and rolls over when
    /// it moved forward.
    ///
    /// Changes other ledgers wrote to the same store are loaded first, so the
    /// day that gets archived is the one on disk. Only the single stale record
    /// is archived, however many days passed. Calling this again on the same
    /// date is a no-op.
    ///
    /// A clock that reads an earlier date than the current record does not
    /// roll back: the record is kept and [`RolloverOutcome::ClockBehind`] is
    /// returned, so history stays newest-first with one entry per date.
    pub fn check_rollover(&mut self) -> RolloverOutcome {
        let _lock = super::lock_store(self.store.as_ref());
        self.catch_up()
    }

    /// Rollover without reloading. Callers hold the store lock.
    pub(super) fn roll_over(&mut self) -> RolloverOutcome {
        let today = self.clock.today();
        let current = self.current.date;

        if today == current {
            return RolloverOutcome::Unchanged;
        }
        if today < current {
            tracing::warn!(
                "Clock reads {} but current day is {}; keeping current day",
                today,
                current
            );
            return RolloverOutcome::ClockBehind { today, current };
        }

        let finished = std::mem::replace(&mut self.current, DayRecord::empty(today));
        let archived = finished.has_activity();

        if archived {
            let evicted = self
                .history
                .archive(finished, self.options.history_capacity);
            for day in &evicted {
                tracing::debug!("Evicted {} from history", day.date);
            }
            self.history_dirty = true;
            self.flush_history();
        } else {
            tracing::debug!("Discarding idle day {}", current);
        }

        self.flush_current();
        self.publish();

        tracing::info!(
            "Rolled over from {} to {} (archived: {})",
            current,
            today,
            archived
        );
        RolloverOutcome::RolledOver {
            from: current,
            to: today,
            archived,
        }
    }
}
