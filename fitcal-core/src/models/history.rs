use serde::{Deserialize, Serialize};

use super::day_record::DayRecord;

/// Number of archived days kept.
pub const HISTORY_CAPACITY: usize = 30;

/// Archived days, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    days: Vec<DayRecord>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_days(mut days: Vec<DayRecord>) -> Self {
        days.sort_by(|a, b| b.date.cmp(&a.date));
        days.dedup_by_key(|day| day.date);
        Self { days }
    }

    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn newest(&self) -> Option<&DayRecord> {
        self.days.first()
    }

    /// Adds a finished day, keeping at most `capacity` entries.
    ///
    /// A day already present under the same date is replaced rather than
    /// duplicated. Returns the entries evicted to make room.
    pub fn archive(&mut self, record: DayRecord, capacity: usize) -> Vec<DayRecord> {
        self.days.retain(|day| day.date != record.date);
        let position = self
            .days
            .iter()
            .position(|day| day.date < record.date)
            .unwrap_or(self.days.len());
        self.days.insert(position, record);
        self.truncate(capacity)
    }

    /// Drops the oldest entries beyond `capacity`.
    pub fn truncate(&mut self, capacity: usize) -> Vec<DayRecord> {
        if self.days.len() <= capacity {
            return Vec::new();
        }
        self.days.split_off(capacity)
    }
}
