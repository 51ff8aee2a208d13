mod config_cmd;
mod history;
mod log;
mod today;
mod watch;

use clap::ValueEnum;
use fitcal_core::{Applied, DayRecord, FileStore, Ledger, LedgerHandle, SystemClock};

use crate::config::Config;

pub use config_cmd::ConfigCommand;
pub use history::HistoryCommand;
pub use log::{log_water, MealCommand, TargetCommand, WorkoutCommand};
pub use today::TodayCommand;
pub use watch::WatchCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Opens the on-disk ledger described by the configuration.
pub fn open_ledger(config: &Config) -> LedgerHandle {
    let store = FileStore::new(config.data_dir.value.clone());
    LedgerHandle::new(Ledger::open(store, SystemClock, config.ledger_options()))
}

/// Unwraps an applied change, warning when it was not saved.
fn saved(applied: Applied<DayRecord>) -> DayRecord {
    if let Some(e) = &applied.storage_error {
        eprintln!("Warning: change kept for this session but not saved: {}", e);
    }
    applied.into_value()
}
