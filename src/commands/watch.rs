use clap::Args;
use fitcal_core::DayRecord;

use crate::commands::open_ledger;
use crate::config::Config;

/// Keeps the ledger open so the day rolls over at midnight without input.
#[derive(Args)]
pub struct WatchCommand {}

impl WatchCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;

        rt.block_on(async {
            let ledger = open_ledger(config);
            let scheduler = ledger.start_rollover();
            let mut updates = ledger.subscribe();

            println!(
                "Watching {} (checking every {}s, Ctrl-C to stop)",
                config.data_dir.value.display(),
                config.check_interval_secs.value
            );
            print_status(&updates.borrow_and_update().clone());

            loop {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                        }
                        break;
                    }
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let day = updates.borrow_and_update().clone();
                        print_status(&day);
                    }
                }
            }

            scheduler.shutdown().await;
            println!("Stopped");
        });

        Ok(())
    }
}

fn print_status(day: &DayRecord) {
    println!(
        "[{}] consumed {} | burned {} | remaining {} | water {}/{}",
        day.date,
        day.calories_consumed,
        day.calories_burned,
        day.remaining_calories(),
        day.water_intake,
        day.water_target
    );
}
