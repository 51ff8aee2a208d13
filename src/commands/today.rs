use clap::Args;
use fitcal_core::LedgerHandle;

use super::OutputFormat;

#[derive(Args)]
pub struct TodayCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl TodayCommand {
    pub fn run(&self, ledger: &LedgerHandle) -> Result<(), Box<dyn std::error::Error>> {
        let day = ledger.current_day();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&day)?);
            }
            OutputFormat::Text => {
                print!("{}", day);
                if ledger.is_degraded() {
                    println!("\nWarning: storage is not writable; changes are not being saved");
                }
            }
        }
        Ok(())
    }
}
