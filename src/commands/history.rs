use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use fitcal_core::{DayRecord, LedgerHandle};

use super::OutputFormat;

#[derive(Args)]
pub struct HistoryCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show at most this many days
    #[arg(long, short)]
    pub limit: Option<usize>,
}

impl HistoryCommand {
    pub fn run(&self, ledger: &LedgerHandle) -> Result<(), Box<dyn std::error::Error>> {
        let mut days = ledger.history();
        if let Some(limit) = self.limit {
            days.truncate(limit);
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&days)?);
            }
            OutputFormat::Text => {
                if days.is_empty() {
                    println!("No history yet. Days with activity show up here after midnight.");
                    return Ok(());
                }

                let today = Local::now().date_naive();
                for (i, day) in days.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    print_day(day, today);
                }
                println!("\nTotal: {} day(s)", days.len());
            }
        }
        Ok(())
    }
}

fn print_day(day: &DayRecord, today: NaiveDate) {
    println!("{}", day_label(day.date, today));
    println!("{}", "-".repeat(60));
    println!(
        "  Consumed: {}  Burned: {}  Remaining: {}",
        day.calories_consumed,
        day.calories_burned,
        day.remaining_calories().max(0)
    );
    println!(
        "  Calorie goal: {:.0}%  Water: {}/{}",
        day.calorie_progress().min(100.0),
        day.water_intake,
        day.water_target
    );

    if !day.workouts.is_empty() {
        let names: Vec<String> = day
            .workouts
            .iter()
            .map(|w| format!("{} ({} cal)", w.kind, w.calories))
            .collect();
        println!("  Workouts: {}", names.join(", "));
    }

    if !day.meals.is_empty() {
        let mut names: Vec<String> = day
            .meals
            .iter()
            .take(3)
            .map(|m| format!("{} ({} cal)", m.name, m.calories))
            .collect();
        if day.meals.len() > 3 {
            names.push(format!("+{} more", day.meals.len() - 3));
        }
        println!("  Meals: {}", names.join(", "));
    }
}

/// "Today", "Yesterday", or a short weekday date like "Mon, Jan 1".
fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if date == today - Duration::days(1) {
        "Yesterday".to_string()
    } else {
        date.format("%a, %b %-d").to_string()
    }
}
