use clap::Args;
use fitcal_core::validate::{parse_non_negative, parse_positive};
use fitcal_core::{DayRecord, LedgerHandle, MealType};

use super::saved;
use crate::config::Config;
use crate::models::{QuickFood, WorkoutKind};

#[derive(Args)]
pub struct WorkoutCommand {
    /// Workout type (walking, running, cycling, strength, yoga, hiit, or any name)
    pub kind: String,

    /// Duration in minutes
    #[arg(long, short)]
    pub minutes: String,

    /// Calories burned; estimated from the workout type when omitted
    #[arg(long)]
    pub calories: Option<String>,
}

impl WorkoutCommand {
    pub fn run(
        &self,
        ledger: &LedgerHandle,
        config: &Config,
    ) -> Result<DayRecord, Box<dyn std::error::Error>> {
        let minutes = parse_positive("duration", &self.minutes)?;
        let known = WorkoutKind::lookup(&self.kind);

        let calories = match (&self.calories, known) {
            (Some(raw), _) => parse_non_negative("calories", raw)?,
            (None, Some(kind)) => kind.estimate_calories(minutes, config.weight_kg.value),
            (None, None) => {
                return Err(format!(
                    "No estimate for workout '{}'. Pass --calories or use one of: {}",
                    self.kind,
                    known_workouts()
                )
                .into())
            }
        };
        let name = known.map(|k| k.name).unwrap_or(self.kind.as_str());

        let record = saved(ledger.add_workout(name, minutes, calories)?);

        println!("Logged {} for {} min: {} cal burned", name, minutes, calories);
        println!(
            "Today: {} workout(s), {} cal burned",
            record.workouts_today, record.calories_burned
        );
        Ok(record)
    }
}

#[derive(Args)]
pub struct MealCommand {
    /// What was eaten
    pub name: String,

    /// Meal type (breakfast, lunch, dinner, snack)
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub meal_type: String,

    /// Calories; looked up for common foods when omitted
    #[arg(long)]
    pub calories: Option<String>,
}

impl MealCommand {
    pub fn run(&self, ledger: &LedgerHandle) -> Result<DayRecord, Box<dyn std::error::Error>> {
        let meal_type: MealType = self.meal_type.parse().map_err(|e: String| e)?;
        let quick = QuickFood::lookup(&self.name);

        let calories = match (&self.calories, quick) {
            (Some(raw), _) => parse_non_negative("calories", raw)?,
            (None, Some(food)) => food.calories,
            (None, None) => {
                return Err(format!(
                    "Unknown food '{}'. Pass --calories to log it.",
                    self.name
                )
                .into())
            }
        };
        let name = match (&self.calories, quick) {
            (None, Some(food)) => food.name,
            _ => self.name.as_str(),
        };

        let record = saved(ledger.add_meal(name, calories, meal_type)?);

        println!("Logged {}: {} ({} cal)", meal_type, name, calories);
        println!(
            "Today: {} meal(s), {} cal consumed, {} remaining",
            record.meals_logged,
            record.calories_consumed,
            record.remaining_calories()
        );
        Ok(record)
    }
}

#[derive(Args)]
pub struct TargetCommand {
    /// New daily calorie target (1-5000)
    pub calories: String,
}

impl TargetCommand {
    pub fn run(&self, ledger: &LedgerHandle) -> Result<DayRecord, Box<dyn std::error::Error>> {
        let target = parse_positive("calorie target", &self.calories)?;
        let record = saved(ledger.update_target(target)?);

        println!("Daily calorie target is now {} calories", record.calorie_target);
        Ok(record)
    }
}

/// Adds one glass of water.
pub fn log_water(ledger: &LedgerHandle) -> DayRecord {
    let before = ledger.current_day();
    let record = saved(ledger.add_water());

    if record.water_intake == before.water_intake && record.date == before.date {
        println!(
            "Water target already reached ({}/{} glasses)",
            record.water_intake, record.water_target
        );
    } else {
        println!(
            "Water: {}/{} glasses ({:.0}%)",
            record.water_intake,
            record.water_target,
            record.water_progress()
        );
    }
    record
}

fn known_workouts() -> String {
    WorkoutKind::ALL
        .iter()
        .map(|k| k.name)
        .collect::<Vec<_>>()
        .join(", ")
}
