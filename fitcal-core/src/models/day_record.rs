use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::meal_type::MealType;
use crate::validate::{self, ValidationError};

/// Calorie target given to every freshly created day.
pub const DEFAULT_CALORIE_TARGET: u32 = 2200;
/// Glasses of water per day; fixed when the day is created.
pub const DEFAULT_WATER_TARGET: u32 = 8;

/// A logged workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration_minutes: u32,
    pub calories: u32,
    pub logged_at: DateTime<Utc>,
}

/// A logged meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntry {
    pub name: String,
    pub calories: u32,
    pub meal_type: MealType,
    pub logged_at: DateTime<Utc>,
}

/// Fields that may be replaced wholesale on the current day.
///
/// Counters and entry lists are deliberately absent: they only change through
/// logging, which keeps them in step with each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayPatch {
    pub calorie_target: Option<u32>,
    /// Clamped to the day's water target.
    pub water_intake: Option<u32>,
}

impl DayPatch {
    pub fn calorie_target(target: u32) -> Self {
        Self {
            calorie_target: Some(target),
            ..Self::default()
        }
    }
}

/// One calendar day's activity snapshot.
///
/// Records are values: every change produces a new record and the ledger swaps
/// it in whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub date: NaiveDate,
    pub calories_consumed: u32,
    pub calories_burned: u32,
    pub calorie_target: u32,
    pub water_intake: u32,
    pub water_target: u32,
    pub workouts_today: u32,
    pub meals_logged: u32,
    #[serde(default)]
    pub workouts: Vec<WorkoutEntry>,
    #[serde(default)]
    pub meals: Vec<MealEntry>,
}

impl DayRecord {
    /// A zeroed record for `date` with default targets.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            calories_consumed: 0,
            calories_burned: 0,
            calorie_target: DEFAULT_CALORIE_TARGET,
            water_intake: 0,
            water_target: DEFAULT_WATER_TARGET,
            workouts_today: 0,
            meals_logged: 0,
            workouts: Vec::new(),
            meals: Vec::new(),
        }
    }

    /// True once anything was logged. Idle days are never archived.
    pub fn has_activity(&self) -> bool {
        self.workouts_today > 0 || self.meals_logged > 0 || self.water_intake > 0
    }

    /// `target - consumed + burned`. Can exceed the target when a lot was burned.
    pub fn remaining_calories(&self) -> i64 {
        i64::from(self.calorie_target) - i64::from(self.calories_consumed)
            + i64::from(self.calories_burned)
    }

    /// Percentage of the calorie target consumed. Not capped.
    pub fn calorie_progress(&self) -> f64 {
        percent(self.calories_consumed, self.calorie_target)
    }

    pub fn water_progress(&self) -> f64 {
        percent(self.water_intake, self.water_target)
    }

    pub fn with_workout(&self, entry: WorkoutEntry) -> Result<Self, ValidationError> {
        validate::check_positive("duration", entry.duration_minutes)?;
        let mut next = self.clone();
        next.calories_burned =
            checked_add("calories burned", self.calories_burned, entry.calories)?;
        next.workouts_today = checked_add("workouts", self.workouts_today, 1)?;
        next.workouts.push(entry);
        Ok(next)
    }

    pub fn with_meal(&self, entry: MealEntry) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        next.calories_consumed =
            checked_add("calories consumed", self.calories_consumed, entry.calories)?;
        next.meals_logged = checked_add("meals", self.meals_logged, 1)?;
        next.meals.push(entry);
        Ok(next)
    }

    /// One more glass, stopping at the target.
    pub fn with_water_added(&self) -> Self {
        let mut next = self.clone();
        next.water_intake = self.water_intake.saturating_add(1).min(self.water_target);
        next
    }

    pub fn with_patch(&self, patch: &DayPatch) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        if let Some(target) = patch.calorie_target {
            next.calorie_target = validate::check_calorie_target(target)?;
        }
        if let Some(water) = patch.water_intake {
            next.water_intake = water.min(self.water_target);
        }
        Ok(next)
    }

    /// Checks the structural invariants of a record read from storage.
    pub fn validate(&self) -> Result<(), String> {
        if self.workouts_today as usize != self.workouts.len() {
            return Err(format!(
                "workoutsToday is {} but {} workouts are listed",
                self.workouts_today,
                self.workouts.len()
            ));
        }
        if self.meals_logged as usize != self.meals.len() {
            return Err(format!(
                "mealsLogged is {} but {} meals are listed",
                self.meals_logged,
                self.meals.len()
            ));
        }
        if self.water_target == 0 {
            return Err("waterTarget must be positive".to_string());
        }
        if self.water_intake > self.water_target {
            return Err(format!(
                "waterIntake {} exceeds waterTarget {}",
                self.water_intake, self.water_target
            ));
        }
        validate::check_calorie_target(self.calorie_target).map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl fmt::Display for DayRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.date)?;
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(
            f,
            "Consumed: {}  Burned: {}  Remaining: {}",
            self.calories_consumed,
            self.calories_burned,
            self.remaining_calories()
        )?;
        writeln!(
            f,
            "Target: {} ({:.0}%)",
            self.calorie_target,
            self.calorie_progress()
        )?;
        writeln!(
            f,
            "Water: {}/{} glasses ({:.0}%)",
            self.water_intake,
            self.water_target,
            self.water_progress()
        )?;

        if !self.workouts.is_empty() {
            writeln!(f, "\nWorkouts ({}):", self.workouts_today)?;
            for workout in &self.workouts {
                writeln!(
                    f,
                    "  - {} {} min, {} cal",
                    workout.kind, workout.duration_minutes, workout.calories
                )?;
            }
        }

        if !self.meals.is_empty() {
            writeln!(f, "\nMeals ({}):", self.meals_logged)?;
            for meal in &self.meals {
                writeln!(f, "  - {:10} {} ({} cal)", meal.meal_type, meal.name, meal.calories)?;
            }
        }

        Ok(())
    }
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(whole) * 100.0
}

fn checked_add(field: &'static str, current: u32, delta: u32) -> Result<u32, ValidationError> {
    current
        .checked_add(delta)
        .ok_or(ValidationError::Overflow { field })
}
