mod day_record;
mod history;
mod meal_type;

pub use day_record::{
    DayPatch, DayRecord, MealEntry, WorkoutEntry, DEFAULT_CALORIE_TARGET, DEFAULT_WATER_TARGET,
};
pub use history::{HistoryLog, HISTORY_CAPACITY};
pub use meal_type::MealType;
