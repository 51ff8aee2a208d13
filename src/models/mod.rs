mod food;
mod workout_kind;

pub use food::QuickFood;
pub use workout_kind::WorkoutKind;
