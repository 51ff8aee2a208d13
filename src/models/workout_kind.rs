use std::fmt;

/// A workout with a known metabolic equivalent (MET).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutKind {
    pub name: &'static str,
    pub met: f64,
}

impl WorkoutKind {
    pub const ALL: [WorkoutKind; 6] = [
        WorkoutKind::new("Walking", 3.5),
        WorkoutKind::new("Running", 8.0),
        WorkoutKind::new("Cycling", 6.0),
        WorkoutKind::new("Strength Training", 6.0),
        WorkoutKind::new("Yoga", 3.0),
        WorkoutKind::new("HIIT", 8.5),
    ];

    const fn new(name: &'static str, met: f64) -> Self {
        Self { name, met }
    }

    /// Finds a kind by name, ignoring case. `strength` matches Strength Training.
    pub fn lookup(name: &str) -> Option<WorkoutKind> {
        let wanted = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|kind| {
            let own = kind.name.to_lowercase();
            own == wanted || own.split_whitespace().next() == Some(wanted.as_str())
        })
    }

    /// `MET * weight (kg) * hours`, rounded.
    pub fn estimate_calories(&self, minutes: u32, weight_kg: f64) -> u32 {
        let hours = f64::from(minutes) / 60.0;
        (self.met * weight_kg * hours).round().max(0.0) as u32
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} MET)", self.name, self.met)
    }
}
