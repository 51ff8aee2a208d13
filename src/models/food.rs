/// Common foods that can be logged by name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickFood {
    pub name: &'static str,
    pub calories: u32,
}

impl QuickFood {
    pub const ALL: [QuickFood; 6] = [
        QuickFood::new("Banana", 105),
        QuickFood::new("Apple", 80),
        QuickFood::new("Chicken Breast (100g)", 165),
        QuickFood::new("Brown Rice (1 cup)", 220),
        QuickFood::new("Greek Yogurt", 130),
        QuickFood::new("Almonds (30g)", 170),
    ];

    const fn new(name: &'static str, calories: u32) -> Self {
        Self { name, calories }
    }

    /// Matches the full name or the part before any portion note, ignoring case.
    pub fn lookup(name: &str) -> Option<QuickFood> {
        let wanted = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|food| {
            let own = food.name.to_lowercase();
            let base = own.split(" (").next().unwrap_or(own.as_str());
            own == wanted || base == wanted
        })
    }
}
