use serde::{Deserialize, Serialize};

/// Category name that means "no training today".
pub const REST: &str = "Rest";

/// Categories that ship with the app, in display order.
pub const BUILTIN_CATEGORIES: [&str; 4] = ["Strength", "Cardio", "Yoga", REST];

/// A single exercise inside a category.
///
/// `sets` and `reps` are at least 1. For timed movements `reps` holds minutes or seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Exercise {
    pub fn new(name: impl Into<String>, sets: u32, reps: u32) -> Self {
        Self {
            name: name.into(),
            sets,
            reps,
            icon: None,
            notes: None,
        }
    }

    /// Raises `sets` and `reps` to at least 1.
    pub fn clamped(mut self) -> Self {
        self.sets = self.sets.max(1);
        self.reps = self.reps.max(1);
        self
    }

    /// Moves `field` by `delta`, never below 1.
    pub fn adjust(&mut self, field: ExerciseField, delta: i32) {
        let target = match field {
            ExerciseField::Sets => &mut self.sets,
            ExerciseField::Reps => &mut self.reps,
        };
        let next = i64::from(*target) + i64::from(delta);
        *target = next.clamp(1, i64::from(u32::MAX)) as u32;
    }
}

/// Which counter of an exercise an adjustment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseField {
    Sets,
    Reps,
}

/// Names a custom category may not take. `custom` is a path segment of the category
/// routes.
pub const RESERVED_CATEGORY_NAMES: [&str; 1] = ["custom"];

pub fn is_reserved_category(name: &str) -> bool {
    RESERVED_CATEGORY_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

pub fn is_builtin_category(name: &str) -> bool {
    BUILTIN_CATEGORIES.contains(&name)
}

pub fn is_rest(category: &str) -> bool {
    category == REST
}

/// Built-in exercises for a category. Unknown and custom categories have none.
pub fn default_exercises(category: &str) -> Vec<Exercise> {
    match category {
        "Strength" => vec![
            Exercise::new("Push Ups", 3, 15),
            Exercise::new("Squats", 4, 12),
            Exercise::new("Deadlifts", 3, 10),
        ],
        "Cardio" => vec![
            Exercise::new("Running", 1, 30),
            Exercise::new("Jump Rope", 3, 100),
        ],
        "Yoga" => vec![
            Exercise::new("Sun Salutation", 2, 6),
            Exercise::new("Tree Pose", 2, 30),
        ],
        _ => Vec::new(),
    }
}

pub fn builtin_icon(category: &str) -> Option<&'static str> {
    match category {
        "Strength" => Some("barbell-outline"),
        "Cardio" => Some("heart-outline"),
        "Yoga" => Some("fitness-outline"),
        REST => Some("moon-outline"),
        _ => None,
    }
}

/// Icon for categories that have neither a built-in nor a custom icon.
pub const FALLBACK_ICON: &str = "bicycle-outline";

/// A user-defined workout category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCategory {
    pub name: String,
    pub icon: String,
}

/// A deleted custom category together with the plan days that pointed at it.
/// Passing it back to the plan store restores both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCategory {
    pub category: CustomCategory,
    pub days: Vec<u8>,
}
