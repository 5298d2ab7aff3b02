use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::exercise::{is_rest, Exercise};

/// Day of the week, 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const NAMES: [&'static str; 7] = [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ];

    pub fn new(index: u8) -> Option<Self> {
        (index < 7).then_some(Self(index))
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date.weekday().num_days_from_sunday() as u8)
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        Self::NAMES[self.0 as usize]
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..7).map(Self)
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or_else(|| format!("Day index out of range: {}", index))
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weekly plan: day index to category name. A missing day, or one set to `Rest`,
/// is a rest day.
///
/// Stored as a JSON object keyed by the day number (`{"1": "Strength"}`). Entries for
/// indices above 6 are kept but never consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutPlan {
    days: BTreeMap<u8, String>,
}

impl WorkoutPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Training category for `day`, or `None` on a rest day.
    pub fn category_for(&self, day: DayOfWeek) -> Option<&str> {
        self.days
            .get(&day.index())
            .map(String::as_str)
            .filter(|category| !category.is_empty() && !is_rest(category))
    }

    /// Assigns `category` to `day`; `None` or `Rest` makes it a rest day.
    pub fn assign(&mut self, day: DayOfWeek, category: Option<&str>) {
        match category {
            Some(category) if !is_rest(category) => {
                self.days.insert(day.index(), category.to_string());
            }
            _ => {
                self.days.remove(&day.index());
            }
        }
    }

    /// Days currently assigned to `category`.
    pub fn days_with(&self, category: &str) -> Vec<DayOfWeek> {
        DayOfWeek::all()
            .filter(|day| self.category_for(*day) == Some(category))
            .collect()
    }

    /// Every day with its category (`None` for rest), Sunday first.
    pub fn week(&self) -> Vec<(DayOfWeek, Option<&str>)> {
        DayOfWeek::all()
            .map(|day| (day, self.category_for(day)))
            .collect()
    }
}

/// Per-category exercise lists the user has edited. Categories not present here use
/// their built-in defaults.
pub type ExerciseOverrides = BTreeMap<String, Vec<Exercise>>;

/// An exercise on today's quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestExercise {
    pub index: usize,
    #[serde(flatten)]
    pub exercise: Exercise,
    pub completed: bool,
}

/// What the hunter is asked to do today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodaysQuest {
    pub date: NaiveDate,
    pub day: DayOfWeek,
    /// `None` on a rest day.
    pub category: Option<String>,
    pub exercises: Vec<QuestExercise>,
}

impl TodaysQuest {
    pub fn is_rest_day(&self) -> bool {
        self.category.is_none()
    }

    pub fn remaining(&self) -> usize {
        self.exercises.iter().filter(|e| !e.completed).count()
    }
}
