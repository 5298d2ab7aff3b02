use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One exercise slot of a category, identified as `"<category>_<index>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExerciseInstance {
    pub category: String,
    pub index: usize,
}

impl ExerciseInstance {
    pub fn new(category: impl Into<String>, index: usize) -> Self {
        Self {
            category: category.into(),
            index,
        }
    }

    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExerciseInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.category, self.index)
    }
}

/// Completed exercise instances per calendar day.
///
/// Stored as `{"2026-10-19": ["Strength_0", ...]}`. Past days are kept as history; only
/// the current day's entry is ever used to detect repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionRecord {
    days: BTreeMap<NaiveDate, BTreeSet<String>>,
}

impl CompletionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, day: NaiveDate, instance: &ExerciseInstance) -> bool {
        self.days
            .get(&day)
            .is_some_and(|done| done.contains(&instance.id()))
    }

    /// Adds `instance` to the set for `day`. Returns `false` if it was already there.
    pub fn mark_completed(&mut self, day: NaiveDate, instance: &ExerciseInstance) -> bool {
        self.days.entry(day).or_default().insert(instance.id())
    }

    /// Instance ids completed on `day`.
    pub fn completed_on(&self, day: NaiveDate) -> BTreeSet<String> {
        self.days.get(&day).cloned().unwrap_or_default()
    }

    /// Number of days with at least one completion.
    pub fn active_days(&self) -> usize {
        self.days.values().filter(|done| !done.is_empty()).count()
    }
}
