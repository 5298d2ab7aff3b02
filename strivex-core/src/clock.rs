use std::sync::Mutex;

use chrono::{Days, Local, NaiveDate};

/// Source of the current calendar day. Completion sets and hydration streaks are keyed
/// on it, so day rollover needs no scheduled job.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local calendar day of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    day: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Mutex::new(day),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.lock().expect("clock lock poisoned") = day;
    }

    pub fn advance_days(&self, days: u64) {
        let mut day = self.day.lock().expect("clock lock poisoned");
        if let Some(next) = day.checked_add_days(Days::new(days)) {
            *day = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.day.lock().expect("clock lock poisoned")
    }
}
