use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Percent added per logged glass.
pub const HYDRATION_STEP: u8 = 10;
pub const HYDRATION_FULL: u8 = 100;
/// Consecutive full days that pay out [`HYDRATION_STREAK_BONUS_XP`].
pub const HYDRATION_STREAK_TARGET: u32 = 4;
pub const HYDRATION_STREAK_BONUS_XP: u64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationState {
    /// Today's hydration in percent.
    #[serde(default)]
    pub level: u8,
    /// Day `level` belongs to.
    #[serde(default)]
    pub level_date: Option<NaiveDate>,
    #[serde(default)]
    pub streak: u32,
    /// Last day hydration reached 100%.
    #[serde(default)]
    pub last_hydrated: Option<NaiveDate>,
}

/// What recording a full day did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakUpdate {
    /// Already recorded today.
    Unchanged,
    /// Streak moved forward or restarted.
    Advanced,
    /// Streak hit the target and was reset; the bonus is due.
    Completed,
}

impl HydrationState {
    /// Hydration on `today`; a level left over from an earlier day counts as empty.
    pub fn level_on(&self, today: NaiveDate) -> u8 {
        if self.level_date == Some(today) {
            self.level.min(HYDRATION_FULL)
        } else {
            0
        }
    }

    /// Logs one glass. Returns the new level.
    pub fn tap(&mut self, today: NaiveDate) -> u8 {
        let level = self
            .level_on(today)
            .saturating_add(HYDRATION_STEP)
            .min(HYDRATION_FULL);
        self.level = level;
        self.level_date = Some(today);
        level
    }

    /// Records that hydration reached 100% on `today`.
    pub fn record_full_day(&mut self, today: NaiveDate) -> StreakUpdate {
        if self.last_hydrated == Some(today) {
            return StreakUpdate::Unchanged;
        }

        let continues = self
            .last_hydrated
            .and_then(|last| last.succ_opt())
            .is_some_and(|next| next == today);
        self.streak = if continues { self.streak + 1 } else { 1 };
        self.last_hydrated = Some(today);

        if self.streak >= HYDRATION_STREAK_TARGET {
            self.streak = 0;
            StreakUpdate::Completed
        } else {
            StreakUpdate::Advanced
        }
    }
}
