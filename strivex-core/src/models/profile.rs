use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::xp::{self, Rank};

/// The single local hunter's progression state.
///
/// Only the profile aggregator writes `level`, `xp`, `total_xp` and `next_level_xp`.
/// Everything else the setup flow stored in the same document is carried in `details`
/// and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HunterProfile {
    #[serde(default = "default_level")]
    pub level: u32,
    /// XP earned toward the next level. Below `next_level_xp` except at the top level.
    #[serde(default)]
    pub xp: u64,
    /// Lifetime XP. Never decreases.
    #[serde(default)]
    pub total_xp: u64,
    #[serde(default)]
    pub next_level_xp: u64,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

fn default_level() -> u32 {
    1
}

impl Default for HunterProfile {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            total_xp: 0,
            next_level_xp: xp::xp_needed(1),
            details: Map::new(),
        }
    }
}

impl HunterProfile {
    /// Brings a profile read from storage back in line with the level curve.
    ///
    /// Documents written by the setup flow start at level 0 and may carry a stale
    /// `rank`; older ones lack `totalXp`.
    pub fn normalize(&mut self) {
        self.total_xp = self.total_xp.max(self.xp);
        let progress = xp::apply_level_ups(self.xp, self.level.max(1));
        self.level = progress.level;
        self.xp = progress.xp;
        self.next_level_xp = xp::xp_needed(self.level);
        self.sync_rank();
    }

    /// Rewrites a stored `rank` detail to match the current level.
    pub fn sync_rank(&mut self) {
        if self.details.contains_key("rank") {
            self.details
                .insert("rank".to_string(), Value::String(self.rank().to_string()));
        }
    }

    pub fn rank(&self) -> Rank {
        xp::rank_for_level(self.level)
    }

    /// Progress through the current level, 0-100.
    pub fn progress_percent(&self) -> f64 {
        if self.next_level_xp == 0 {
            return 0.0;
        }
        ((self.xp as f64 / self.next_level_xp as f64) * 100.0).min(100.0)
    }

    pub fn name(&self) -> Option<&str> {
        self.details.get("name").and_then(Value::as_str)
    }
}

/// A profile as shown to the hunter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub profile: HunterProfile,
    pub rank: Rank,
    pub progress_percent: f64,
}

impl From<HunterProfile> for ProfileView {
    fn from(profile: HunterProfile) -> Self {
        Self {
            rank: profile.rank(),
            progress_percent: profile.progress_percent(),
            profile,
        }
    }
}
