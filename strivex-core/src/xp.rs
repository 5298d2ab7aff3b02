//! XP and level curve.
//!
//! Everything here is pure. The profile aggregator is the only caller that turns
//! these numbers into persisted state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat XP granted for any completed exercise before volume is considered.
pub const BASE_XP: u64 = 10;

/// XP per rep, in tenths of a point (0.4 XP). Kept integral so the floor is exact.
const PER_REP_TENTHS: u64 = 4;

/// Multiplier for the first completion of an exercise instance on a given day.
pub const FIRST_COMPLETION_MULTIPLIER: f64 = 1.0;

/// Multiplier for repeating an instance already completed today.
pub const REPEAT_COMPLETION_MULTIPLIER: f64 = 0.25;

/// XP earned for one completed exercise: `floor((10 + sets * reps * 0.4) * multiplier)`.
///
/// `sets` and `reps` are floored at 1. A non-positive or non-finite multiplier earns nothing.
pub fn calculate_xp(sets: i64, reps: i64, multiplier: f64) -> u64 {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return 0;
    }

    let volume = (sets.max(1) as u64).saturating_mul(reps.max(1) as u64);
    let tenths = (BASE_XP * 10).saturating_add(volume.saturating_mul(PER_REP_TENTHS));

    ((tenths as f64 * multiplier) / 10.0).floor() as u64
}

/// XP required to advance from `level` to `level + 1`: `floor(100 + level^1.5 * 20)`.
///
/// Level 0 is treated as level 1.
pub fn xp_needed(level: u32) -> u64 {
    let level = f64::from(level.max(1));
    (100.0 + level * level.sqrt() * 20.0).floor() as u64
}

/// Result of folding accumulated XP into levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub xp: u64,
    pub level: u32,
    pub leveled_up: bool,
    pub levels_gained: u32,
}

/// Spends `xp` on thresholds starting at `level` until the remainder no longer reaches
/// the next threshold. A single call may cross any number of levels.
///
/// Levels stop at `u32::MAX`; any XP left over there stays banked.
pub fn apply_level_ups(xp: u64, level: u32) -> LevelProgress {
    let start = level.max(1);
    let mut level = start;
    let mut xp = xp;

    loop {
        let needed = xp_needed(level);
        if xp < needed {
            break;
        }
        let Some(next) = level.checked_add(1) else {
            break;
        };
        xp -= needed;
        level = next;
    }

    LevelProgress {
        xp,
        level,
        leveled_up: level > start,
        levels_gained: level - start,
    }
}

/// Hunter rank, derived from level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    F,
    E,
    D,
    C,
    B,
    A,
    S,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::F => "F",
            Self::E => "E",
            Self::D => "D",
            Self::C => "C",
            Self::B => "B",
            Self::A => "A",
            Self::S => "S",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn rank_for_level(level: u32) -> Rank {
    match level {
        100.. => Rank::S,
        80..=99 => Rank::A,
        60..=79 => Rank::B,
        40..=59 => Rank::C,
        20..=39 => Rank::D,
        6..=19 => Rank::E,
        _ => Rank::F,
    }
}
