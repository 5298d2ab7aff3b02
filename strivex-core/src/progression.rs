//! Profile aggregator.
//!
//! The only writer of the hunter profile's progression fields. Every mutation runs as
//! one transaction under a shared async lock: load, compute, persist. Two completions
//! fired back to back (a double tap) are applied one after the other instead of both
//! reading the same snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::completion::CompletionTracker;
use crate::models::{ExerciseInstance, HunterProfile};
use crate::store::{keys, load_json_opt, save_json, KeyValueStore, StoreError};
use crate::xp::{self, FIRST_COMPLETION_MULTIPLIER, REPEAT_COMPLETION_MULTIPLIER};

/// XP applied to the profile by one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpAward {
    pub xp_gained: u64,
    pub leveled_up: bool,
    pub new_level: u32,
    pub levels_gained: u32,
    pub profile: HunterProfile,
}

impl XpAward {
    /// Feedback line for the hunter.
    pub fn message(&self) -> String {
        if self.leveled_up {
            format!("Level Up! New Level: {}", self.new_level)
        } else {
            format!("+{} XP", self.xp_gained)
        }
    }
}

/// Result of completing one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// Instance id, `"<category>_<index>"`.
    pub instance: String,
    /// Whether the instance had already been completed today.
    pub repeat: bool,
    #[serde(flatten)]
    pub award: XpAward,
}

impl CompletionOutcome {
    pub fn message(&self) -> String {
        self.award.message()
    }
}

pub struct ProfileAggregator<S> {
    store: Arc<S>,
    tracker: CompletionTracker<S>,
    lock: Arc<Mutex<()>>,
}

impl<S> Clone for ProfileAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tracker: self.tracker.clone(),
            lock: Arc::clone(&self.lock),
        }
    }
}

impl<S: KeyValueStore> ProfileAggregator<S> {
    pub fn new(store: Arc<S>, tracker: CompletionTracker<S>) -> Self {
        Self {
            store,
            tracker,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current profile, creating the default one on first read.
    pub async fn profile(&self) -> Result<HunterProfile, StoreError> {
        let _guard = self.lock.lock().await;

        let (profile, existed) = self.load().await?;
        if !existed {
            tracing::info!("Creating default hunter profile");
            self.save(&profile).await?;
        }
        Ok(profile)
    }

    /// Applies one completed exercise.
    ///
    /// A first completion today earns full XP and marks the instance; a repeat earns a
    /// quarter. The completion record is written before the profile, so a failure in
    /// between can only under-count: the retry is seen as a repeat.
    pub async fn complete_exercise(
        &self,
        category: &str,
        index: usize,
        sets: i64,
        reps: i64,
    ) -> Result<CompletionOutcome, StoreError> {
        let _guard = self.lock.lock().await;

        let today = self.tracker.today();
        let instance = ExerciseInstance::new(category, index);

        let (mut profile, _) = self.load().await?;
        let mut record = self.tracker.record().await?;
        let repeat = record.is_completed(today, &instance);

        let multiplier = if repeat {
            REPEAT_COMPLETION_MULTIPLIER
        } else {
            FIRST_COMPLETION_MULTIPLIER
        };
        let gained = xp::calculate_xp(sets, reps, multiplier);
        let award = apply_gain(&mut profile, gained);

        if !repeat {
            record.mark_completed(today, &instance);
            self.tracker.save(&record).await?;
        }
        self.save(&profile).await?;

        if repeat {
            tracing::debug!("Repeat completion of {}: +{} XP", instance, gained);
        } else {
            tracing::info!("Completed {}: +{} XP", instance, gained);
        }
        if award.leveled_up {
            tracing::info!("Hunter reached level {}", award.new_level);
        }

        Ok(CompletionOutcome {
            instance: instance.id(),
            repeat,
            award,
        })
    }

    /// Grants a one-time XP bonus. Any number of levels may be crossed.
    pub async fn grant_bonus_xp(&self, amount: u64, reason: &str) -> Result<XpAward, StoreError> {
        let _guard = self.lock.lock().await;

        let (mut profile, _) = self.load().await?;
        let award = apply_gain(&mut profile, amount);
        self.save(&profile).await?;

        tracing::info!("Bonus XP ({}): +{}", reason, amount);
        if award.leveled_up {
            tracing::info!("Hunter reached level {}", award.new_level);
        }
        Ok(award)
    }

    /// Wipes all stored data (logout). The next profile read starts over at level 1.
    pub async fn reset(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.store.clear().await?;
        tracing::info!("Cleared all hunter data");
        Ok(())
    }

    async fn load(&self) -> Result<(HunterProfile, bool), StoreError> {
        let stored: Option<HunterProfile> =
            load_json_opt(self.store.as_ref(), keys::HUNTER_PROFILE).await?;
        let existed = stored.is_some();
        let mut profile = stored.unwrap_or_default();
        profile.normalize();
        Ok((profile, existed))
    }

    async fn save(&self, profile: &HunterProfile) -> Result<(), StoreError> {
        save_json(self.store.as_ref(), keys::HUNTER_PROFILE, profile).await
    }
}

/// Adds `gained` to the profile and folds it into levels.
fn apply_gain(profile: &mut HunterProfile, gained: u64) -> XpAward {
    let progress = xp::apply_level_ups(profile.xp.saturating_add(gained), profile.level);

    profile.total_xp = profile.total_xp.saturating_add(gained);
    profile.xp = progress.xp;
    profile.level = progress.level;
    profile.next_level_xp = xp::xp_needed(progress.level);
    profile.sync_rank();

    XpAward {
        xp_gained: gained,
        leveled_up: progress.leveled_up,
        new_level: progress.level,
        levels_gained: progress.levels_gained,
        profile: profile.clone(),
    }
}
