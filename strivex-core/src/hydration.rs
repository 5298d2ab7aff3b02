//! Hydration tracking and the streak bonus.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::models::{
    HydrationState, StreakUpdate, HYDRATION_FULL, HYDRATION_STREAK_BONUS_XP,
};
use crate::progression::{ProfileAggregator, XpAward};
use crate::store::{keys, load_json, save_json, KeyValueStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationOutcome {
    /// Today's hydration in percent after the tap.
    pub level: u8,
    pub streak: u32,
    pub streak_update: Option<StreakUpdate>,
    /// Set when this tap completed the streak.
    pub bonus: Option<XpAward>,
}

pub struct HydrationTracker<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    progression: ProfileAggregator<S>,
    lock: Arc<Mutex<()>>,
}

impl<S> Clone for HydrationTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            progression: self.progression.clone(),
            lock: Arc::clone(&self.lock),
        }
    }
}

impl<S: KeyValueStore> HydrationTracker<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, progression: ProfileAggregator<S>) -> Self {
        Self {
            store,
            clock,
            progression,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn state(&self) -> Result<HydrationState, StoreError> {
        load_json(self.store.as_ref(), keys::HYDRATION).await
    }

    /// Today's hydration in percent.
    pub async fn level(&self) -> Result<u8, StoreError> {
        Ok(self.state().await?.level_on(self.clock.today()))
    }

    /// Logs one glass of water.
    ///
    /// Reaching 100% records the day toward the streak. The streak state is saved before
    /// the bonus is granted, so a failed grant is never paid twice.
    pub async fn tap(&self) -> Result<HydrationOutcome, StoreError> {
        let _guard = self.lock.lock().await;
        let today = self.clock.today();

        let mut state = self.state().await?;
        let level = state.tap(today);
        let streak_update = (level == HYDRATION_FULL).then(|| state.record_full_day(today));
        save_json(self.store.as_ref(), keys::HYDRATION, &state).await?;

        let bonus = if streak_update == Some(StreakUpdate::Completed) {
            tracing::info!("Hydration streak complete");
            Some(
                self.progression
                    .grant_bonus_xp(HYDRATION_STREAK_BONUS_XP, "hydration streak")
                    .await?,
            )
        } else {
            None
        };

        Ok(HydrationOutcome {
            level,
            streak: state.streak,
            streak_update,
            bonus,
        })
    }
}
