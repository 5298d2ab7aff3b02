use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use strivex_core::models::*;
use strivex_core::store::keys;
use strivex_core::{Engine, FixedClock, KeyValueStore, MemoryStore, StoreError};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn setup() -> (Engine<MemoryStore>, Arc<MemoryStore>, Arc<FixedClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(monday()));
    let engine = Engine::new(Arc::clone(&store), clock.clone());
    (engine, store, clock)
}

/// Memory store whose writes to one key can be made to fail.
struct FlakyStore {
    inner: MemoryStore,
    failing_key: &'static str,
    failing: AtomicBool,
}

impl FlakyStore {
    fn new(failing_key: &'static str) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_key,
            failing: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        if key == self.failing_key && self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear().await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys().await
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn first_read_creates_default_profile() {
        let (engine, store, _) = setup();
        assert!(store.get(keys::HUNTER_PROFILE).await.unwrap().is_none());

        let profile = engine.progression.profile().await.unwrap();

        assert_eq!(profile, HunterProfile::default());
        assert!(store.get(keys::HUNTER_PROFILE).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn malformed_profile_reads_as_default() {
        let (engine, store, _) = setup();
        store
            .set(keys::HUNTER_PROFILE, "{\"level\": \"high\"".to_string())
            .await
            .unwrap();

        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile.level, 1);
        assert_eq!(profile.xp, 0);
    }

    #[tokio::test]
    async fn top_level_profile_loads_without_overflow() {
        let (engine, store, _) = setup();
        store
            .set(
                keys::HUNTER_PROFILE,
                r#"{"level":4294967295,"xp":18000000000000000000,"name":"Jin"}"#.to_string(),
            )
            .await
            .unwrap();

        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile.level, u32::MAX);
        assert_eq!(profile.name(), Some("Jin"));

        let award = engine.progression.grant_bonus_xp(100, "test").await.unwrap();
        assert_eq!(award.new_level, u32::MAX);
        assert!(!award.leveled_up);
    }

    #[tokio::test]
    async fn view_includes_rank_and_progress() {
        let (engine, _, _) = setup();
        engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();

        let view = engine.profile_view().await.unwrap();
        assert_eq!(view.rank.as_str(), "F");
        assert!((view.progress_percent - 28.0 / 120.0 * 100.0).abs() < 1e-9);
    }
}

mod complete_exercise {
    use super::*;

    #[tokio::test]
    async fn first_completion_earns_full_xp() {
        let (engine, _, _) = setup();

        let outcome = engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();

        assert_eq!(outcome.instance, "Strength_0");
        assert!(!outcome.repeat);
        assert_eq!(outcome.award.xp_gained, 28);
        assert!(!outcome.award.leveled_up);
        assert_eq!(outcome.award.new_level, 1);

        let profile = engine.progression.profile().await.unwrap();
        assert_eq!((profile.level, profile.xp, profile.total_xp), (1, 28, 28));
        assert_eq!(profile.next_level_xp, 120);
    }

    #[tokio::test]
    async fn repeat_same_day_earns_a_quarter() {
        let (engine, _, _) = setup();
        engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();

        let outcome = engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();

        assert!(outcome.repeat);
        assert_eq!(outcome.award.xp_gained, 7);
        assert_eq!(outcome.award.profile.xp, 35);
        assert_eq!(outcome.award.profile.total_xp, 35);
    }

    #[tokio::test]
    async fn other_index_is_a_different_instance() {
        let (engine, _, _) = setup();
        engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();

        let outcome = engine
            .progression
            .complete_exercise("Strength", 1, 3, 15)
            .await
            .unwrap();
        assert!(!outcome.repeat);
        assert_eq!(outcome.award.xp_gained, 28);
    }

    #[tokio::test]
    async fn completed_yesterday_earns_full_xp_today() {
        let (engine, _, clock) = setup();
        engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();

        clock.advance_days(1);

        let outcome = engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();
        assert!(!outcome.repeat);
        assert_eq!(outcome.award.xp_gained, 28);

        let record = engine.completions.record().await.unwrap();
        assert_eq!(record.active_days(), 2);
    }

    #[tokio::test]
    async fn level_up_is_reported() {
        let (engine, _, _) = setup();
        // 3 x 100 jump rope: 10 + 120 = 130 XP, over the 120 threshold.
        let outcome = engine
            .progression
            .complete_exercise("Cardio", 1, 3, 100)
            .await
            .unwrap();

        assert!(outcome.award.leveled_up);
        assert_eq!(outcome.award.new_level, 2);
        assert_eq!(outcome.award.profile.xp, 10);
        assert_eq!(outcome.award.profile.next_level_xp, 156);
        assert_eq!(outcome.message(), "Level Up! New Level: 2");
    }

    #[tokio::test]
    async fn profile_details_survive_updates() {
        let (engine, store, _) = setup();
        store
            .set(
                keys::HUNTER_PROFILE,
                r#"{"name":"Jin","height":"178","weight":72,"level":0,"exp":0,"rank":"F"}"#
                    .to_string(),
            )
            .await
            .unwrap();

        engine
            .progression
            .complete_exercise("Yoga", 0, 2, 6)
            .await
            .unwrap();

        let raw = store.get(keys::HUNTER_PROFILE).await.unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored["name"], "Jin");
        assert_eq!(stored["height"], "178");
        assert_eq!(stored["weight"], 72);
        assert_eq!(stored["level"], 1);
        // 10 + 12 * 0.4 = 14.8
        assert_eq!(stored["xp"], 14);
    }

    #[tokio::test]
    async fn double_tap_is_serialized() {
        let (engine, _, _) = setup();
        let first = engine.clone();
        let second = engine.clone();

        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.progression.complete_exercise("Strength", 0, 3, 15).await }),
            tokio::spawn(async move { second.progression.complete_exercise("Strength", 0, 3, 15).await }),
        );
        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();

        let mut gains = vec![a.award.xp_gained, b.award.xp_gained];
        gains.sort();
        assert_eq!(gains, vec![7, 28]);

        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile.xp, 35);
        assert_eq!(profile.total_xp, 35);
    }

    #[tokio::test]
    async fn many_concurrent_completions_all_count() {
        let (engine, _, _) = setup();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .progression
                        .complete_exercise("Custom", i, 1, 1)
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Ten distinct instances at 10 XP each.
        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile.total_xp, 100);
        assert_eq!(engine.completions.completed_today().await.unwrap().len(), 10);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn failed_profile_write_is_not_applied() {
        let store = Arc::new(FlakyStore::new(keys::HUNTER_PROFILE));
        let clock = Arc::new(FixedClock::new(monday()));
        let engine = Engine::new(Arc::clone(&store), clock);

        engine.progression.profile().await.unwrap();
        store.failing.store(true, Ordering::SeqCst);

        let result = engine.progression.complete_exercise("Strength", 0, 3, 15).await;
        assert!(result.is_err());

        store.failing.store(false, Ordering::SeqCst);
        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile.total_xp, 0);

        // The completion was recorded first, so the retry is priced as a repeat.
        let retry = engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();
        assert!(retry.repeat);
        assert_eq!(retry.award.profile.total_xp, 7);
    }

    #[tokio::test]
    async fn failed_completion_write_grants_nothing() {
        let store = Arc::new(FlakyStore::new(keys::COMPLETIONS));
        let clock = Arc::new(FixedClock::new(monday()));
        let engine = Engine::new(Arc::clone(&store), clock);
        store.failing.store(true, Ordering::SeqCst);

        let result = engine.progression.complete_exercise("Strength", 0, 3, 15).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));

        store.failing.store(false, Ordering::SeqCst);
        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile.total_xp, 0);
        assert!(!engine.completions.is_completed_today("Strength", 0).await.unwrap());
    }
}

mod bonus {
    use super::*;

    #[tokio::test]
    async fn large_bonus_crosses_several_levels() {
        let (engine, _, _) = setup();

        // 120 + 156 = 276 to reach level 3, 24 left over.
        let award = engine
            .progression
            .grant_bonus_xp(300, "test event")
            .await
            .unwrap();

        assert_eq!(award.levels_gained, 2);
        assert_eq!(award.new_level, 3);
        assert_eq!(award.profile.xp, 24);
        assert_eq!(award.profile.total_xp, 300);
    }

    #[tokio::test]
    async fn hydration_bonus_applies_on_top_of_progress() {
        let (engine, _, _) = setup();
        engine.progression.grant_bonus_xp(100, "first").await.unwrap();

        let award = engine.progression.grant_bonus_xp(100, "second").await.unwrap();
        assert!(award.leveled_up);
        assert_eq!(award.new_level, 2);
        assert_eq!(award.profile.xp, 80);
    }
}

mod reset {
    use super::*;

    #[tokio::test]
    async fn reset_wipes_everything() {
        let (engine, store, _) = setup();
        engine
            .progression
            .complete_exercise("Strength", 0, 3, 15)
            .await
            .unwrap();
        engine.plan.set_day(DayOfWeek::new(1).unwrap(), Some("Strength")).await.unwrap();

        engine.progression.reset().await.unwrap();

        assert!(store.keys().await.unwrap().is_empty());
        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile, HunterProfile::default());
        assert!(!engine.completions.is_completed_today("Strength", 0).await.unwrap());
    }
}

mod todays_quest {
    use super::*;

    #[tokio::test]
    async fn rest_day_has_no_exercises() {
        let (engine, _, _) = setup();
        let quest = engine.todays_quest().await.unwrap();

        assert_eq!(quest.day.index(), 1);
        assert!(quest.is_rest_day());
        assert!(quest.exercises.is_empty());
    }

    #[tokio::test]
    async fn lists_default_exercises_with_completion_flags() {
        let (engine, _, _) = setup();
        engine
            .plan
            .set_day(DayOfWeek::new(1).unwrap(), Some("Strength"))
            .await
            .unwrap();

        let outcome = engine.complete_quest("Strength", 1).await.unwrap();
        // Squats 4 x 12: 10 + 19.2
        assert_eq!(outcome.award.xp_gained, 29);

        let quest = engine.todays_quest().await.unwrap();
        assert_eq!(quest.category.as_deref(), Some("Strength"));
        assert_eq!(quest.exercises.len(), 3);
        assert!(!quest.exercises[0].completed);
        assert!(quest.exercises[1].completed);
        assert_eq!(quest.remaining(), 2);
    }

    #[tokio::test]
    async fn completing_unknown_exercise_fails() {
        let (engine, _, _) = setup();
        let err = engine.complete_quest("Strength", 7).await.unwrap_err();
        assert!(err.is_not_found());

        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile.total_xp, 0);
    }
}

mod hydration {
    use super::*;

    async fn fill(engine: &Engine<MemoryStore>) -> strivex_core::hydration::HydrationOutcome {
        let mut last = None;
        for _ in 0..10 {
            last = Some(engine.hydration.tap().await.unwrap());
        }
        last.unwrap()
    }

    #[tokio::test]
    async fn tenth_tap_fills_and_starts_streak() {
        let (engine, _, _) = setup();
        let outcome = fill(&engine).await;

        assert_eq!(outcome.level, 100);
        assert_eq!(outcome.streak, 1);
        assert_eq!(outcome.streak_update, Some(StreakUpdate::Advanced));
        assert!(outcome.bonus.is_none());

        let extra = engine.hydration.tap().await.unwrap();
        assert_eq!(extra.level, 100);
        assert_eq!(extra.streak_update, Some(StreakUpdate::Unchanged));
    }

    #[tokio::test]
    async fn four_full_days_grant_bonus() {
        let (engine, _, clock) = setup();

        for _ in 0..3 {
            fill(&engine).await;
            clock.advance_days(1);
        }
        let outcome = fill(&engine).await;

        assert_eq!(outcome.streak_update, Some(StreakUpdate::Completed));
        assert_eq!(outcome.streak, 0);
        let bonus = outcome.bonus.expect("bonus granted");
        assert_eq!(bonus.xp_gained, 100);

        let profile = engine.progression.profile().await.unwrap();
        assert_eq!(profile.total_xp, 100);
    }

    #[tokio::test]
    async fn level_resets_next_day() {
        let (engine, _, clock) = setup();
        engine.hydration.tap().await.unwrap();
        engine.hydration.tap().await.unwrap();
        assert_eq!(engine.hydration.level().await.unwrap(), 20);

        clock.advance_days(1);
        assert_eq!(engine.hydration.level().await.unwrap(), 0);
    }
}
