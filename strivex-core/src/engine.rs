use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::completion::CompletionTracker;
use crate::error::Result;
use crate::hydration::HydrationTracker;
use crate::models::{DayOfWeek, ExerciseInstance, ProfileView, QuestExercise, TodaysQuest};
use crate::plan::PlanStore;
use crate::progression::{CompletionOutcome, ProfileAggregator};
use crate::store::KeyValueStore;

/// All engine components wired to one store and clock.
pub struct Engine<S> {
    pub plan: PlanStore<S>,
    pub completions: CompletionTracker<S>,
    pub progression: ProfileAggregator<S>,
    pub hydration: HydrationTracker<S>,
    store: Arc<S>,
}

impl<S> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            completions: self.completions.clone(),
            progression: self.progression.clone(),
            hydration: self.hydration.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> Engine<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let completions = CompletionTracker::new(Arc::clone(&store), Arc::clone(&clock));
        let progression = ProfileAggregator::new(Arc::clone(&store), completions.clone());
        let hydration =
            HydrationTracker::new(Arc::clone(&store), Arc::clone(&clock), progression.clone());

        Self {
            plan: PlanStore::new(Arc::clone(&store)),
            completions,
            progression,
            hydration,
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn profile_view(&self) -> Result<ProfileView> {
        Ok(self.progression.profile().await?.into())
    }

    /// Today's category and exercises, each flagged with whether it is done today.
    pub async fn todays_quest(&self) -> Result<TodaysQuest> {
        let date = self.completions.today();
        let day = DayOfWeek::of(date);

        let Some(category) = self.plan.category_for(day).await? else {
            return Ok(TodaysQuest {
                date,
                day,
                category: None,
                exercises: Vec::new(),
            });
        };

        let done = self.completions.record().await?;
        let exercises = self
            .plan
            .exercises(&category)
            .await?
            .into_iter()
            .enumerate()
            .map(|(index, exercise)| QuestExercise {
                index,
                completed: done.is_completed(date, &ExerciseInstance::new(category.as_str(), index)),
                exercise,
            })
            .collect();

        Ok(TodaysQuest {
            date,
            day,
            category: Some(category),
            exercises,
        })
    }

    /// Completes the exercise at `index` of `category`, using its current sets and reps.
    pub async fn complete_quest(&self, category: &str, index: usize) -> Result<CompletionOutcome> {
        let exercise = self.plan.exercise(category, index).await?;
        Ok(self
            .progression
            .complete_exercise(
                category,
                index,
                i64::from(exercise.sets),
                i64::from(exercise.reps),
            )
            .await?)
    }

    /// Every stored key with its raw value, for the debug storage screen.
    pub async fn storage_preview(&self) -> Result<BTreeMap<String, String>> {
        let mut entries = BTreeMap::new();
        for key in self.store.keys().await? {
            if let Some(value) = self.store.get(&key).await? {
                entries.insert(key, value);
            }
        }
        Ok(entries)
    }
}
