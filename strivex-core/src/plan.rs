//! Workout plan store.
//!
//! Weekly plan, per-category exercise lists, custom categories and the custom exercise
//! library. Read-modify-write operations hold a plan-wide lock so concurrent edits do
//! not drop each other.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{EngineError, Result};
use crate::models::*;
use crate::store::{keys, load_json, save_json, KeyValueStore};

pub struct PlanStore<S> {
    store: Arc<S>,
    lock: Arc<Mutex<()>>,
}

impl<S> Clone for PlanStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            lock: Arc::clone(&self.lock),
        }
    }
}

impl<S: KeyValueStore> PlanStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    // ============================================================
    // Weekly plan
    // ============================================================

    pub async fn plan(&self) -> Result<WorkoutPlan> {
        Ok(load_json(self.store.as_ref(), keys::WORKOUT_PLAN).await?)
    }

    pub async fn save_plan(&self, plan: &WorkoutPlan) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_plan(plan).await
    }

    /// Assigns a category to `day`. `None` or `Rest` makes it a rest day.
    ///
    /// The category must be built in or a known custom category.
    pub async fn set_day(&self, day: DayOfWeek, category: Option<&str>) -> Result<WorkoutPlan> {
        let _guard = self.lock.lock().await;

        if let Some(category) = category {
            if !is_rest(category) && !self.category_exists(category).await? {
                return Err(EngineError::CategoryNotFound(category.to_string()));
            }
        }

        let mut plan = self.plan().await?;
        plan.assign(day, category);
        self.write_plan(&plan).await?;

        tracing::info!(
            "Plan for {} set to {}",
            day,
            plan.category_for(day).unwrap_or(REST)
        );
        Ok(plan)
    }

    pub async fn clear_day(&self, day: DayOfWeek) -> Result<WorkoutPlan> {
        self.set_day(day, None).await
    }

    /// Category trained on `day`, or `None` on a rest day.
    pub async fn category_for(&self, day: DayOfWeek) -> Result<Option<String>> {
        Ok(self.plan().await?.category_for(day).map(str::to_string))
    }

    // ============================================================
    // Exercises per category
    // ============================================================

    /// Exercises for `category`: the user's list if non-empty, else the built-in defaults.
    pub async fn exercises(&self, category: &str) -> Result<Vec<Exercise>> {
        let overrides: ExerciseOverrides = load_json(self.store.as_ref(), keys::EXERCISE_SETS).await?;
        Ok(effective_exercises(&overrides, category))
    }

    /// The exercise at `index` in `category`'s effective list.
    pub async fn exercise(&self, category: &str, index: usize) -> Result<Exercise> {
        self.exercises(category)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| EngineError::ExerciseNotFound {
                category: category.to_string(),
                index,
            })
    }

    /// Replaces the user's list for `category`. Counts below 1 are raised to 1.
    /// An empty list falls back to the defaults again.
    pub async fn set_exercises(&self, category: &str, exercises: Vec<Exercise>) -> Result<Vec<Exercise>> {
        ensure_trainable(category)?;
        let _guard = self.lock.lock().await;

        let exercises: Vec<Exercise> = exercises.into_iter().map(Exercise::clamped).collect();
        let mut overrides = self.overrides().await?;
        overrides.insert(category.to_string(), exercises);
        self.write_overrides(&overrides).await?;

        Ok(effective_exercises(&overrides, category))
    }

    pub async fn add_exercise(&self, category: &str, exercise: Exercise) -> Result<Vec<Exercise>> {
        ensure_trainable(category)?;
        let _guard = self.lock.lock().await;

        let mut overrides = self.overrides().await?;
        let mut list = effective_exercises(&overrides, category);
        list.push(exercise.clamped());
        overrides.insert(category.to_string(), list.clone());
        self.write_overrides(&overrides).await?;

        Ok(list)
    }

    pub async fn remove_exercise(&self, category: &str, index: usize) -> Result<Exercise> {
        ensure_trainable(category)?;
        let _guard = self.lock.lock().await;

        let mut overrides = self.overrides().await?;
        let mut list = effective_exercises(&overrides, category);
        if index >= list.len() {
            return Err(EngineError::ExerciseNotFound {
                category: category.to_string(),
                index,
            });
        }
        let removed = list.remove(index);
        overrides.insert(category.to_string(), list);
        self.write_overrides(&overrides).await?;

        Ok(removed)
    }

    /// Moves sets or reps of one exercise by `delta`, never below 1.
    pub async fn adjust_exercise(
        &self,
        category: &str,
        index: usize,
        field: ExerciseField,
        delta: i32,
    ) -> Result<Exercise> {
        ensure_trainable(category)?;
        let _guard = self.lock.lock().await;

        let mut overrides = self.overrides().await?;
        let mut list = effective_exercises(&overrides, category);
        let exercise = list
            .get_mut(index)
            .ok_or_else(|| EngineError::ExerciseNotFound {
                category: category.to_string(),
                index,
            })?;
        exercise.adjust(field, delta);
        let adjusted = exercise.clone();

        overrides.insert(category.to_string(), list);
        self.write_overrides(&overrides).await?;

        Ok(adjusted)
    }

    // ============================================================
    // Custom categories
    // ============================================================

    pub async fn custom_categories(&self) -> Result<Vec<CustomCategory>> {
        Ok(load_json(self.store.as_ref(), keys::CUSTOM_CATEGORIES).await?)
    }

    /// Built-in categories followed by custom ones.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = BUILTIN_CATEGORIES.iter().map(|c| c.to_string()).collect();
        names.extend(self.custom_categories().await?.into_iter().map(|c| c.name));
        Ok(names)
    }

    pub async fn add_custom_category(&self, name: &str, icon: &str) -> Result<CustomCategory> {
        let _guard = self.lock.lock().await;

        let name = name.trim();
        if name.is_empty() || is_reserved_category(name) {
            return Err(EngineError::InvalidCategory(name.to_string()));
        }

        let mut custom = self.custom_categories().await?;
        if is_builtin_category(name) || custom.iter().any(|c| c.name == name) {
            return Err(EngineError::DuplicateCategory(name.to_string()));
        }

        let category = CustomCategory {
            name: name.to_string(),
            icon: icon.to_string(),
        };
        custom.push(category.clone());
        save_json(self.store.as_ref(), keys::CUSTOM_CATEGORIES, &custom).await?;

        tracing::info!("Added custom category {}", name);
        Ok(category)
    }

    /// Removes a custom category and turns every day that used it into a rest day.
    /// The returned value can be handed to [`Self::restore_custom_category`] to undo.
    pub async fn delete_custom_category(&self, name: &str) -> Result<DeletedCategory> {
        let _guard = self.lock.lock().await;

        let mut custom = self.custom_categories().await?;
        let position = custom
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| EngineError::CategoryNotFound(name.to_string()))?;
        let category = custom.remove(position);

        let mut plan = self.plan().await?;
        let days = plan.days_with(name);
        for day in &days {
            plan.assign(*day, None);
        }

        save_json(self.store.as_ref(), keys::CUSTOM_CATEGORIES, &custom).await?;
        self.write_plan(&plan).await?;

        tracing::info!("Deleted custom category {} ({} days now rest)", name, days.len());
        Ok(DeletedCategory {
            category,
            days: days.into_iter().map(u8::from).collect(),
        })
    }

    /// Undoes [`Self::delete_custom_category`].
    pub async fn restore_custom_category(&self, deleted: &DeletedCategory) -> Result<WorkoutPlan> {
        let _guard = self.lock.lock().await;

        let name = deleted.category.name.as_str();
        if name.trim().is_empty() || is_reserved_category(name) || is_builtin_category(name) {
            return Err(EngineError::InvalidCategory(name.to_string()));
        }

        let mut custom = self.custom_categories().await?;
        if !custom.iter().any(|c| c.name == deleted.category.name) {
            custom.push(deleted.category.clone());
        }

        let mut plan = self.plan().await?;
        for day in deleted.days.iter().copied().filter_map(DayOfWeek::new) {
            plan.assign(day, Some(&deleted.category.name));
        }

        save_json(self.store.as_ref(), keys::CUSTOM_CATEGORIES, &custom).await?;
        self.write_plan(&plan).await?;

        Ok(plan)
    }

    pub async fn category_icon(&self, name: &str) -> Result<String> {
        let custom = self.custom_categories().await?;
        if let Some(found) = custom.into_iter().find(|c| c.name == name) {
            return Ok(found.icon);
        }
        Ok(builtin_icon(name).unwrap_or(FALLBACK_ICON).to_string())
    }

    // ============================================================
    // Custom exercise library
    // ============================================================

    pub async fn library(&self) -> Result<Vec<Exercise>> {
        Ok(load_json(self.store.as_ref(), keys::CUSTOM_EXERCISES).await?)
    }

    /// Saves an exercise to the library, replacing any entry with the same name.
    pub async fn save_to_library(&self, exercise: Exercise) -> Result<Vec<Exercise>> {
        let _guard = self.lock.lock().await;

        let exercise = exercise.clamped();
        let mut library = self.library().await?;
        match library.iter_mut().find(|e| e.name == exercise.name) {
            Some(existing) => *existing = exercise,
            None => library.push(exercise),
        }
        save_json(self.store.as_ref(), keys::CUSTOM_EXERCISES, &library).await?;
        Ok(library)
    }

    /// Replaces the library entry with the same name. Returns `false` if there is none.
    pub async fn update_in_library(&self, exercise: Exercise) -> Result<bool> {
        let _guard = self.lock.lock().await;

        let mut library = self.library().await?;
        let Some(existing) = library.iter_mut().find(|e| e.name == exercise.name) else {
            return Ok(false);
        };
        *existing = exercise.clamped();
        save_json(self.store.as_ref(), keys::CUSTOM_EXERCISES, &library).await?;
        Ok(true)
    }

    pub async fn remove_from_library(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;

        let mut library = self.library().await?;
        let before = library.len();
        library.retain(|e| e.name != name);
        if library.len() == before {
            return Ok(false);
        }
        save_json(self.store.as_ref(), keys::CUSTOM_EXERCISES, &library).await?;
        Ok(true)
    }

    pub async fn adjust_library_exercise(
        &self,
        name: &str,
        field: ExerciseField,
        delta: i32,
    ) -> Result<Exercise> {
        let _guard = self.lock.lock().await;

        let mut library = self.library().await?;
        let exercise = library
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| EngineError::LibraryExerciseNotFound(name.to_string()))?;
        exercise.adjust(field, delta);
        let adjusted = exercise.clone();

        save_json(self.store.as_ref(), keys::CUSTOM_EXERCISES, &library).await?;
        Ok(adjusted)
    }

    pub async fn clear_library(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        Ok(self.store.remove(keys::CUSTOM_EXERCISES).await?)
    }

    // ============================================================
    // Helpers
    // ============================================================

    async fn category_exists(&self, name: &str) -> Result<bool> {
        if is_builtin_category(name) {
            return Ok(true);
        }
        Ok(self.custom_categories().await?.iter().any(|c| c.name == name))
    }

    async fn overrides(&self) -> Result<ExerciseOverrides> {
        Ok(load_json(self.store.as_ref(), keys::EXERCISE_SETS).await?)
    }

    async fn write_overrides(&self, overrides: &ExerciseOverrides) -> Result<()> {
        Ok(save_json(self.store.as_ref(), keys::EXERCISE_SETS, overrides).await?)
    }

    async fn write_plan(&self, plan: &WorkoutPlan) -> Result<()> {
        Ok(save_json(self.store.as_ref(), keys::WORKOUT_PLAN, plan).await?)
    }
}

fn effective_exercises(overrides: &ExerciseOverrides, category: &str) -> Vec<Exercise> {
    match overrides.get(category) {
        Some(list) if !list.is_empty() => list.iter().cloned().map(Exercise::clamped).collect(),
        _ => default_exercises(category),
    }
}

fn ensure_trainable(category: &str) -> Result<()> {
    if is_rest(category) {
        return Err(EngineError::RestHasNoExercises);
    }
    Ok(())
}
