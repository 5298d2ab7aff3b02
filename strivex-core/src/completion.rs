//! Daily completion tracking.
//!
//! An exercise instance is either unseen or completed today. The record is keyed by
//! date, so yesterday's completions simply stop matching once the clock rolls over.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::models::{CompletionRecord, ExerciseInstance};
use crate::store::{keys, load_json, save_json, KeyValueStore, StoreError};

pub struct CompletionTracker<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for CompletionTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: KeyValueStore> CompletionTracker<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The full record. Absent or malformed data reads as empty.
    pub async fn record(&self) -> Result<CompletionRecord, StoreError> {
        load_json(self.store.as_ref(), keys::COMPLETIONS).await
    }

    pub(crate) async fn save(&self, record: &CompletionRecord) -> Result<(), StoreError> {
        save_json(self.store.as_ref(), keys::COMPLETIONS, record).await
    }

    pub async fn is_completed_today(&self, category: &str, index: usize) -> Result<bool, StoreError> {
        let record = self.record().await?;
        Ok(record.is_completed(self.today(), &ExerciseInstance::new(category, index)))
    }

    /// Marks the instance completed today. Returns `true` if it was not already.
    ///
    /// Storage is only written when the set actually changes.
    pub async fn mark_completed_today(
        &self,
        category: &str,
        index: usize,
    ) -> Result<bool, StoreError> {
        let mut record = self.record().await?;
        let inserted = record.mark_completed(self.today(), &ExerciseInstance::new(category, index));
        if inserted {
            self.save(&record).await?;
        }
        Ok(inserted)
    }

    /// Instance ids completed today.
    pub async fn completed_today(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.record().await?.completed_on(self.today()))
    }
}
