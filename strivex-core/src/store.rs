//! Key-value storage seam.
//!
//! Every entity lives under one key as a JSON document. Backends only move strings;
//! parsing and the fail-open policy live in [`load_json`].

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Storage keys, shared with the mobile client's on-device layout.
pub mod keys {
    pub const WORKOUT_PLAN: &str = "userWorkoutPlan";
    pub const EXERCISE_SETS: &str = "userExerciseSets";
    pub const COMPLETIONS: &str = "completedExercises";
    pub const HUNTER_PROFILE: &str = "hunterProfile";
    pub const CUSTOM_CATEGORIES: &str = "customWorkoutCategories";
    pub const CUSTOM_EXERCISES: &str = "custom_exercises";
    pub const HYDRATION: &str = "hydration";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend failed: {0}")]
    Backend(String),

    #[error("Failed to serialize value for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every key. Used for logout.
    async fn clear(&self) -> Result<(), StoreError>;

    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Reads and parses the JSON document at `key`.
///
/// A missing key or a document that does not parse yields `T::default()`. Only backend
/// failures are returned as errors.
pub async fn load_json<T, S>(store: &S, key: &str) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    Ok(load_json_opt(store, key).await?.unwrap_or_default())
}

/// Like [`load_json`] but distinguishes "absent or unreadable" (`None`) from a parsed value.
pub async fn load_json_opt<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Ignoring malformed value at {}: {}", key, e);
            Ok(None)
        }
    }
}

pub async fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, raw).await
}

/// Process-local store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().expect("memory store lock poisoned");
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("memory store lock poisoned");
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("memory store lock poisoned");
        entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("memory store lock poisoned");
        entries.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.lock().expect("memory store lock poisoned");
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_loads_default() {
        let store = MemoryStore::new();
        let value: Vec<String> = load_json(&store, "nothing").await.unwrap();
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_loads_default() {
        let store = MemoryStore::new();
        store.set("broken", "{not json".to_string()).await.unwrap();

        let value: BTreeMap<String, u32> = load_json(&store, "broken").await.unwrap();
        assert!(value.is_empty());

        let opt: Option<BTreeMap<String, u32>> = load_json_opt(&store, "broken").await.unwrap();
        assert!(opt.is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryStore::new();
        save_json(&store, "list", &vec![1u32, 2, 3]).await.unwrap();

        let value: Vec<u32> = load_json(&store, "list").await.unwrap();
        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(store.keys().await.unwrap(), vec!["list".to_string()]);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = MemoryStore::new();
        store.set("a", "1".to_string()).await.unwrap();
        store.set("b", "2".to_string()).await.unwrap();

        store.clear().await.unwrap();

        assert!(store.keys().await.unwrap().is_empty());
        assert!(store.get("a").await.unwrap().is_none());
    }
}
