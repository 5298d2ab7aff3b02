mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use strivex_core::{KeyValueStore, StoreError};

/// SQLite-backed key-value store holding every engine document.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)?;
        Ok(())
    }

    // ============================================================
    // Key-value operations
    // ============================================================

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let value = conn
            .query_row("SELECT value FROM kv_entries WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    /// Returns `true` if the key existed.
    pub fn remove_value(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let removed = conn.execute("DELETE FROM kv_entries WHERE key = ?", [key])?;
        Ok(removed > 0)
    }

    /// Deletes every entry. Returns how many were removed.
    pub fn clear_values(&self) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let removed = conn.execute("DELETE FROM kv_entries", [])?;
        Ok(removed)
    }

    pub fn list_keys(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// When `key` was last written, as stored (RFC 3339).
    pub fn updated_at(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let value = conn
            .query_row(
                "SELECT updated_at FROM kv_entries WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// `<data dir>/strivex.db` for the current user.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "strivex")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("strivex.db"))
}

fn backend_error(e: anyhow::Error) -> StoreError {
    StoreError::Backend(format!("{:#}", e))
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get_value(key).map_err(backend_error)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.set_value(key, &value).map_err(backend_error)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.remove_value(key).map(|_| ()).map_err(backend_error)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let removed = self.clear_values().map_err(backend_error)?;
        tracing::debug!("Cleared {} stored entries", removed);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.list_keys().map_err(backend_error)
    }
}
