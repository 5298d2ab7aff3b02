use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "strivex";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_PORT: u16 = 17020;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Port for the local HTTP API
    pub port: u16,
    /// SQLite database file. Defaults to `<data dir>/strivex.db`.
    pub database_path: Option<PathBuf>,
    /// Bearer token required by the API when set
    pub api_key: Option<String>,
    /// Allowed CORS origins. Any origin is allowed when unset.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: None,
            api_key: None,
            cors_origins: None,
        }
    }
}

impl Settings {
    /// Load settings from the user's config directory, then apply `STRIVEX_*`
    /// environment overrides.
    pub fn load() -> Self {
        let mut settings = match config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                tracing::warn!("Failed to locate config, using defaults: {}", e);
                Self::default()
            }
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    /// Load settings from `path`.
    /// Returns defaults if the file doesn't exist or fails to parse.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    fn try_load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let settings = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(settings)
    }

    /// Save the settings to the user's config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Overrides fields from `STRIVEX_PORT`, `STRIVEX_DB`, `STRIVEX_API_KEY` and
    /// `STRIVEX_CORS_ORIGINS` (comma separated) as returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("STRIVEX_PORT") {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid STRIVEX_PORT: {}", port),
            }
        }

        if let Some(path) = lookup("STRIVEX_DB").filter(|p| !p.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(key) = lookup("STRIVEX_API_KEY") {
            self.api_key = Some(key).filter(|k| !k.is_empty());
        }

        if let Some(origins) = lookup("STRIVEX_CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            self.cors_origins = (!origins.is_empty()).then_some(origins);
        }
    }

    /// The configured database file, or the per-user default.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::db::default_path(),
        }
    }
}

fn config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.port, 17020);
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ port: nope").unwrap();

        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_key": "secret"}"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.port, DEFAULT_PORT);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let settings = Settings {
            port: 8080,
            database_path: Some(PathBuf::from("/tmp/hunter.db")),
            api_key: None,
            cors_origins: Some(vec!["http://localhost:8081".to_string()]),
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("STRIVEX_PORT", "9000"),
            ("STRIVEX_DB", "/data/strivex.db"),
            ("STRIVEX_API_KEY", "k"),
            ("STRIVEX_CORS_ORIGINS", "http://a.test, http://b.test,"),
        ]));

        assert_eq!(settings.port, 9000);
        assert_eq!(settings.database_path, Some(PathBuf::from("/data/strivex.db")));
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(
            settings.cors_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }

    #[test]
    fn invalid_port_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[("STRIVEX_PORT", "lots")]));
        assert_eq!(settings.port, DEFAULT_PORT);
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let mut settings = Settings {
            api_key: Some("old".to_string()),
            ..Settings::default()
        };
        settings.apply_env(env(&[("STRIVEX_API_KEY", "")]));
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn explicit_database_path_wins() {
        let settings = Settings {
            database_path: Some(PathBuf::from("/tmp/x.db")),
            ..Settings::default()
        };
        assert_eq!(settings.database_path().unwrap(), PathBuf::from("/tmp/x.db"));
    }
}
