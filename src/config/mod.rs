//! Configuration module
//!
//! TOML config with env-var overrides. The encryption key is an externally
//! supplied secret (env var or config file), never a constant in source.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::cache::MemoCache;

/// Env var overriding the store file path
pub const ENV_DATABASE: &str = "BOARDGRAPH_DATABASE";
/// Env var supplying the store encryption key
pub const ENV_DB_KEY: &str = "BOARDGRAPH_DB_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Explicit store file path; resolution falls back to local, then home
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    /// Encryption key for the store file. Prefer the env var over
    /// persisting this in the config file.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast capacity per event subscriber
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        if let Some(local) = Self::find_local_config() {
            return Self::load_from(&local);
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Find local .boardgraph/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(".boardgraph").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get global config path (~/.boardgraph/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".boardgraph").join("config.toml"))
    }

    /// Resolve the store file path with priority:
    /// 1. BOARDGRAPH_DATABASE env var
    /// 2. Explicit storage.db_path from the config file
    /// 3. Local .boardgraph/boards.db (walking up from CWD)
    /// 4. Global ~/.boardgraph/boards.db
    pub fn db_path(&self) -> PathBuf {
        if let Ok(env_path) = std::env::var(ENV_DATABASE) {
            return PathBuf::from(env_path);
        }

        if let Some(ref path) = self.storage.db_path {
            return path.clone();
        }

        if let Some(local_config) = Self::find_local_config() {
            if let Some(dir) = local_config.parent() {
                return dir.join("boards.db");
            }
        }

        if let Some(home) = dirs::home_dir() {
            return home.join(".boardgraph").join("boards.db");
        }

        PathBuf::from(".boardgraph").join("boards.db")
    }

    /// Resolve the encryption key: env var first, then the config file.
    /// None means the store is opened without a key.
    pub fn encryption_key(&self) -> Option<String> {
        std::env::var(ENV_DB_KEY)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.security.encryption_key.clone())
    }
}

/// Memoizes parsed config files so repeated lookups skip disk and parsing
///
/// Same read-through pattern as the store's aggregate registry.
pub struct ConfigCache {
    entries: MemoCache<PathBuf, Config>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self {
            entries: MemoCache::new(),
        }
    }

    /// Load through the cache
    pub fn load(&self, path: &Path) -> Result<Config> {
        if let Some(config) = self.entries.get(&path.to_path_buf()) {
            return Ok(config);
        }
        let config = Config::load_from(path)?;
        self.entries.set(path.to_path_buf(), config.clone());
        Ok(config)
    }

    /// Save and refresh the cached entry
    pub fn save(&self, path: &Path, config: &Config) -> Result<()> {
        config.save_to(path)?;
        self.entries.set(path.to_path_buf(), config.clone());
        Ok(())
    }

    /// Drop a cached entry (e.g. after an external edit)
    pub fn invalidate(&self, path: &Path) {
        self.entries.invalidate(&path.to_path_buf());
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to get directories crate functionality
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE").ok().map(PathBuf::from)
        }
        #[cfg(not(windows))]
        {
            std::env::var("HOME").ok().map(PathBuf::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.events.channel_capacity, 256);
        assert!(back.storage.db_path.is_none());
    }

    #[test]
    fn test_explicit_db_path_wins_over_fallbacks() {
        let config = Config {
            storage: StorageConfig {
                db_path: Some(PathBuf::from("/tmp/custom/boards.db")),
            },
            ..Default::default()
        };
        // Only meaningful when the env override is unset in the test runner
        if std::env::var(ENV_DATABASE).is_err() {
            assert_eq!(config.db_path(), PathBuf::from("/tmp/custom/boards.db"));
        }
    }

    #[test]
    fn test_config_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cache = ConfigCache::new();
        let config = Config {
            security: SecurityConfig {
                encryption_key: Some("from-file".to_string()),
            },
            ..Default::default()
        };
        cache.save(&path, &config).unwrap();

        let loaded = cache.load(&path).unwrap();
        assert_eq!(loaded.security.encryption_key.as_deref(), Some("from-file"));

        // Cached: removing the file does not break repeated lookups
        std::fs::remove_file(&path).unwrap();
        assert!(cache.load(&path).is_ok());

        cache.invalidate(&path);
        assert!(cache.load(&path).is_err());
    }
}
