use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::analytics::MAX_LEADERBOARD_LIMIT;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsSettings {
    /// Rows returned when a leaderboard request carries no `limit`.
    pub leaderboard_limit: usize,
    pub request_timeout_ms: u64,
    /// How long a cached result counts as fresh. Zero means every refresh
    /// refetches while still showing the cached value.
    pub stale_time_ms: u64,
    pub cache_capacity: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            leaderboard_limit: 10,
            request_timeout_ms: 15_000,
            stale_time_ms: 0,
            cache_capacity: 128,
        }
    }
}

impl AnalyticsSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn clamped_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.leaderboard_limit)
            .clamp(1, MAX_LEADERBOARD_LIMIT)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    analytics: AnalyticsSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn analytics(&self) -> AnalyticsSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .analytics
            .clone()
    }

    pub fn update_analytics(&self, settings: AnalyticsSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.analytics = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.analytics(), AnalyticsSettings::default());
    }

    #[test]
    fn updates_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        let custom = AnalyticsSettings {
            leaderboard_limit: 25,
            ..Default::default()
        };
        store.update_analytics(custom.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.analytics(), custom);
    }

    #[test]
    fn corrupt_or_partial_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(
            SettingsStore::new(path.clone()).unwrap().analytics(),
            AnalyticsSettings::default()
        );

        fs::write(&path, r#"{"analytics":{"staleTimeMs":5000}}"#).unwrap();
        let settings = SettingsStore::new(path).unwrap().analytics();
        assert_eq!(settings.stale_time_ms, 5000);
        assert_eq!(settings.leaderboard_limit, 10);
    }

    #[test]
    fn reload_picks_up_edits_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        fs::write(&path, r#"{"analytics":{"cacheCapacity":4}}"#).unwrap();
        assert_eq!(store.analytics().cache_capacity, 128);
        store.reload().unwrap();
        assert_eq!(store.analytics().cache_capacity, 4);
        assert_eq!(store.analytics().leaderboard_limit, 10);

        fs::write(&path, "{broken").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.analytics().cache_capacity, 4);
    }

    #[test]
    fn limit_is_clamped() {
        let settings = AnalyticsSettings::default();
        assert_eq!(settings.clamped_limit(None), 10);
        assert_eq!(settings.clamped_limit(Some(0)), 1);
        assert_eq!(settings.clamped_limit(Some(500)), MAX_LEADERBOARD_LIMIT);
    }
}
