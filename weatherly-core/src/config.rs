use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{model::Coordinates, provider::weatherapi::DEFAULT_BASE_URL};

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "WEATHERAPI_KEY";

pub const DEFAULT_CITY: &str = "Chennai";

/// Search-as-you-type tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search is sent.
    pub debounce_ms: u64,
    /// Queries with fewer characters than this never reach the network.
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500, min_query_len: 3 }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "Chennai"
///
/// [search]
/// debounce_ms = 500
///
/// [location]
/// latitude = 13.08
/// longitude = 80.27
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Used when there is neither a device position nor a saved city.
    pub default_city: String,
    pub forecast_days: u8,
    pub search: SearchConfig,
    /// Stands in for the device position; absent means location is denied.
    pub location: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_city: DEFAULT_CITY.to_string(),
            forecast_days: 7,
            search: SearchConfig::default(),
            location: None,
        }
    }
}

impl Config {
    /// Returns the API key, or an error with a hint on how to set one.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `weatherly configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    /// Load config from the platform config dir, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_from(&Self::config_file_path()?)?;
        cfg.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weatherly", "weatherly")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the persisted key-value store.
    pub fn store_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("store.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("Hint: run `weatherly configure`"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("  ".into());
        assert!(!cfg.is_configured());
    }

    #[test]
    fn env_overrides_file_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        cfg.apply_env(Some("ENV_KEY".into()));
        assert_eq!(cfg.api_key().unwrap(), "ENV_KEY");

        cfg.apply_env(Some(String::new()));
        assert_eq!(cfg.api_key().unwrap(), "ENV_KEY");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.default_city, "Chennai");
        assert_eq!(cfg.search.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"K\"\n[search]\ndebounce_ms = 250\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.api_key().unwrap(), "K");
        assert_eq!(cfg.search.debounce_ms, 250);
        assert_eq!(cfg.search.min_query_len, 3);
        assert_eq!(cfg.forecast_days, 7);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.default_city = "Paris".into();
        cfg.location = Some(Coordinates::new(48.85, 2.35));
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }
}
