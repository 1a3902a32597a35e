//! Key-value persistence for the last city and the recent-searches list.
//!
//! Values are plain strings; the recent-searches list is stored as a JSON
//! array string under its key.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    path::PathBuf,
};

use parking_lot::Mutex;

use crate::model::RecentSearchEntry;

pub const LAST_CITY_KEY: &str = "city";
pub const RECENT_SEARCHES_KEY: &str = "recentSearches";

#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values.lock().insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A single JSON object file holding every key.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: tokio::sync::Mutex::new(()) }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read store file: {}", self.path.display()));
            }
        };

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse store file: {}", self.path.display()))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        // unreadable contents are dropped on write
        let mut values = self.read_all().await.unwrap_or_else(|err| {
            tracing::warn!(error = %format!("{err:#}"), "discarding unreadable store file");
            BTreeMap::new()
        });
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&values).context("Failed to serialize store")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))?;

        Ok(())
    }
}

/// The last city the user picked, if any.
pub async fn load_last_city(store: &dyn KeyValueStore) -> Option<String> {
    match store.get(LAST_CITY_KEY).await {
        Ok(city) => city.filter(|c| !c.trim().is_empty()),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "could not read last city");
            None
        }
    }
}

pub async fn save_last_city(store: &dyn KeyValueStore, city: &str) {
    if let Err(err) = store.set(LAST_CITY_KEY, city).await {
        tracing::warn!(error = %format!("{err:#}"), "could not save last city");
    }
}

/// The persisted recent-searches list; missing or malformed reads as empty.
pub async fn load_recent_searches(store: &dyn KeyValueStore) -> Vec<RecentSearchEntry> {
    let raw = match store.get(RECENT_SEARCHES_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "could not read recent searches");
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|err| {
        tracing::warn!(%err, "ignoring malformed recent searches");
        Vec::new()
    })
}

pub async fn save_recent_searches(store: &dyn KeyValueStore, entries: &[RecentSearchEntry]) {
    let json = match serde_json::to_string(entries) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(%err, "could not serialize recent searches");
            return;
        }
    };

    if let Err(err) = store.set(RECENT_SEARCHES_KEY, &json).await {
        tracing::warn!(error = %format!("{err:#}"), "could not save recent searches");
    }
}
