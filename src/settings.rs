//! Plugin settings and the guard that keeps them in range.
//!
//! [`clamp`] is pure; [`ensure_settings`] reads the store, clamps and writes
//! back only what it had to correct.
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::config::{
    DEFAULT_IMAGE_HEIGHT, DEFAULT_MAX_FILES, IMAGE_HEIGHT_RANGE, MAX_FILES_RANGE,
    SETTINGS_NAMESPACE,
};

pub const KEY_IMAGE_HEIGHT: &str = "imageheight";
pub const KEY_MAX_FILES: &str = "maxfiles";
pub const KEY_PLUGIN_NAME: &str = "pluginname";

/// Key/value settings storage owned by the host.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn read(&self, namespace: &str) -> Result<HashMap<String, String>>;

    async fn write(&self, namespace: &str, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub image_height: i64,
    pub max_files: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_height: DEFAULT_IMAGE_HEIGHT,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

/// Which fields [`clamp`] replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Corrections {
    pub image_height: bool,
    pub max_files: bool,
}

impl Corrections {
    pub fn any(&self) -> bool {
        self.image_height || self.max_files
    }
}

/// Replace every out-of-range field with its default.
pub fn clamp(stored: Settings) -> (Settings, Corrections) {
    let mut out = stored;
    let mut fixed = Corrections::default();
    if !IMAGE_HEIGHT_RANGE.contains(&stored.image_height) {
        out.image_height = DEFAULT_IMAGE_HEIGHT;
        fixed.image_height = true;
    }
    if !MAX_FILES_RANGE.contains(&stored.max_files) {
        out.max_files = DEFAULT_MAX_FILES;
        fixed.max_files = true;
    }
    (out, fixed)
}

/// Integer coercion of a stored value; a fractional number is truncated.
fn coerce_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

/// Load the plugin settings, initializing or repairing them in the store.
///
/// Unreadable values count as out of range and are reset like any other.
#[instrument(skip_all)]
pub async fn ensure_settings(store: &dyn SettingsStore) -> Result<Settings> {
    let conf = store.read(SETTINGS_NAMESPACE).await?;

    let Some(raw_height) = conf.get(KEY_IMAGE_HEIGHT) else {
        let defaults = Settings::default();
        info!(
            image_height = defaults.image_height,
            max_files = defaults.max_files,
            "initializing plugin settings"
        );
        persist(store, KEY_IMAGE_HEIGHT, defaults.image_height).await?;
        persist(store, KEY_MAX_FILES, defaults.max_files).await?;
        return Ok(defaults);
    };

    // i64::MIN is out of both ranges, so unparsable values get reset
    let stored = Settings {
        image_height: coerce_int(raw_height).unwrap_or(i64::MIN),
        max_files: conf
            .get(KEY_MAX_FILES)
            .and_then(|v| coerce_int(v))
            .unwrap_or(i64::MIN),
    };
    let (settings, fixed) = clamp(stored);

    if fixed.image_height {
        warn!(stored = %raw_height, reset_to = settings.image_height, "image height out of range");
        persist(store, KEY_IMAGE_HEIGHT, settings.image_height).await?;
    }
    if fixed.max_files {
        warn!(
            stored = conf.get(KEY_MAX_FILES).map(String::as_str).unwrap_or("<unset>"),
            reset_to = settings.max_files,
            "max files out of range"
        );
        persist(store, KEY_MAX_FILES, settings.max_files).await?;
    }
    Ok(settings)
}

async fn persist(store: &dyn SettingsStore, key: &str, value: i64) -> Result<()> {
    store
        .write(SETTINGS_NAMESPACE, key, &value.to_string())
        .await
}

/// Settings held in process memory; for hosts without storage and for tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<(String, String), String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(namespace: &str, values: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut guard = store.values.lock().unwrap_or_else(|e| e.into_inner());
            for (k, v) in values {
                guard.insert((namespace.to_string(), k.to_string()), v.to_string());
            }
        }
        store
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<String> {
        let guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(&(namespace.to_string(), key.to_string())).cloned()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn read(&self, namespace: &str) -> Result<HashMap<String, String>> {
        let guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn write(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let mut guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}
