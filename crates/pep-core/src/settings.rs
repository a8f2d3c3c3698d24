//! Settings repository: small scalar key-value slots injected into the orchestrator.
//!
//! `MemorySettings` is the default store. `FileSettings` adds an explicit
//! load/save contract backed by `~/.config/pep/settings.toml`; `set` only
//! changes memory until `save` is called.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::naming::DEFAULT_NAMING_TEMPLATE;

/// Key holding the user's naming template.
pub const NAMING_FORMAT_KEY: &str = "naming_format";

/// A scalar setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "bool",
            SettingValue::Number(_) => "number",
            SettingValue::Text(_) => "string",
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Text(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Text(s)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("setting {key:?} holds a {found}, expected a {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Key-value settings with synchronous reads and writes.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<SettingValue>;
    fn set(&self, key: &str, value: SettingValue);
    fn remove(&self, key: &str);
}

/// Reads a string slot, falling back to `default` when unset.
pub fn get_string(
    store: &dyn SettingsStore,
    key: &str,
    default: &str,
) -> Result<String, SettingsError> {
    match store.get(key) {
        None => Ok(default.to_string()),
        Some(SettingValue::Text(s)) => Ok(s),
        Some(other) => Err(SettingsError::WrongType {
            key: key.to_string(),
            expected: "string",
            found: other.type_name(),
        }),
    }
}

/// The current naming template (`{id}-{p}` when unset).
pub fn naming_template(store: &dyn SettingsStore) -> Result<String, SettingsError> {
    get_string(store, NAMING_FORMAT_KEY, DEFAULT_NAMING_TEMPLATE)
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<BTreeMap<String, SettingValue>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_map(values: BTreeMap<String, SettingValue>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    fn snapshot(&self) -> BTreeMap<String, SettingValue> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: SettingValue) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

/// TOML-file backed store with explicit `load` / `save`.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    inner: MemorySettings,
}

impl FileSettings {
    /// Default path for the settings file: `~/.config/pep/settings.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("pep")?;
        Ok(xdg_dirs.place_config_file("settings.toml")?)
    }

    /// Loads settings from `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let values = match std::fs::read_to_string(path) {
            Ok(data) => toml::from_str(&data)
                .with_context(|| format!("parse settings: {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("read settings: {}", path.display()))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner: MemorySettings::from_map(values),
        })
    }

    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes every slot to disk (creates parent dir if needed).
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let toml = toml::to_string_pretty(&self.inner.snapshot()).context("serialize settings")?;
        std::fs::write(&self.path, toml)
            .with_context(|| format!("write settings: {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: SettingValue) {
        self.inner.set(key, value);
    }

    fn remove(&self, key: &str) {
        self.inner.remove(key);
    }
}
