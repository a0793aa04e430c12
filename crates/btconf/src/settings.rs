//! TOML-based settings for the config cache.
//!
//! The cache itself needs very little: where the primary and legacy config
//! files live, how long to wait after the last write before flushing, and
//! the garbage collection limits.  Example:
//!
//! ```toml
//! config_path = "/data/misc/bluedroid/bt_config.conf"
//! legacy_path = "/data/misc/bluedroid/bt_config.xml"
//! settle_delay_ms = 3000
//! gc_record_cap = 256
//! gc_trigger_multiplier = 2
//! ```
//!
//! Every field is optional.  Fields absent from the file take the defaults
//! shown above via `#[serde(default = "...")]`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use btconf_core::gc::{DEFAULT_RECORD_CAP, DEFAULT_TRIGGER_MULTIPLIER};
use btconf_core::GcPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized to TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Runtime settings for a [`crate::ConfigCache`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheSettings {
    /// Primary config file, loaded at init and written on every flush.
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,
    /// Legacy-format file transcoded once when the primary file is missing.
    #[serde(default = "default_legacy_path")]
    pub legacy_path: PathBuf,
    /// Quiet period after the last write before a debounced flush.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Maximum device sections pruned per flush.
    #[serde(default = "default_gc_record_cap")]
    pub gc_record_cap: usize,
    /// Pruning starts once unbonded sections exceed `gc_record_cap * gc_trigger_multiplier`.
    #[serde(default = "default_gc_trigger_multiplier")]
    pub gc_trigger_multiplier: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_config_path() -> PathBuf {
    PathBuf::from("/data/misc/bluedroid/bt_config.conf")
}
fn default_legacy_path() -> PathBuf {
    PathBuf::from("/data/misc/bluedroid/bt_config.xml")
}
fn default_settle_delay_ms() -> u64 {
    3000
}
fn default_gc_record_cap() -> usize {
    DEFAULT_RECORD_CAP
}
fn default_gc_trigger_multiplier() -> usize {
    DEFAULT_TRIGGER_MULTIPLIER
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            legacy_path: default_legacy_path(),
            settle_delay_ms: default_settle_delay_ms(),
            gc_record_cap: default_gc_record_cap(),
            gc_trigger_multiplier: default_gc_trigger_multiplier(),
        }
    }
}

impl CacheSettings {
    /// Default settings with both files placed in `dir`, keeping the default
    /// file names.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_path: dir.join("bt_config.conf"),
            legacy_path: dir.join("bt_config.xml"),
            ..Self::default()
        }
    }

    /// Returns a copy with a different settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The settle delay as a [`Duration`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// The garbage collection limits.
    pub fn gc_policy(&self) -> GcPolicy {
        GcPolicy {
            record_cap: self.gc_record_cap,
            trigger_multiplier: self.gc_trigger_multiplier,
        }
    }
}

/// Loads settings from `path`, returning [`CacheSettings::default()`] if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not
/// found", and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<CacheSettings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CacheSettings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `settings` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system failures or
/// [`SettingsError::Serialize`] if serialization fails.
pub fn save_settings(path: &Path, settings: &CacheSettings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
