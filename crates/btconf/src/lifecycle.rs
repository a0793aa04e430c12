//! Cache lifecycle: init (load, migrate, or start empty) and cleanup.
//!
//! ```text
//! init()
//!  ├─ load config_path ─────────────► Primary
//!  ├─ else transcode legacy_path ───► Legacy ─┐
//!  └─ else empty store ─────────────► Empty ──┤
//!                                              └─ save config_path, then
//!                                                 best-effort delete legacy_path
//! cleanup()
//!  └─ flush_now(), then release store and alarm
//! ```

use std::path::Path;

use btconf_core::{ConfigFile, ConfigStore, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::ConfigCache;
use crate::legacy::LegacyTranscoder;
use crate::scheduler::SchedulerError;
use crate::settings::CacheSettings;

/// Error type for cache initialisation.
#[derive(Debug, Error)]
pub enum InitError {
    /// The flush alarm could not be created.  The loaded store was released.
    #[error("unable to create flush alarm: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Where the initial store content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Loaded from the primary config file.
    Primary,
    /// Transcoded from the legacy file.
    Legacy,
    /// Neither file was usable; started unconfigured.
    Empty,
}

/// Produces the initial store for `settings`.
///
/// Never fails: each fallback is logged and the next one tried.  When the
/// primary file was not used, the new store is written to it immediately and
/// the legacy file is removed.
pub fn load_store(
    settings: &CacheSettings,
    legacy: &dyn LegacyTranscoder,
) -> (ConfigFile, LoadOrigin) {
    match ConfigFile::load(&settings.config_path) {
        Ok(store) => return (store, LoadOrigin::Primary),
        Err(e) => warn!("unable to load config file ({e}); attempting to transcode legacy file"),
    }

    let (store, origin) = match legacy.transcode(&settings.legacy_path) {
        Ok(store) => (store, LoadOrigin::Legacy),
        Err(e) => {
            warn!("unable to transcode legacy file ({e}); starting unconfigured");
            (ConfigFile::new(), LoadOrigin::Empty)
        }
    };

    match store.save(&settings.config_path) {
        Ok(()) => remove_legacy_file(&settings.legacy_path),
        Err(e) => warn!("unable to write initial config: {e}"),
    }

    (store, origin)
}

/// Deletes the obsolete legacy file.  Failures are logged, never returned.
fn remove_legacy_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!("removed legacy config {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no legacy config at {}", path.display());
        }
        Err(e) => warn!("unable to remove legacy config {}: {e}", path.display()),
    }
}

impl ConfigCache {
    /// Creates the cache: loads the primary file, falls back to migrating the
    /// legacy file, then to an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Scheduler`] if the flush alarm cannot be created.
    /// Nothing created by this call outlives the error.
    pub fn init(
        settings: &CacheSettings,
        legacy: &dyn LegacyTranscoder,
    ) -> Result<Self, InitError> {
        let (store, origin) = load_store(settings, legacy);
        let sections = store.len();
        let cache = ConfigCache::with_store(Box::new(store), settings)?;
        info!(
            "config cache ready: {sections} sections from {origin:?} ({})",
            settings.config_path.display()
        );
        Ok(cache)
    }

    /// Flushes synchronously, then releases the store and the alarm.
    ///
    /// The cache is consumed, so no accessor can run afterwards.  The store
    /// and alarm are released even if the flush fails.
    ///
    /// # Errors
    ///
    /// Returns the flush's [`StoreError`] after releasing everything.
    pub fn cleanup(self) -> Result<(), StoreError> {
        let result = self.flush_now().map(|_| ());
        drop(self);
        info!("config cache released");
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
