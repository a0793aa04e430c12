//! Legacy config migration seam.
//!
//! Older stacks kept device records in an XML file.  On the first start after
//! an upgrade the primary config does not exist yet, so [`ConfigCache::init`]
//! asks a [`LegacyTranscoder`] to turn the old file into a fresh store.  The
//! transcoding itself lives outside this crate.
//!
//! [`ConfigCache::init`]: crate::ConfigCache::init

use std::path::Path;

use btconf_core::{ConfigFile, StoreError};

/// Converts a legacy-format config file into a store.
///
/// Production builds plug in the real transcoder; tests use a mock.
#[cfg_attr(test, mockall::automock)]
pub trait LegacyTranscoder: Send + Sync {
    /// Reads the legacy file at `path` and converts it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file is missing or cannot be converted.
    fn transcode(&self, path: &Path) -> Result<ConfigFile, StoreError>;
}

/// Transcoder for builds with no legacy format to migrate from.
///
/// Always fails with a "not found" error, so init falls through to an empty
/// store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLegacy;

impl LegacyTranscoder for NoLegacy {
    fn transcode(&self, path: &Path) -> Result<ConfigFile, StoreError> {
        Err(StoreError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no legacy transcoder"),
        })
    }
}
