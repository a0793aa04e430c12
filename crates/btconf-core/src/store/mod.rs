//! Store backend: ordered sections of string properties.
//!
//! The cache is written against the [`ConfigStore`] trait rather than a
//! concrete file type.  This keeps the cache's locking and flush logic
//! independent of the on-disk syntax and lets tests substitute a store that
//! records every save.
//!
//! [`ConfigFile`] is the production implementation: an ordered in-memory map
//! that loads from and saves to a simple `[section]` / `key = value` text
//! file.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod file;

pub use file::ConfigFile;

/// Error type for store load and save operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Returns `true` if the error is an I/O "not found" on the file itself.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Capability the config cache is built on.
///
/// Implementations keep sections in insertion order and property names
/// unique within a section.  None of the methods lock; the cache serialises
/// access.
pub trait ConfigStore: Send {
    /// Returns `true` if a section named `section` exists.
    fn has_section(&self, section: &str) -> bool;

    /// Returns `true` if `section` contains a property named `key`.
    fn has_key(&self, section: &str, key: &str) -> bool;

    /// Returns the stored value of `section.key`.
    fn get(&self, section: &str, key: &str) -> Option<&str>;

    /// Sets `section.key`, creating the section if needed and overwriting
    /// any existing value.
    fn set(&mut self, section: &str, key: &str, value: &str);

    /// Removes `section.key`.  Returns `true` if it existed.
    ///
    /// A section left without properties is removed as well.
    fn remove_key(&mut self, section: &str, key: &str) -> bool;

    /// Removes a whole section.  Returns `true` if it existed.
    fn remove_section(&mut self, section: &str) -> bool;

    /// Iterates section names in storage order.
    fn sections(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    /// Writes the whole store to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    fn save(&self, path: &Path) -> Result<(), StoreError>;

    /// Owned snapshot of the section names in storage order.
    fn section_names(&self) -> Vec<String> {
        self.sections().map(str::to_owned).collect()
    }
}
