//! The config cache: typed accessors, section cursor and debounced flushing.
//!
//! # Locking
//!
//! One `Mutex` guards the store.  Every accessor, the flush sequence and the
//! GC pass take it for their whole duration, so all operations serialise.
//! The lock is released before the debounce alarm is re-armed, and the
//! alarm's callback takes the lock itself on the alarm thread.
//!
//! # Scope labels
//!
//! Every accessor takes a `scope` label before the section name.  It is
//! accepted for call-site compatibility and ignored: entries are identified
//! by `(section, name)` alone.
//!
//! # Debounce
//!
//! ```text
//!            request_save()                 request_save()
//!   Idle ───────────────────► Pending ◄──────────────────┐ (delay restarts)
//!    ▲                          │  └──────────────────────┘
//!    │    alarm fires / flush_now()
//!    └──────────────────────────┘     lock → GC → save → unlock
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use btconf_core::codec::hex::{decode_hex_into, decoded_len, encode_hex};
use btconf_core::{ConfigStore, GcPolicy, GcReport, StoreError};
use tracing::{debug, error};

use crate::scheduler::{Alarm, SchedulerError};
use crate::settings::CacheSettings;

/// Whether a debounced flush is waiting on the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No flush scheduled.
    Idle,
    /// A flush will run once the settle delay elapses.
    Pending,
}

/// Thread-safe cache of device configuration backed by a [`ConfigStore`].
///
/// Share it between threads by reference (it is `Sync`) or inside an `Arc`.
/// It is created by [`ConfigCache::init`] and torn down by
/// [`ConfigCache::cleanup`].
pub struct ConfigCache {
    inner: Arc<Inner>,
}

struct Inner {
    store: Mutex<Box<dyn ConfigStore>>,
    alarm: Alarm,
    config_path: PathBuf,
    settle_delay: Duration,
    gc: GcPolicy,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Box<dyn ConfigStore>> {
        // A panic while holding the lock cannot leave the store half-updated
        // in a way later calls would trip over, so keep serving.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock, garbage collect, save, unlock.
    fn flush(&self) -> Result<GcReport, StoreError> {
        let mut store = self.lock();
        let report = self.gc.collect(&mut **store);
        match store.save(&self.config_path) {
            Ok(()) => {
                debug!(
                    "flushed config to {} (gc removed {})",
                    self.config_path.display(),
                    report.removed
                );
                Ok(report)
            }
            Err(e) => {
                error!("failed to flush config: {e}");
                Err(e)
            }
        }
    }
}

impl ConfigCache {
    /// Wraps an already loaded store.
    ///
    /// [`ConfigCache::init`] is the usual way in; this constructor exists so
    /// callers can supply their own [`ConfigStore`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the flush alarm cannot be created.  The
    /// store is dropped in that case.
    pub fn with_store(
        store: Box<dyn ConfigStore>,
        settings: &CacheSettings,
    ) -> Result<Self, SchedulerError> {
        let alarm = Alarm::new()?;
        Ok(Self {
            inner: Arc::new(Inner {
                store: Mutex::new(store),
                alarm,
                config_path: settings.config_path.clone(),
                settle_delay: settings.settle_delay(),
                gc: settings.gc_policy(),
            }),
        })
    }

    /// Path the cache flushes to.
    pub fn config_path(&self) -> &Path {
        &self.inner.config_path
    }

    // ── Existence ─────────────────────────────────────────────────────────────

    /// Returns `true` if `section` exists.
    pub fn has_section(&self, _scope: &str, section: &str) -> bool {
        self.inner.lock().has_section(section)
    }

    /// Returns `true` if `section` has a property `name`.
    pub fn has_property(&self, _scope: &str, section: &str, name: &str) -> bool {
        self.inner.lock().has_key(section, name)
    }

    // ── Integers ──────────────────────────────────────────────────────────────

    /// Reads an integer property.
    ///
    /// Returns `None` when the property is absent or does not hold a decimal
    /// integer.
    pub fn get_int(&self, _scope: &str, section: &str, name: &str) -> Option<i32> {
        let store = self.inner.lock();
        let raw = store.get(section, name)?;
        match raw.parse::<i32>() {
            Ok(value) => Some(value),
            Err(_) => {
                debug!("{section}.{name} is not an integer: {raw:?}");
                None
            }
        }
    }

    /// Writes an integer property, overwriting any previous value.
    pub fn set_int(&self, _scope: &str, section: &str, name: &str, value: i32) -> bool {
        self.inner.lock().set(section, name, &value.to_string());
        self.request_save();
        true
    }

    // ── Strings ───────────────────────────────────────────────────────────────

    /// Copies a string property into `buf`, truncating to `buf.len()`.
    ///
    /// Returns the number of bytes copied, or `None` if the property is
    /// absent.
    pub fn get_string(
        &self,
        _scope: &str,
        section: &str,
        name: &str,
        buf: &mut [u8],
    ) -> Option<usize> {
        let store = self.inner.lock();
        let value = store.get(section, name)?.as_bytes();
        let len = value.len().min(buf.len());
        buf[..len].copy_from_slice(&value[..len]);
        Some(len)
    }

    /// Returns an owned copy of a string property.
    pub fn get_str(&self, _scope: &str, section: &str, name: &str) -> Option<String> {
        self.inner.lock().get(section, name).map(str::to_owned)
    }

    /// Writes a string property, overwriting any previous value.
    pub fn set_string(&self, _scope: &str, section: &str, name: &str, value: &str) -> bool {
        self.inner.lock().set(section, name, value);
        self.request_save();
        true
    }

    // ── Binary ────────────────────────────────────────────────────────────────

    /// Decodes a hex-encoded property into `buf`.
    ///
    /// Returns the decoded length.  Returns `None`, leaving `buf` untouched,
    /// if the property is absent, malformed, or longer than `buf`.
    pub fn get_binary(
        &self,
        _scope: &str,
        section: &str,
        name: &str,
        buf: &mut [u8],
    ) -> Option<usize> {
        let store = self.inner.lock();
        let value = store.get(section, name)?;
        match decode_hex_into(value, buf) {
            Ok(len) => Some(len),
            Err(e) => {
                debug!("{section}.{name} is not a usable binary value: {e}");
                None
            }
        }
    }

    /// Number of bytes a binary property decodes to; 0 if absent or malformed.
    pub fn get_binary_length(&self, _scope: &str, section: &str, name: &str) -> usize {
        let store = self.inner.lock();
        store
            .get(section, name)
            .and_then(|value| decoded_len(value).ok())
            .unwrap_or(0)
    }

    /// Hex-encodes `bytes` and stores them.
    ///
    /// Returns `false` only if the encode buffer cannot be allocated; nothing
    /// is written in that case.
    pub fn set_binary(&self, _scope: &str, section: &str, name: &str, bytes: &[u8]) -> bool {
        let encoded = match encode_hex(bytes) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("cannot store {section}.{name}: {e}");
                return false;
            }
        };
        self.inner.lock().set(section, name, &encoded);
        self.request_save();
        true
    }

    // ── Removal ───────────────────────────────────────────────────────────────

    /// Removes a property.  Returns `true` if it existed.
    pub fn remove(&self, _scope: &str, section: &str, name: &str) -> bool {
        let removed = self.inner.lock().remove_key(section, name);
        if removed {
            self.request_save();
        }
        removed
    }

    // ── Section iteration ─────────────────────────────────────────────────────

    /// Cursor at the first section.
    ///
    /// The cursor walks a snapshot of the section names taken now, so the
    /// cache may be read and written while iterating.
    pub fn section_begin(&self) -> SectionCursor {
        let names: Arc<[String]> = self.inner.lock().section_names().into();
        SectionCursor { names, index: 0 }
    }

    /// The past-the-end cursor.  Every exhausted cursor compares equal to it.
    pub fn section_end(&self) -> SectionCursor {
        SectionCursor {
            names: Arc::from(Vec::<String>::new()),
            index: 0,
        }
    }

    /// Iterates section names in storage order.
    pub fn sections(&self) -> Sections {
        Sections {
            cursor: self.section_begin(),
        }
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Schedules a flush after the settle delay, restarting the delay if one
    /// is already pending.
    pub fn request_save(&self) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.alarm.set(self.inner.settle_delay, move || {
            // The cache may have been cleaned up while the alarm was pending.
            if let Some(inner) = weak.upgrade() {
                let _ = inner.flush();
            }
        });
    }

    /// Cancels any pending flush and flushes immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the config file cannot be written.
    pub fn flush_now(&self) -> Result<GcReport, StoreError> {
        if self.inner.alarm.cancel() {
            debug!("cancelled pending flush");
        }
        self.inner.flush()
    }

    /// Current debounce state.
    pub fn debounce_state(&self) -> DebounceState {
        if self.inner.alarm.is_pending() {
            DebounceState::Pending
        } else {
            DebounceState::Idle
        }
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("config_path", &self.inner.config_path)
            .field("settle_delay", &self.inner.settle_delay)
            .field("gc", &self.inner.gc)
            .finish_non_exhaustive()
    }
}

// ── Section cursor ────────────────────────────────────────────────────────────

/// Position in a snapshot of section names.
///
/// Obtained from [`ConfigCache::section_begin`]; compare against
/// [`ConfigCache::section_end`] to detect the end.
#[derive(Debug, Clone)]
pub struct SectionCursor {
    names: Arc<[String]>,
    index: usize,
}

impl SectionCursor {
    /// Name of the section under the cursor, `None` at the end.
    pub fn name(&self) -> Option<&str> {
        self.names.get(self.index).map(String::as_str)
    }

    /// Cursor at the following section.  Advancing the end cursor yields the
    /// end cursor.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> SectionCursor {
        SectionCursor {
            names: Arc::clone(&self.names),
            index: (self.index + 1).min(self.names.len()),
        }
    }

    /// Returns `true` once the cursor has passed the last section.
    pub fn is_end(&self) -> bool {
        self.index >= self.names.len()
    }
}

impl PartialEq for SectionCursor {
    fn eq(&self, other: &Self) -> bool {
        match (self.name(), other.name()) {
            (None, None) => true,
            (Some(a), Some(b)) => self.index == other.index && a == b,
            _ => false,
        }
    }
}

impl Eq for SectionCursor {}

/// Iterator over section names, built on [`SectionCursor`].
#[derive(Debug, Clone)]
pub struct Sections {
    cursor: SectionCursor,
}

impl Iterator for Sections {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let name = self.cursor.name()?.to_owned();
        self.cursor = self.cursor.next();
        Some(name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.cursor.names.len() - self.cursor.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Sections {}

// ── Tests ─────────────────────────────────────────────────────────────────────
