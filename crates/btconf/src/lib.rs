//! btconf library entry point.
//!
//! A persistent, thread-safe cache of per-device Bluetooth configuration
//! (pairing metadata, link keys, scan-discovered attributes).
//!
//! ```text
//! ConfigCache::init()
//!  └─ load bt_config.conf ── or ── transcode legacy file ── or ── empty
//!
//! set_int / set_string / set_binary / remove
//!  └─ mutate under lock, then request_save()
//!       └─ Alarm (re)armed for the settle delay
//!            └─ fires: lock → GC → save → unlock
//!
//! flush_now() / cleanup()
//!  └─ cancel alarm, then lock → GC → save → unlock
//! ```

pub mod cache;
pub mod device;
pub mod legacy;
pub mod lifecycle;
pub mod scheduler;
pub mod settings;

pub use btconf_core::{ConfigFile, ConfigStore, GcPolicy, GcReport, StoreError};
pub use cache::{ConfigCache, DebounceState, SectionCursor, Sections};
pub use legacy::{LegacyTranscoder, NoLegacy};
pub use lifecycle::{InitError, LoadOrigin};
pub use scheduler::{Alarm, SchedulerError};
pub use settings::CacheSettings;
