//! # btconf-core
//!
//! Building blocks for the persistent Bluetooth device configuration cache.
//!
//! This crate has no threads, no timers and no global state.  It is used by
//! the `btconf` runtime crate, which adds locking, debounced persistence and
//! the init/cleanup lifecycle on top of it.
//!
//! # Architecture overview
//!
//! The cache stores per-device records (pairing metadata, link keys,
//! attributes discovered during inquiry scans) as string properties grouped
//! into named sections.  This crate defines:
//!
//! - **`codec`** – How raw byte blobs (keys, feature masks) are turned into
//!   the store's string representation and back.
//!
//! - **`store`** – The [`ConfigStore`] capability the cache is written
//!   against, plus [`ConfigFile`], an ordered in-memory implementation that
//!   can load itself from and save itself to disk.
//!
//! - **`address`** – Recognises section names shaped like device addresses.
//!
//! - **`gc`** – Decides which scan-discovered device sections are pruned at
//!   flush time, never touching sections that hold credentials.

pub mod address;
pub mod codec;
pub mod gc;
pub mod store;

pub use address::is_device_address;
pub use codec::hex::{decode_hex, decode_hex_into, decoded_len, encode_hex, CodecError};
pub use gc::{GcPolicy, GcReport, CREDENTIAL_PROPERTIES};
pub use store::{ConfigFile, ConfigStore, StoreError};
