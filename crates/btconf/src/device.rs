//! Lookups of well-known per-device properties.
//!
//! Device sections are keyed by the remote address string; formatting that
//! string from raw address bytes is the caller's job.

use tracing::debug;

use crate::cache::ConfigCache;

/// Scope label used for remote device records.
pub const REMOTE_SCOPE: &str = "Remote";

/// Property holding the device type (classic, LE or dual mode).
pub const DEV_TYPE: &str = "DevType";

/// Property holding the LE address type (public or random).
pub const ADDR_TYPE: &str = "AddrType";

impl ConfigCache {
    /// Stored device type for `address`.
    pub fn device_type(&self, address: &str) -> Option<i32> {
        let value = self.get_int(REMOTE_SCOPE, address, DEV_TYPE)?;
        debug!("device [{address}] type {value}");
        Some(value)
    }

    /// Stored address type for `address`.
    pub fn address_type(&self, address: &str) -> Option<i32> {
        let value = self.get_int(REMOTE_SCOPE, address, ADDR_TYPE)?;
        debug!("device [{address}] address type {value}");
        Some(value)
    }
}
