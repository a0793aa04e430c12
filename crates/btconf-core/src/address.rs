//! Recognition of device-address-shaped section names.
//!
//! Per-device sections are named after the remote device's address in the
//! usual colon-separated form, e.g. `00:1a:7d:da:71:13`.  Fixed sections such
//! as `Adapter` never match, which keeps them out of garbage collection.

/// Length of `xx:xx:xx:xx:xx:xx`.
const ADDRESS_STR_LEN: usize = 17;

/// Returns `true` if `s` looks like a device address: six two-digit hex
/// groups separated by `:`.  Either case is accepted.
///
/// # Examples
///
/// ```rust
/// use btconf_core::is_device_address;
///
/// assert!(is_device_address("00:1A:7d:da:71:13"));
/// assert!(!is_device_address("Adapter"));
/// ```
pub fn is_device_address(s: &str) -> bool {
    let raw = s.as_bytes();
    if raw.len() != ADDRESS_STR_LEN {
        return false;
    }

    raw.iter().enumerate().all(|(i, &c)| {
        if i % 3 == 2 {
            c == b':'
        } else {
            c.is_ascii_hexdigit()
        }
    })
}
