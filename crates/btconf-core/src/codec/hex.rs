//! Hex codec for binary property values.
//!
//! Stored format:
//! ```text
//! bytes  [0x1f, 0xa0]
//! string "1fa0"
//! ```
//! Each byte is written as two lowercase hex digits, high nibble first.
//! Decoding accepts either case but rejects odd-length strings and any
//! non-hex character.  A failed decode never writes to the output buffer.

use thiserror::Error;

const LOOKUP: &[u8; 16] = b"0123456789abcdef";

/// Errors that can occur while encoding or decoding a hex value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The stored string has an odd number of characters.
    #[error("hex value has odd length {0}")]
    OddLength(usize),

    /// A character outside `0-9a-fA-F` was found.
    #[error("invalid hex digit at index {index}")]
    InvalidDigit { index: usize },

    /// The caller's buffer cannot hold the decoded bytes.
    #[error("output buffer too small: need {needed} bytes, got {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// The scratch string for the encoded value could not be allocated.
    #[error("could not allocate {0} bytes for encoded value")]
    Alloc(usize),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `bytes` as lowercase hex, high nibble first.
///
/// # Errors
///
/// Returns [`CodecError::Alloc`] if the output string cannot be allocated.
///
/// # Examples
///
/// ```rust
/// use btconf_core::codec::hex::encode_hex;
///
/// assert_eq!(encode_hex(&[0x1f, 0xa0]).unwrap(), "1fa0");
/// ```
pub fn encode_hex(bytes: &[u8]) -> Result<String, CodecError> {
    let len = bytes.len().checked_mul(2).ok_or(CodecError::Alloc(usize::MAX))?;
    let mut out = String::new();
    out.try_reserve_exact(len).map_err(|_| CodecError::Alloc(len))?;

    for &b in bytes {
        out.push(LOOKUP[usize::from(b >> 4)] as char);
        out.push(LOOKUP[usize::from(b & 0x0F)] as char);
    }
    Ok(out)
}

/// Validates `value` and returns the number of bytes it decodes to.
///
/// # Errors
///
/// Returns [`CodecError::OddLength`] or [`CodecError::InvalidDigit`] when
/// `value` is not a well-formed hex string.
pub fn decoded_len(value: &str) -> Result<usize, CodecError> {
    let raw = value.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(CodecError::OddLength(raw.len()));
    }
    if let Some(index) = raw.iter().position(|c| !c.is_ascii_hexdigit()) {
        return Err(CodecError::InvalidDigit { index });
    }
    Ok(raw.len() / 2)
}

/// Decodes `value` into the front of `out` and returns the decoded length.
///
/// The whole string is validated before the first byte is written, so on
/// error `out` is left untouched.
///
/// # Errors
///
/// Returns [`CodecError::OddLength`], [`CodecError::InvalidDigit`] or
/// [`CodecError::BufferTooSmall`].
///
/// # Examples
///
/// ```rust
/// use btconf_core::codec::hex::decode_hex_into;
///
/// let mut buf = [0u8; 4];
/// let n = decode_hex_into("1fa0", &mut buf).unwrap();
/// assert_eq!(&buf[..n], &[0x1f, 0xa0]);
/// ```
pub fn decode_hex_into(value: &str, out: &mut [u8]) -> Result<usize, CodecError> {
    let needed = decoded_len(value)?;
    if out.len() < needed {
        return Err(CodecError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }

    for (slot, pair) in out.iter_mut().zip(value.as_bytes().chunks_exact(2)) {
        *slot = (nibble(pair[0]) << 4) | nibble(pair[1]);
    }
    Ok(needed)
}

/// Decodes `value` into a freshly allocated vector.
///
/// # Errors
///
/// Returns [`CodecError::OddLength`] or [`CodecError::InvalidDigit`].
pub fn decode_hex(value: &str) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![0u8; decoded_len(value)?];
    decode_hex_into(value, &mut out)?;
    Ok(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Value of a single hex digit.  Callers validate the digit first.
fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_writes_high_nibble_first() {
        // Arrange
        let bytes = [0x12, 0xab];

        // Act
        let encoded = encode_hex(&bytes).unwrap();

        // Assert
        assert_eq!(encoded, "12ab");
    }

    #[test]
    fn test_encode_uses_lowercase_digits() {
        assert_eq!(encode_hex(&[0xFE, 0xDC]).unwrap(), "fedc");
    }

    #[test]
    fn test_encode_empty_slice_is_empty_string() {
        assert_eq!(encode_hex(&[]).unwrap(), "");
    }

    #[test]
    fn test_every_byte_value_survives_encode_then_decode() {
        // A nibble-order mismatch between encoder and decoder shows up here
        // for any byte whose two nibbles differ (e.g. 0x12 -> 0x21).
        let all: Vec<u8> = (0..=255u8).collect();

        let encoded = encode_hex(&all).unwrap();
        let decoded = decode_hex(&encoded).unwrap();

        assert_eq!(decoded, all);
    }

    #[test]
    fn test_decode_accepts_uppercase_digits() {
        assert_eq!(decode_hex("ABcd").unwrap(), vec![0xab, 0xcd]);
    }

    #[test]
    fn test_decoded_len_is_half_the_string_length() {
        assert_eq!(decoded_len("00112233").unwrap(), 4);
        assert_eq!(decoded_len("").unwrap(), 0);
    }

    #[test]
    fn test_decoded_len_rejects_odd_length() {
        assert_eq!(decoded_len("abc"), Err(CodecError::OddLength(3)));
    }

    #[test]
    fn test_decoded_len_rejects_non_hex_character() {
        assert_eq!(
            decoded_len("00zz"),
            Err(CodecError::InvalidDigit { index: 2 })
        );
    }

    #[test]
    fn test_decode_into_rejects_small_buffer_without_writing() {
        // Arrange
        let mut buf = [0x55u8; 1];

        // Act
        let result = decode_hex_into("0102", &mut buf);

        // Assert
        assert_eq!(
            result,
            Err(CodecError::BufferTooSmall {
                needed: 2,
                available: 1
            })
        );
        assert_eq!(buf, [0x55], "buffer must be untouched on failure");
    }

    #[test]
    fn test_decode_into_leaves_buffer_untouched_on_bad_digit() {
        let mut buf = [0x55u8; 4];

        let result = decode_hex_into("01g2", &mut buf);

        assert!(result.is_err());
        assert_eq!(buf, [0x55; 4]);
    }

    #[test]
    fn test_decode_into_larger_buffer_only_fills_prefix() {
        let mut buf = [0xEEu8; 4];

        let n = decode_hex_into("a1b2", &mut buf).unwrap();

        assert_eq!(n, 2);
        assert_eq!(buf, [0xa1, 0xb2, 0xEE, 0xEE]);
    }

    #[test]
    fn test_decode_rejects_multibyte_utf8() {
        // 'é' is two bytes in UTF-8, making the length even but not hex.
        assert!(matches!(
            decode_hex("aé"),
            Err(CodecError::OddLength(_)) | Err(CodecError::InvalidDigit { .. })
        ));
    }
}
