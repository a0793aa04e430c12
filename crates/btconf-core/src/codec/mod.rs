//! Value codecs for the config store.

pub mod hex;

pub use hex::{decode_hex, decode_hex_into, decoded_len, encode_hex, CodecError};
