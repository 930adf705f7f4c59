//! # Hex Wire Encoding
//!
//! `0x`-prefixed hex helpers for addresses, hashes and byte blobs.

use crate::entities::{Address, Hash};
use crate::errors::EncodingError;

/// Encode bytes as `0x`-prefixed lowercase hex.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a hex string, with or without the `0x` prefix.
pub fn from_hex(field: &'static str, value: &str) -> Result<Vec<u8>, EncodingError> {
    let trimmed = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(trimmed).map_err(|e| EncodingError::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

fn fixed<const N: usize>(field: &'static str, value: &str) -> Result<[u8; N], EncodingError> {
    let bytes = from_hex(field, value)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| EncodingError::InvalidLength {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

/// Parse a 20-byte address.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address, EncodingError> {
    fixed::<20>(field, value)
}

/// Parse a 32-byte hash.
pub fn parse_hash(field: &'static str, value: &str) -> Result<Hash, EncodingError> {
    fixed::<32>(field, value)
}
