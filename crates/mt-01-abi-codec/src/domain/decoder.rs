//! # Tuple Decoder
//!
//! Strict head/tail decoding. Every offset and length is bounds-checked
//! against the input, padding must be canonical and, for [`decode`], the
//! input must be consumed exactly.

use super::encoder::int_fits;
use super::errors::AbiError;
use super::types::AbiType;
use super::value::AbiValue;
use super::WORD;
use shared_types::U256;

/// Decode `data` as a tuple of `types`, rejecting trailing bytes.
pub fn decode(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let (values, end) = decode_tuple(types, data, 0)?;
    if end != data.len() {
        return Err(AbiError::ResidualData {
            consumed: end,
            total: data.len(),
        });
    }
    Ok(values)
}

/// Decode `data` as a tuple of `types`, ignoring trailing bytes.
pub fn decode_partial(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    decode_tuple(types, data, 0).map(|(values, _)| values)
}

/// Decode a single topic word as a value type.
pub fn decode_word(ty: &AbiType, word: &[u8; WORD]) -> Result<AbiValue, AbiError> {
    if !ty.is_value_type() {
        return Err(AbiError::UnsupportedIndexedType {
            name: String::new(),
            ty: ty.to_string(),
        });
    }
    decode_value(ty, word, 0).map(|(value, _)| value)
}

/// Decode a tuple whose heads start at `base`.
///
/// Returns the values and the end of the furthest region read.
fn decode_tuple(types: &[AbiType], data: &[u8], base: usize) -> Result<(Vec<AbiValue>, usize), AbiError> {
    let heads_len: usize = types.iter().map(AbiType::head_size).sum();
    let mut end = checked_end(base, heads_len, data.len())?;
    let mut head_pos = base;
    let mut values = Vec::with_capacity(types.len());

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, head_pos)?;
            let start = base
                .checked_add(offset)
                .ok_or_else(|| AbiError::InvalidOffset(format!("offset {offset} overflows")))?;
            let (value, value_end) = decode_value(ty, data, start)?;
            end = end.max(value_end);
            values.push(value);
            head_pos += WORD;
        } else {
            let (value, _) = decode_value(ty, data, head_pos)?;
            values.push(value);
            head_pos += ty.head_size();
        }
    }

    Ok((values, end))
}

fn decode_value(ty: &AbiType, data: &[u8], at: usize) -> Result<(AbiValue, usize), AbiError> {
    match ty {
        AbiType::Address => {
            let w = read_word(data, at)?;
            if w[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::InvalidPadding(ty.to_string()));
            }
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&w[12..]);
            Ok((AbiValue::Address(addr), at + WORD))
        }
        AbiType::Bool => {
            let v = U256::from_big_endian(read_word(data, at)?);
            if v > U256::one() {
                return Err(AbiError::ValueOutOfRange(ty.to_string()));
            }
            Ok((AbiValue::Bool(!v.is_zero()), at + WORD))
        }
        AbiType::Uint(bits) => {
            let v = U256::from_big_endian(read_word(data, at)?);
            if v.bits() > *bits {
                return Err(AbiError::ValueOutOfRange(ty.to_string()));
            }
            Ok((AbiValue::Uint(v), at + WORD))
        }
        AbiType::Int(bits) => {
            let v = U256::from_big_endian(read_word(data, at)?);
            if !int_fits(v, *bits) {
                return Err(AbiError::ValueOutOfRange(ty.to_string()));
            }
            Ok((AbiValue::Int(v), at + WORD))
        }
        AbiType::FixedBytes(n) => {
            let w = read_word(data, at)?;
            if w[*n..].iter().any(|b| *b != 0) {
                return Err(AbiError::InvalidPadding(ty.to_string()));
            }
            Ok((AbiValue::FixedBytes(w[..*n].to_vec()), at + WORD))
        }
        AbiType::Bytes => {
            let (bytes, end) = read_packed_bytes(data, at)?;
            Ok((AbiValue::Bytes(bytes.to_vec()), end))
        }
        AbiType::String => {
            let (bytes, end) = read_packed_bytes(data, at)?;
            let s = std::str::from_utf8(bytes).map_err(|_| AbiError::InvalidUtf8)?;
            Ok((AbiValue::String(s.to_string()), end))
        }
        AbiType::Array(inner) => {
            let len = read_usize(data, at)?;
            // every element occupies at least one head word
            let available = data.len().saturating_sub(at + WORD) / WORD;
            if len > available {
                return Err(AbiError::InvalidOffset(format!(
                    "array length {len} exceeds remaining {available} words"
                )));
            }
            let types = vec![(**inner).clone(); len];
            let (items, end) = decode_tuple(&types, data, at + WORD)?;
            Ok((AbiValue::Array(items), end))
        }
        AbiType::FixedArray(inner, n) => {
            let types = vec![(**inner).clone(); *n];
            let (items, end) = decode_tuple(&types, data, at)?;
            Ok((AbiValue::Array(items), end))
        }
        AbiType::Tuple(types) => {
            let (items, end) = decode_tuple(types, data, at)?;
            Ok((AbiValue::Tuple(items), end))
        }
    }
}

fn read_packed_bytes(data: &[u8], at: usize) -> Result<(&[u8], usize), AbiError> {
    let len = read_usize(data, at)?;
    let start = at + WORD;
    let padded = len
        .checked_add(WORD - 1)
        .map(|n| n / WORD * WORD)
        .ok_or_else(|| AbiError::InvalidOffset(format!("length {len} overflows")))?;
    let end = checked_end(start, padded, data.len())?;
    if data[start + len..end].iter().any(|b| *b != 0) {
        return Err(AbiError::InvalidPadding("bytes".into()));
    }
    Ok((&data[start..start + len], end))
}

fn checked_end(start: usize, len: usize, available: usize) -> Result<usize, AbiError> {
    match start.checked_add(len) {
        Some(end) if end <= available => Ok(end),
        Some(end) => Err(AbiError::InsufficientData {
            needed: end,
            available,
        }),
        None => Err(AbiError::InvalidOffset(format!("{start} + {len} overflows"))),
    }
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], AbiError> {
    let end = checked_end(at, WORD, data.len())?;
    Ok(&data[at..end])
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, AbiError> {
    let v = U256::from_big_endian(read_word(data, at)?);
    if v > U256::from(u32::MAX) {
        return Err(AbiError::InvalidOffset(format!("word {v} too large")));
    }
    Ok(v.low_u64() as usize)
}
