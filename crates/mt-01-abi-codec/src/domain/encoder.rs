//! # Tuple Encoder
//!
//! Head/tail encoding of typed values.

use super::errors::AbiError;
use super::hashing::function_selector;
use super::types::AbiType;
use super::value::AbiValue;
use super::WORD;
use shared_types::U256;

/// Encode `values` as a tuple of `types`.
pub fn encode(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    if types.len() != values.len() {
        return Err(AbiError::ArityMismatch {
            expected: types.len(),
            actual: values.len(),
        });
    }
    let mut out = Vec::new();
    encode_tuple(types, values, &mut out)?;
    Ok(out)
}

/// Encode a call: 4-byte selector of `name(types...)` followed by the
/// tuple encoding of the arguments.
pub fn encode_call(name: &str, types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    let signature = canonical_signature(name, types);
    let mut out = function_selector(&signature).to_vec();
    out.extend(encode(types, values)?);
    Ok(out)
}

/// `name(type1,type2,...)`.
pub(crate) fn canonical_signature(name: &str, types: &[AbiType]) -> String {
    let args: Vec<String> = types.iter().map(ToString::to_string).collect();
    format!("{name}({})", args.join(","))
}

fn encode_tuple(types: &[AbiType], values: &[AbiValue], out: &mut Vec<u8>) -> Result<(), AbiError> {
    let heads_len: usize = types.iter().map(AbiType::head_size).sum();
    let mut head = Vec::with_capacity(heads_len);
    let mut tail = Vec::new();

    for (ty, value) in types.iter().zip(values) {
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(heads_len + tail.len()));
            encode_value(ty, value, &mut tail)?;
        } else {
            encode_value(ty, value, &mut head)?;
        }
    }

    out.extend(head);
    out.extend(tail);
    Ok(())
}

/// Encode a single value into `out`. Static values are written in place,
/// dynamic values as their tail segment.
pub(crate) fn encode_value(ty: &AbiType, value: &AbiValue, out: &mut Vec<u8>) -> Result<(), AbiError> {
    let mismatch = || AbiError::TypeMismatch {
        expected: ty.to_string(),
        found: value.kind(),
    };

    match (ty, value) {
        (AbiType::Address, AbiValue::Address(addr)) => {
            out.extend_from_slice(&[0u8; 12]);
            out.extend_from_slice(addr);
        }
        (AbiType::Bool, AbiValue::Bool(b)) => {
            out.extend_from_slice(&u256_word(U256::from(u8::from(*b))));
        }
        (AbiType::Uint(bits), AbiValue::Uint(v)) => {
            if v.bits() > *bits {
                return Err(AbiError::ValueOutOfRange(ty.to_string()));
            }
            out.extend_from_slice(&u256_word(*v));
        }
        (AbiType::Int(bits), AbiValue::Int(v)) => {
            if !int_fits(*v, *bits) {
                return Err(AbiError::ValueOutOfRange(ty.to_string()));
            }
            out.extend_from_slice(&u256_word(*v));
        }
        (AbiType::FixedBytes(n), AbiValue::FixedBytes(bytes)) => {
            if bytes.len() != *n {
                return Err(AbiError::ValueOutOfRange(ty.to_string()));
            }
            let mut word = [0u8; WORD];
            word[..*n].copy_from_slice(bytes);
            out.extend_from_slice(&word);
        }
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => encode_packed_bytes(bytes, out),
        (AbiType::String, AbiValue::String(s)) => encode_packed_bytes(s.as_bytes(), out),
        (AbiType::Array(inner), AbiValue::Array(items)) => {
            out.extend_from_slice(&usize_word(items.len()));
            let types = vec![(**inner).clone(); items.len()];
            encode_tuple(&types, items, out)?;
        }
        (AbiType::FixedArray(inner, n), AbiValue::Array(items)) => {
            if items.len() != *n {
                return Err(AbiError::ArityMismatch {
                    expected: *n,
                    actual: items.len(),
                });
            }
            let types = vec![(**inner).clone(); *n];
            encode_tuple(&types, items, out)?;
        }
        (AbiType::Tuple(types), AbiValue::Tuple(items)) => {
            if types.len() != items.len() {
                return Err(AbiError::ArityMismatch {
                    expected: types.len(),
                    actual: items.len(),
                });
            }
            encode_tuple(types, items, out)?;
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}

fn encode_packed_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    let rem = bytes.len() % WORD;
    if rem != 0 {
        out.extend(std::iter::repeat(0u8).take(WORD - rem));
    }
}

/// Whether a two's-complement word is representable in `bits` bits.
pub(crate) fn int_fits(v: U256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    // bits [bits-1, 255] must be all zero or all one
    let high = v >> (bits - 1);
    high.is_zero() || high == (U256::MAX >> (bits - 1))
}

/// Big-endian 32-byte word of a `U256`.
pub(crate) fn u256_word(v: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    v.to_big_endian(&mut word);
    word
}

fn usize_word(n: usize) -> [u8; WORD] {
    u256_word(U256::from(n))
}
