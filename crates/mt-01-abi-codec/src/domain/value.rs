//! # ABI Values
//!
//! Loosely-typed values; the declared [`AbiType`](super::types::AbiType)
//! decides how each one is encoded.

use shared_types::{Address, U256};

/// A value to encode or a decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    /// 20-byte address.
    Address(Address),
    /// Boolean.
    Bool(bool),
    /// Unsigned integer.
    Uint(U256),
    /// Signed integer as a 256-bit two's-complement word.
    Int(U256),
    /// Fixed-size byte string; length must equal the declared size.
    FixedBytes(Vec<u8>),
    /// Dynamic byte string.
    Bytes(Vec<u8>),
    /// UTF-8 string.
    String(String),
    /// Elements of a dynamic or fixed array.
    Array(Vec<AbiValue>),
    /// Tuple members in declaration order.
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Unsigned integer from a `u64`.
    #[must_use]
    pub fn uint(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }

    /// String value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Array of strings.
    #[must_use]
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Array(values.into_iter().map(|s| Self::String(s.into())).collect())
    }

    /// Signed integer from an `i64`, sign-extended to 256 bits.
    #[must_use]
    pub fn int(value: i64) -> Self {
        if value >= 0 {
            Self::Int(U256::from(value as u64))
        } else {
            // two's complement: !(|v| - 1)
            Self::Int(!U256::from(value.unsigned_abs() - 1))
        }
    }

    /// Short name of the variant, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::Bool(_) => "bool",
            Self::Uint(_) => "uint",
            Self::Int(_) => "int",
            Self::FixedBytes(_) => "fixed bytes",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
        }
    }

    #[must_use]
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(a) => Some(*a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) | Self::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[AbiValue]> {
        match self {
            Self::Array(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<U256> for AbiValue {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<bool> for AbiValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
