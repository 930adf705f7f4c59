//! # ABI Type Tags
//!
//! The closed set of type tags the codec understands, with parsing from and
//! formatting to canonical type strings (`uint256`, `bytes32`, `string[]`,
//! `(string,string)[]`).

use super::errors::AbiError;
use super::WORD;
use std::fmt;

/// An ABI type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// 20-byte address.
    Address,
    /// Boolean, encoded as 0 or 1.
    Bool,
    /// Unsigned integer of the given bit width (8..=256, multiple of 8).
    Uint(usize),
    /// Two's-complement signed integer of the given bit width.
    Int(usize),
    /// Fixed-size byte string (1..=32 bytes).
    FixedBytes(usize),
    /// Dynamic byte string.
    Bytes,
    /// Dynamic UTF-8 string.
    String,
    /// Dynamic-length array.
    Array(Box<AbiType>),
    /// Fixed-length array.
    FixedArray(Box<AbiType>, usize),
    /// Tuple (struct).
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// Parse a canonical type string.
    pub fn parse(input: &str) -> Result<Self, AbiError> {
        let s = input.trim();
        let invalid = || AbiError::InvalidType(input.to_string());

        if let Some(stripped) = s.strip_suffix(']') {
            let open = stripped.rfind('[').ok_or_else(invalid)?;
            let inner = Self::parse(&stripped[..open])?;
            let size = &stripped[open + 1..];
            if size.is_empty() {
                return Ok(Self::Array(Box::new(inner)));
            }
            let n: usize = size.parse().map_err(|_| invalid())?;
            if n == 0 {
                return Err(invalid());
            }
            return Ok(Self::FixedArray(Box::new(inner), n));
        }

        if let Some(body) = s.strip_prefix('(') {
            let body = body.strip_suffix(')').ok_or_else(invalid)?;
            if body.trim().is_empty() {
                return Ok(Self::Tuple(Vec::new()));
            }
            let items = split_top_level(body)
                .ok_or_else(invalid)?
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::Tuple(items));
        }

        match s {
            "address" => Ok(Self::Address),
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes),
            "uint" => Ok(Self::Uint(256)),
            "int" => Ok(Self::Int(256)),
            _ => {
                if let Some(bits) = s.strip_prefix("uint") {
                    parse_bits(bits).map(Self::Uint).ok_or_else(invalid)
                } else if let Some(bits) = s.strip_prefix("int") {
                    parse_bits(bits).map(Self::Int).ok_or_else(invalid)
                } else if let Some(len) = s.strip_prefix("bytes") {
                    match len.parse::<usize>() {
                        Ok(n) if (1..=32).contains(&n) => Ok(Self::FixedBytes(n)),
                        _ => Err(invalid()),
                    }
                } else {
                    Err(invalid())
                }
            }
        }
    }

    /// Whether the encoding of this type uses an offset and a tail segment.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            Self::Tuple(items) => items.iter().any(Self::is_dynamic),
            _ => false,
        }
    }

    /// Whether the type is a single-word value type, the only kind that may
    /// be stored in an event topic.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            Self::Address | Self::Bool | Self::Uint(_) | Self::Int(_) | Self::FixedBytes(_)
        )
    }

    /// Bytes this type occupies in the head of an enclosing tuple.
    #[must_use]
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return WORD;
        }
        match self {
            Self::FixedArray(inner, n) => inner.head_size() * n,
            Self::Tuple(items) => items.iter().map(Self::head_size).sum(),
            _ => WORD,
        }
    }
}

fn parse_bits(bits: &str) -> Option<usize> {
    let n: usize = bits.parse().ok()?;
    (n > 0 && n <= 256 && n % 8 == 0).then_some(n)
}

/// Split a tuple body on top-level commas.
fn split_top_level(body: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(&body[start..]);
    Some(parts)
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::FixedBytes(n) => write!(f, "bytes{n}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::FixedArray(inner, n) => write!(f, "{inner}[{n}]"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}
