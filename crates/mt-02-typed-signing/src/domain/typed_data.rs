//! # Structured Data Hashing
//!
//! `encodeType`, `hashStruct` and the final `0x1901` digest.
//!
//! - Referenced struct types are appended to the type string sorted by name.
//! - `string` and `bytes` values are hashed; arrays hash the concatenation
//!   of their encoded members; nested structs contribute their struct hash.
//! - Value types are packed as one left-padded 32-byte word.

use super::entities::{Eip712Domain, TypedField, TypedMessage, TypedValue};
use super::errors::SigningError;
use mt_01_abi_codec::{encode, keccak256, AbiType, AbiValue};
use shared_types::Hash;
use std::collections::{BTreeMap, BTreeSet};

/// Prefix of every structured-data digest.
pub const DIGEST_PREFIX: [u8; 2] = [0x19, 0x01];

type Schema = BTreeMap<String, Vec<TypedField>>;

/// `keccak256(0x1901 || domainSeparator || hashStruct(message))`
pub fn build_digest(domain: &Eip712Domain, message: &TypedMessage) -> Result<Hash, SigningError> {
    digest_with_separator(&domain_separator(domain)?, message)
}

/// [`build_digest`] with a precomputed domain separator.
pub(crate) fn digest_with_separator(separator: &Hash, message: &TypedMessage) -> Result<Hash, SigningError> {
    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.extend_from_slice(&DIGEST_PREFIX);
    preimage.extend_from_slice(separator);
    preimage.extend_from_slice(&hash_struct(message)?);
    Ok(keccak256(&preimage))
}

/// Struct hash of the domain under the fixed `EIP712Domain` schema.
pub fn domain_separator(domain: &Eip712Domain) -> Result<Hash, SigningError> {
    hash_struct(&domain.to_typed_message())
}

/// Struct hash of the message's primary type.
pub fn hash_struct(message: &TypedMessage) -> Result<Hash, SigningError> {
    hash_struct_of(message.primary_type(), message.types(), message.values())
}

/// Canonical type string of the message's primary type.
pub fn encode_type(message: &TypedMessage) -> Result<String, SigningError> {
    encode_type_of(message.primary_type(), message.types())
}

fn encode_type_of(primary: &str, types: &Schema) -> Result<String, SigningError> {
    let mut deps = BTreeSet::new();
    collect_dependencies(primary, types, &mut deps)?;
    deps.remove(primary);

    let mut out = render_struct(primary, types)?;
    for dep in deps {
        out.push_str(&render_struct(dep, types)?);
    }
    Ok(out)
}

fn collect_dependencies<'a>(
    name: &'a str,
    types: &'a Schema,
    deps: &mut BTreeSet<&'a str>,
) -> Result<(), SigningError> {
    if !deps.insert(name) {
        return Ok(());
    }
    for field in fields_of(name, types)? {
        let base = base_type(&field.ty);
        if types.contains_key(base) {
            collect_dependencies(base, types, deps)?;
        }
    }
    Ok(())
}

fn render_struct(name: &str, types: &Schema) -> Result<String, SigningError> {
    let members: Vec<String> = fields_of(name, types)?
        .iter()
        .map(|f| format!("{} {}", f.ty, f.name))
        .collect();
    Ok(format!("{name}({})", members.join(",")))
}

fn fields_of<'a>(name: &str, types: &'a Schema) -> Result<&'a [TypedField], SigningError> {
    types
        .get(name)
        .map(Vec::as_slice)
        .ok_or_else(|| SigningError::typed_data(format!("undefined struct type {name}")))
}

fn hash_struct_of(
    name: &str,
    types: &Schema,
    values: &BTreeMap<String, TypedValue>,
) -> Result<Hash, SigningError> {
    let fields = fields_of(name, types)?;
    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&keccak256(encode_type_of(name, types)?.as_bytes()));

    for field in fields {
        let value = values
            .get(&field.name)
            .ok_or_else(|| SigningError::typed_data(format!("missing value for {name}.{}", field.name)))?;
        encoded.extend_from_slice(&encode_field(&field.ty, value, types)?);
    }
    Ok(keccak256(&encoded))
}

/// One 32-byte member of a struct encoding.
fn encode_field(ty: &str, value: &TypedValue, types: &Schema) -> Result<Hash, SigningError> {
    if let Some((inner, len)) = split_array(ty) {
        let items: Vec<TypedValue> = match value {
            TypedValue::Array(items) => items.clone(),
            TypedValue::Value(AbiValue::Array(items)) => items.iter().cloned().map(TypedValue::Value).collect(),
            _ => return Err(mismatch(ty, value)),
        };
        if let Some(n) = len.filter(|n| *n != items.len()) {
            return Err(SigningError::typed_data(format!("{ty} requires {n} items, got {}", items.len())));
        }
        let mut concat = Vec::with_capacity(32 * items.len());
        for item in &items {
            concat.extend_from_slice(&encode_field(inner, item, types)?);
        }
        return Ok(keccak256(&concat));
    }

    if types.contains_key(ty) {
        return match value {
            TypedValue::Struct(members) => hash_struct_of(ty, types, members),
            _ => Err(mismatch(ty, value)),
        };
    }

    match (ty, value) {
        ("string", TypedValue::Value(AbiValue::String(s))) => Ok(keccak256(s.as_bytes())),
        ("bytes", TypedValue::Value(AbiValue::Bytes(b))) => Ok(keccak256(b)),
        (_, TypedValue::Value(v)) => {
            let abi = AbiType::parse(ty).map_err(|e| SigningError::typed_data(e.to_string()))?;
            if !abi.is_value_type() {
                return Err(SigningError::typed_data(format!("unsupported member type {ty}")));
            }
            let word = encode(&[abi], std::slice::from_ref(v)).map_err(|e| SigningError::typed_data(e.to_string()))?;
            let mut out = [0u8; 32];
            out.copy_from_slice(&word);
            Ok(out)
        }
        _ => Err(mismatch(ty, value)),
    }
}

/// Split `T[]` / `T[n]` into `T` and the optional fixed length.
fn split_array(ty: &str) -> Option<(&str, Option<usize>)> {
    let body = ty.strip_suffix(']')?;
    let open = body.rfind('[')?;
    let len = body[open + 1..].parse().ok();
    Some((&body[..open], len))
}

fn base_type(ty: &str) -> &str {
    ty.find('[').map_or(ty, |i| &ty[..i])
}

fn mismatch(ty: &str, value: &TypedValue) -> SigningError {
    let found = match value {
        TypedValue::Value(v) => v.kind(),
        TypedValue::Struct(_) => "struct",
        TypedValue::Array(_) => "array",
    };
    SigningError::typed_data(format!("expected {ty}, got {found}"))
}
