//! # Domain Entities
//!
//! Signing domain, typed messages and recoverable signatures.

use super::errors::SigningError;
use mt_01_abi_codec::AbiValue;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::BTreeMap;

/// Name of the fixed domain struct.
pub const DOMAIN_TYPE: &str = "EIP712Domain";

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

// =============================================================================
// Signing Domain
// =============================================================================

/// Separates signatures of one application/contract/chain from all others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// The domain as a message of the fixed `EIP712Domain` struct.
    pub fn to_typed_message(&self) -> TypedMessage {
        TypedMessage::new(
            DOMAIN_TYPE,
            vec![
                TypedField::new("name", "string"),
                TypedField::new("version", "string"),
                TypedField::new("chainId", "uint256"),
                TypedField::new("verifyingContract", "address"),
            ],
        )
        .with_value("name", AbiValue::string(self.name.clone()))
        .with_value("version", AbiValue::string(self.version.clone()))
        .with_value("chainId", AbiValue::uint(self.chain_id))
        .with_value("verifyingContract", AbiValue::Address(self.verifying_contract))
    }
}

// =============================================================================
// Typed Messages
// =============================================================================

/// One member of a struct schema, e.g. `uint256 rootNode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedField {
    pub name: String,
    /// ABI type string or the name of another struct, optionally with
    /// array suffixes.
    pub ty: String,
}

impl TypedField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A field value: a plain ABI value, a nested struct, or an array of either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Value(AbiValue),
    Struct(BTreeMap<String, TypedValue>),
    Array(Vec<TypedValue>),
}

impl From<AbiValue> for TypedValue {
    fn from(value: AbiValue) -> Self {
        Self::Value(value)
    }
}

/// A transient structured message: primary type, struct schemas and values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedMessage {
    primary_type: String,
    types: BTreeMap<String, Vec<TypedField>>,
    values: BTreeMap<String, TypedValue>,
}

impl TypedMessage {
    /// Message of `primary_type` with the given field schema and no values.
    pub fn new(primary_type: impl Into<String>, fields: Vec<TypedField>) -> Self {
        let primary_type = primary_type.into();
        let mut types = BTreeMap::new();
        types.insert(primary_type.clone(), fields);
        Self {
            primary_type,
            types,
            values: BTreeMap::new(),
        }
    }

    /// Register a struct type referenced by a field.
    #[must_use]
    pub fn with_struct_type(mut self, name: impl Into<String>, fields: Vec<TypedField>) -> Self {
        self.types.insert(name.into(), fields);
        self
    }

    #[must_use]
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<TypedValue>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    pub fn types(&self) -> &BTreeMap<String, Vec<TypedField>> {
        &self.types
    }

    pub fn values(&self) -> &BTreeMap<String, TypedValue> {
        &self.values
    }

    pub fn value(&self, field: &str) -> Option<&TypedValue> {
        self.values.get(field)
    }
}

// =============================================================================
// Signatures
// =============================================================================

/// ECDSA signature on the secp256k1 curve with its recovery id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl RecoverableSignature {
    /// Parse `r || s || v`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SigningError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SigningError::invalid_signature(format!(
                "expected {SIGNATURE_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Serialize as `r || s || v`.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}
