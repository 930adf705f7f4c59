//! # Function and Event Descriptors
//!
//! Data-driven shapes for calls and logs. Signature hashes and selectors are
//! computed once at construction.

use super::decoder::{decode, decode_word};
use super::encoder::{canonical_signature, encode, encode_value};
use super::errors::AbiError;
use super::hashing::{function_selector, keccak256};
use super::types::AbiType;
use super::value::AbiValue;
use shared_types::{Hash, RawLog};

/// Maximum number of indexed arguments of a non-anonymous event.
pub const MAX_INDEXED: usize = 3;

/// A named, typed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: AbiType,
    /// Stored in a topic rather than the data payload (events only).
    pub indexed: bool,
}

impl Param {
    /// Non-indexed parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: AbiType) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: false,
        }
    }

    /// Indexed parameter.
    #[must_use]
    pub fn indexed(name: impl Into<String>, ty: AbiType) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: true,
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Shape of a ledger event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDescriptor {
    name: String,
    inputs: Vec<Param>,
    signature: String,
    topic0: Hash,
}

/// A log decoded against its descriptor. Values are in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    pub event: String,
    pub values: Vec<(String, AbiValue)>,
}

impl DecodedLog {
    /// Look up a decoded argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AbiValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl EventDescriptor {
    /// Build a descriptor, rejecting indexed arguments that are not
    /// single-word value types.
    pub fn new(name: impl Into<String>, inputs: Vec<Param>) -> Result<Self, AbiError> {
        let name = name.into();
        for p in inputs.iter().filter(|p| p.indexed) {
            if !p.ty.is_value_type() {
                return Err(AbiError::UnsupportedIndexedType {
                    name: p.name.clone(),
                    ty: p.ty.to_string(),
                });
            }
        }
        let indexed = inputs.iter().filter(|p| p.indexed).count();
        if indexed > MAX_INDEXED {
            return Err(AbiError::InvalidInterface(format!(
                "event {name} has {indexed} indexed arguments (max {MAX_INDEXED})"
            )));
        }
        let types: Vec<AbiType> = inputs.iter().map(|p| p.ty.clone()).collect();
        let signature = canonical_signature(&name, &types);
        let topic0 = keccak256(signature.as_bytes());
        Ok(Self {
            name,
            inputs,
            signature,
            topic0,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    /// Canonical signature, e.g. `NodeMinted(uint256,uint256)`.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Hash of the signature; the first topic of every matching log.
    #[must_use]
    pub fn topic0(&self) -> Hash {
        self.topic0
    }

    /// Whether `log` was emitted by this event.
    #[must_use]
    pub fn matches(&self, log: &RawLog) -> bool {
        log.signature_topic() == Some(&self.topic0)
    }

    fn indexed_count(&self) -> usize {
        self.inputs.iter().filter(|p| p.indexed).count()
    }

    /// Decode a raw log.
    ///
    /// `topics[0]` is skipped; the remaining topics map, in order, to the
    /// indexed arguments. `data` carries the non-indexed arguments as a tuple
    /// and must be consumed exactly. Every failure is reported as
    /// [`AbiError::MalformedLog`].
    pub fn decode_log(&self, topics: &[Hash], data: &[u8]) -> Result<DecodedLog, AbiError> {
        let expected = self.indexed_count() + 1;
        if topics.len() != expected {
            return Err(AbiError::MalformedLog {
                event: self.name.clone(),
                reason: format!("expected {expected} topics, got {}", topics.len()),
            });
        }

        let data_types: Vec<AbiType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.ty.clone())
            .collect();
        let mut data_values = decode(&data_types, data)
            .map_err(|e| e.into_malformed_log(&self.name))?
            .into_iter();
        let mut topic_words = topics[1..].iter();

        let mut values = Vec::with_capacity(self.inputs.len());
        for param in &self.inputs {
            let value = if param.indexed {
                match topic_words.next() {
                    Some(word) => decode_word(&param.ty, word).map_err(|e| e.into_malformed_log(&self.name))?,
                    None => return Err(self.missing(&param.name)),
                }
            } else {
                match data_values.next() {
                    Some(v) => v,
                    None => return Err(self.missing(&param.name)),
                }
            };
            values.push((param.name.clone(), value));
        }

        Ok(DecodedLog {
            event: self.name.clone(),
            values,
        })
    }

    /// Decode a [`RawLog`], checking its signature topic first.
    pub fn decode_raw(&self, log: &RawLog) -> Result<DecodedLog, AbiError> {
        if !self.matches(log) {
            return Err(AbiError::MalformedLog {
                event: self.name.clone(),
                reason: "signature topic mismatch".into(),
            });
        }
        self.decode_log(&log.topics, &log.data)
    }

    /// Build the log this event would emit for `values` (declaration order).
    pub fn encode_log(&self, values: &[AbiValue]) -> Result<RawLog, AbiError> {
        if values.len() != self.inputs.len() {
            return Err(AbiError::ArityMismatch {
                expected: self.inputs.len(),
                actual: values.len(),
            });
        }

        let mut topics = vec![self.topic0];
        let mut data_types = Vec::new();
        let mut data_values = Vec::new();
        for (param, value) in self.inputs.iter().zip(values) {
            if param.indexed {
                let mut word = Vec::with_capacity(32);
                encode_value(&param.ty, value, &mut word)?;
                let mut topic = [0u8; 32];
                topic.copy_from_slice(&word);
                topics.push(topic);
            } else {
                data_types.push(param.ty.clone());
                data_values.push(value.clone());
            }
        }

        Ok(RawLog::new(topics, encode(&data_types, &data_values)?))
    }

    fn missing(&self, arg: &str) -> AbiError {
        AbiError::MalformedLog {
            event: self.name.clone(),
            reason: format!("missing value for {arg}"),
        }
    }
}

// =============================================================================
// FUNCTIONS
// =============================================================================

/// Shape of a contract function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    name: String,
    inputs: Vec<Param>,
    signature: String,
    selector: [u8; 4],
}

impl FunctionDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, inputs: Vec<Param>) -> Self {
        let name = name.into();
        let signature = canonical_signature(&name, &Self::types_of(&inputs));
        let selector = function_selector(&signature);
        Self {
            name,
            inputs,
            signature,
            selector,
        }
    }

    fn types_of(inputs: &[Param]) -> Vec<AbiType> {
        inputs.iter().map(|p| p.ty.clone()).collect()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[must_use]
    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Argument types in declaration order.
    #[must_use]
    pub fn input_types(&self) -> Vec<AbiType> {
        Self::types_of(&self.inputs)
    }

    /// Selector followed by the encoded arguments.
    pub fn encode_call(&self, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        let mut out = self.selector.to_vec();
        out.extend(encode(&self.input_types(), args)?);
        Ok(out)
    }

    /// Check the selector and decode the arguments of `calldata`.
    pub fn decode_call(&self, calldata: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        if calldata.len() < 4 || calldata[..4] != self.selector {
            return Err(AbiError::SelectorMismatch {
                function: self.signature.clone(),
            });
        }
        decode(&self.input_types(), &calldata[4..])
    }
}
