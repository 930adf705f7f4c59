//! # Contract Interfaces
//!
//! Loads the standard JSON ABI into function and event descriptors. The
//! registry interface used by the engine is compiled in and resolved once.

use crate::domain::descriptor::{EventDescriptor, FunctionDescriptor, Param};
use crate::domain::errors::AbiError;
use crate::domain::types::AbiType;
use crate::domain::value::AbiValue;
use serde::Deserialize;
use shared_types::Hash;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// JSON ABI of the identity registry contract.
pub const REGISTRY_ABI_JSON: &str = include_str!("registry.json");

static REGISTRY: LazyLock<Result<ContractInterface, AbiError>> =
    LazyLock::new(|| ContractInterface::from_json(REGISTRY_ABI_JSON));

/// The compiled-in registry interface.
pub fn registry_interface() -> Result<&'static ContractInterface, AbiError> {
    REGISTRY.as_ref().map_err(Clone::clone)
}

#[derive(Debug, Deserialize)]
struct AbiEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
    #[serde(default)]
    anonymous: bool,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    indexed: bool,
    #[serde(default)]
    components: Vec<AbiParam>,
}

impl AbiParam {
    /// Canonical type string, expanding `tuple` into its components.
    fn canonical_type(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self.components.iter().map(Self::canonical_type).collect();
                format!("({}){suffix}", inner.join(","))
            }
            None => self.ty.clone(),
        }
    }

    fn to_param(&self) -> Result<Param, AbiError> {
        Ok(Param {
            name: self.name.clone(),
            ty: AbiType::parse(&self.canonical_type())?,
            indexed: self.indexed,
        })
    }
}

/// Functions and events of one contract, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct ContractInterface {
    functions: HashMap<String, FunctionDescriptor>,
    events: HashMap<String, EventDescriptor>,
    events_by_topic: HashMap<Hash, String>,
}

impl ContractInterface {
    /// Parse a JSON ABI array. Entries other than functions and events
    /// (constructor, fallback, errors) are ignored, as are anonymous events,
    /// which have no signature topic to match on.
    ///
    /// Lookups are by name, so an ABI that overloads a function or event
    /// name is rejected rather than letting one overload shadow another.
    pub fn from_json(abi_json: &str) -> Result<Self, AbiError> {
        let entries: Vec<AbiEntry> =
            serde_json::from_str(abi_json).map_err(|e| AbiError::InvalidInterface(e.to_string()))?;

        let mut iface = Self::default();
        for entry in entries {
            let inputs = entry
                .inputs
                .iter()
                .map(AbiParam::to_param)
                .collect::<Result<Vec<_>, _>>()?;
            match entry.kind.as_str() {
                "function" => match iface.functions.entry(entry.name) {
                    Entry::Occupied(taken) => return Err(overloaded("function", taken.key())),
                    Entry::Vacant(slot) => {
                        let f = FunctionDescriptor::new(slot.key().clone(), inputs);
                        slot.insert(f);
                    }
                },
                "event" if !entry.anonymous => match iface.events.entry(entry.name) {
                    Entry::Occupied(taken) => return Err(overloaded("event", taken.key())),
                    Entry::Vacant(slot) => {
                        let e = EventDescriptor::new(slot.key().clone(), inputs)?;
                        iface.events_by_topic.insert(e.topic0(), slot.key().clone());
                        slot.insert(e);
                    }
                },
                other => debug!(kind = other, name = %entry.name, "Skipping ABI entry"),
            }
        }
        Ok(iface)
    }

    pub fn function(&self, name: &str) -> Result<&FunctionDescriptor, AbiError> {
        self.functions
            .get(name)
            .ok_or_else(|| AbiError::UnknownFunction(name.to_string()))
    }

    pub fn event(&self, name: &str) -> Result<&EventDescriptor, AbiError> {
        self.events
            .get(name)
            .ok_or_else(|| AbiError::UnknownEvent(name.to_string()))
    }

    /// Event whose signature hash is `topic0`.
    #[must_use]
    pub fn event_by_topic(&self, topic0: &Hash) -> Option<&EventDescriptor> {
        self.events_by_topic.get(topic0).and_then(|n| self.events.get(n))
    }

    pub fn events(&self) -> impl Iterator<Item = &EventDescriptor> {
        self.events.values()
    }

    /// Encode a call to the named function.
    pub fn encode_call(&self, name: &str, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        self.function(name)?.encode_call(args)
    }

    /// Identify the function by selector and decode its arguments.
    pub fn decode_call_args(&self, calldata: &[u8]) -> Result<(&FunctionDescriptor, Vec<AbiValue>), AbiError> {
        let f = self
            .functions
            .values()
            .find(|f| calldata.len() >= 4 && calldata[..4] == f.selector())
            .ok_or_else(|| AbiError::UnknownFunction(format!("selector {:02x?}", calldata.get(..4))))?;
        Ok((f, f.decode_call(calldata)?))
    }
}

fn overloaded(kind: &str, name: &str) -> AbiError {
    AbiError::InvalidInterface(format!("overloaded {kind} {name} is not supported"))
}
