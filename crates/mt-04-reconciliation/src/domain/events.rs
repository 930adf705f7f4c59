//! # Registry Events
//!
//! Typed registry events and the lookup table from signature topic to
//! decoder. The table is built once from the contract interface, so control
//! flow never branches on event-name strings.

use mt_01_abi_codec::{AbiError, AbiValue, ContractInterface, DecodedLog, EventDescriptor};
use shared_types::{Address, Hash, RawLog, U256};
use std::collections::HashMap;

pub const NODE_MINTED: &str = "NodeMinted";
pub const DEVICE_CLAIMED: &str = "AftermarketDeviceClaimed";
pub const DEVICE_UNPAIRED: &str = "AftermarketDeviceUnpaired";

/// Which registry event a log carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryEventKind {
    NodeMinted,
    DeviceClaimed,
    DeviceUnpaired,
}

/// A decoded registry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    NodeMinted { node_type: U256, node_id: U256 },
    DeviceClaimed { device_node: U256, owner: Address },
    DeviceUnpaired { device_node: U256, vehicle_node: U256, owner: Address },
}

impl RegistryEvent {
    #[must_use]
    pub fn kind(&self) -> RegistryEventKind {
        match self {
            Self::NodeMinted { .. } => RegistryEventKind::NodeMinted,
            Self::DeviceClaimed { .. } => RegistryEventKind::DeviceClaimed,
            Self::DeviceUnpaired { .. } => RegistryEventKind::DeviceUnpaired,
        }
    }
}

type DecodeFn = fn(&DecodedLog) -> Result<RegistryEvent, AbiError>;

struct Entry {
    descriptor: EventDescriptor,
    decode: DecodeFn,
}

/// Signature topic → (descriptor, typed decoder).
pub struct EventRegistry {
    entries: HashMap<Hash, Entry>,
}

impl EventRegistry {
    /// Resolve the registry events against `interface`.
    pub fn from_interface(interface: &ContractInterface) -> Result<Self, AbiError> {
        let table: [(&str, DecodeFn); 3] = [
            (NODE_MINTED, decode_node_minted),
            (DEVICE_CLAIMED, decode_device_claimed),
            (DEVICE_UNPAIRED, decode_device_unpaired),
        ];

        let mut entries = HashMap::with_capacity(table.len());
        for (name, decode) in table {
            let descriptor = interface.event(name)?.clone();
            entries.insert(descriptor.topic0(), Entry { descriptor, decode });
        }
        Ok(Self { entries })
    }

    /// Built from the compiled-in registry interface.
    pub fn registry() -> Result<Self, AbiError> {
        Self::from_interface(mt_01_abi_codec::registry_interface()?)
    }

    /// Decode `log` if its signature topic is a known event.
    ///
    /// Returns `None` for logs of unrelated events.
    pub fn decode(&self, log: &RawLog) -> Option<Result<RegistryEvent, AbiError>> {
        let entry = self.entries.get(log.signature_topic()?)?;
        Some(
            entry
                .descriptor
                .decode_log(&log.topics, &log.data)
                .and_then(|decoded| (entry.decode)(&decoded)),
        )
    }

    /// Descriptor of a known event.
    pub fn descriptor(&self, kind: RegistryEventKind) -> Option<&EventDescriptor> {
        let name = match kind {
            RegistryEventKind::NodeMinted => NODE_MINTED,
            RegistryEventKind::DeviceClaimed => DEVICE_CLAIMED,
            RegistryEventKind::DeviceUnpaired => DEVICE_UNPAIRED,
        };
        self.entries
            .values()
            .map(|e| &e.descriptor)
            .find(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn arg<'a>(log: &'a DecodedLog, name: &str) -> Result<&'a AbiValue, AbiError> {
    log.get(name).ok_or_else(|| AbiError::MalformedLog {
        event: log.event.clone(),
        reason: format!("missing argument {name}"),
    })
}

fn uint_arg(log: &DecodedLog, name: &str) -> Result<U256, AbiError> {
    arg(log, name)?.as_uint().ok_or_else(|| AbiError::MalformedLog {
        event: log.event.clone(),
        reason: format!("{name} is not an unsigned integer"),
    })
}

fn address_arg(log: &DecodedLog, name: &str) -> Result<Address, AbiError> {
    arg(log, name)?.as_address().ok_or_else(|| AbiError::MalformedLog {
        event: log.event.clone(),
        reason: format!("{name} is not an address"),
    })
}

fn decode_node_minted(log: &DecodedLog) -> Result<RegistryEvent, AbiError> {
    Ok(RegistryEvent::NodeMinted {
        node_type: uint_arg(log, "nodeType")?,
        node_id: uint_arg(log, "nodeId")?,
    })
}

fn decode_device_claimed(log: &DecodedLog) -> Result<RegistryEvent, AbiError> {
    Ok(RegistryEvent::DeviceClaimed {
        device_node: uint_arg(log, "aftermarketDeviceNode")?,
        owner: address_arg(log, "owner")?,
    })
}

fn decode_device_unpaired(log: &DecodedLog) -> Result<RegistryEvent, AbiError> {
    Ok(RegistryEvent::DeviceUnpaired {
        device_node: uint_arg(log, "aftermarketDeviceNode")?,
        vehicle_node: uint_arg(log, "vehicleNode")?,
        owner: address_arg(log, "owner")?,
    })
}
