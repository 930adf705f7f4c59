//! Typed messages for the identity registry's signed actions.

use super::entities::{TypedField, TypedMessage};
use mt_01_abi_codec::AbiValue;
use shared_types::{Address, U256};

pub const MINT_VEHICLE_SIGN: &str = "MintVehicleSign";
pub const MINT_DEVICE: &str = "MintDevice";
pub const CLAIM_AFTERMARKET_DEVICE_SIGN: &str = "ClaimAftermarketDeviceSign";
pub const UNPAIR_AFTERMARKET_DEVICE_SIGN: &str = "UnPairAftermarketDeviceSign";

/// Owner's authorization to mint a vehicle under a manufacturer node.
pub fn mint_vehicle_sign(manufacturer_node: U256, owner: Address, attributes: &[&str], infos: &[&str]) -> TypedMessage {
    TypedMessage::new(
        MINT_VEHICLE_SIGN,
        vec![
            TypedField::new("manufacturerNode", "uint256"),
            TypedField::new("owner", "address"),
            TypedField::new("attributes", "string[]"),
            TypedField::new("infos", "string[]"),
        ],
    )
    .with_value("manufacturerNode", AbiValue::Uint(manufacturer_node))
    .with_value("owner", AbiValue::Address(owner))
    .with_value("attributes", AbiValue::strings(attributes.iter().copied()))
    .with_value("infos", AbiValue::strings(infos.iter().copied()))
}

/// Authorization to mint a device under `root_node`.
pub fn mint_device(root_node: U256, attributes: &[&str], infos: &[&str]) -> TypedMessage {
    TypedMessage::new(
        MINT_DEVICE,
        vec![
            TypedField::new("rootNode", "uint256"),
            TypedField::new("attributes", "string[]"),
            TypedField::new("infos", "string[]"),
        ],
    )
    .with_value("rootNode", AbiValue::Uint(root_node))
    .with_value("attributes", AbiValue::strings(attributes.iter().copied()))
    .with_value("infos", AbiValue::strings(infos.iter().copied()))
}

/// Signed by both the new owner and the device itself.
pub fn claim_aftermarket_device_sign(aftermarket_device_node: U256, owner: Address) -> TypedMessage {
    TypedMessage::new(
        CLAIM_AFTERMARKET_DEVICE_SIGN,
        vec![
            TypedField::new("aftermarketDeviceNode", "uint256"),
            TypedField::new("owner", "address"),
        ],
    )
    .with_value("aftermarketDeviceNode", AbiValue::Uint(aftermarket_device_node))
    .with_value("owner", AbiValue::Address(owner))
}

pub fn unpair_aftermarket_device_sign(aftermarket_device_node: U256, vehicle_node: U256) -> TypedMessage {
    TypedMessage::new(
        UNPAIR_AFTERMARKET_DEVICE_SIGN,
        vec![
            TypedField::new("aftermarketDeviceNode", "uint256"),
            TypedField::new("vehicleNode", "uint256"),
        ],
    )
    .with_value("aftermarketDeviceNode", AbiValue::Uint(aftermarket_device_node))
    .with_value("vehicleNode", AbiValue::Uint(vehicle_node))
}
