//! # ABI Codec (MT-01)
//!
//! Encodes contract calls into calldata and decodes raw ledger logs into
//! typed values, driven entirely by data descriptors.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): type tags, values, the tuple codec and
//!   function/event descriptors. Pure, no I/O.
//! - **Contract interfaces** (`contracts/`): JSON ABI loading and the
//!   compiled-in registry interface.
//!
//! ## Encoding Rules
//!
//! - Static values occupy one or more 32-byte words inline.
//! - Dynamic values (`bytes`, `string`, `T[]`, tuples containing them) are
//!   encoded as a head offset plus a tail segment.
//! - Indexed event arguments live in topics and must be single-word value
//!   types.

pub mod contracts;
pub mod domain;

// Re-export public API
pub use contracts::{registry_interface, ContractInterface, REGISTRY_ABI_JSON};
pub use domain::decoder::{decode, decode_partial};
pub use domain::descriptor::{DecodedLog, EventDescriptor, FunctionDescriptor, Param};
pub use domain::encoder::{encode, encode_call};
pub use domain::errors::AbiError;
pub use domain::hashing::{function_selector, keccak256};
pub use domain::types::AbiType;
pub use domain::value::AbiValue;
