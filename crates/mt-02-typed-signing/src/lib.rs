//! # Typed Signing (MT-02)
//!
//! Builds structured-data signing digests and recovers the signer of a
//! digest from a 65-byte recoverable signature.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): typed-data hashing, ECDSA recovery and the
//!   registry message constructors. Pure, no I/O.
//! - **Ports Layer** (`ports/`): the `TypedSigningApi` driving port.
//! - **Service Layer** (`service.rs`): `TypedMessageBuilder`, bound to one
//!   signing domain.
//!
//! ## Security Notes
//!
//! - **Malleability**: recovery treats a high-S signature as its low-S
//!   mirror, so both forms yield one signer. Signing emits low-S only.
//! - Digests are bit-exact: field order, type strings and padding all feed
//!   the hash.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::ecdsa::{address_from_pubkey, recover_signer, sign_digest, verify_signer};
pub use domain::entities::{Eip712Domain, RecoverableSignature, TypedField, TypedMessage, TypedValue};
pub use domain::errors::SigningError;
pub use domain::messages;
pub use domain::typed_data::{build_digest, domain_separator, encode_type, hash_struct};
pub use ports::inbound::TypedSigningApi;
pub use service::TypedMessageBuilder;
