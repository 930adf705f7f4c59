//! # Inbound Ports (Driving Ports / API)
//!
//! The signing API used by the dispatcher to authorize actions.

use crate::domain::entities::{Eip712Domain, RecoverableSignature, TypedMessage};
use crate::domain::errors::SigningError;
use shared_types::{Address, Hash};

/// Typed signing bound to one signing domain.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait TypedSigningApi: Send + Sync {
    /// The domain every digest is separated under.
    fn domain(&self) -> &Eip712Domain;

    /// Signing digest of `message` under [`Self::domain`].
    fn digest(&self, message: &TypedMessage) -> Result<Hash, SigningError>;

    /// Recover the address that signed `digest`.
    fn recover_signer(&self, digest: &Hash, signature: &RecoverableSignature) -> Result<Address, SigningError>;

    /// Digest `message`, recover its signer and require it to be `expected`.
    ///
    /// # Security
    /// Any error means the action is not authorized and must not be
    /// dispatched.
    fn authorize(
        &self,
        message: &TypedMessage,
        signature: &RecoverableSignature,
        expected: Address,
    ) -> Result<Address, SigningError>;
}
