//! # Typed Signing Service
//!
//! Binds the pure signing functions to a configured domain.

use crate::domain::ecdsa;
use crate::domain::entities::{Eip712Domain, RecoverableSignature, TypedMessage};
use crate::domain::errors::SigningError;
use crate::domain::typed_data::{digest_with_separator, domain_separator};
use crate::ports::inbound::TypedSigningApi;
use shared_types::{Address, Hash};
use tracing::{debug, warn};

/// Builds digests and checks signers for one signing domain.
#[derive(Debug, Clone)]
pub struct TypedMessageBuilder {
    domain: Eip712Domain,
    separator: Hash,
}

impl TypedMessageBuilder {
    /// Create a builder, hashing the domain separator once.
    pub fn new(domain: Eip712Domain) -> Result<Self, SigningError> {
        let separator = domain_separator(&domain)?;
        Ok(Self { domain, separator })
    }

    pub fn domain_separator(&self) -> Hash {
        self.separator
    }
}

impl TypedSigningApi for TypedMessageBuilder {
    fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    fn digest(&self, message: &TypedMessage) -> Result<Hash, SigningError> {
        digest_with_separator(&self.separator, message)
    }

    fn recover_signer(&self, digest: &Hash, signature: &RecoverableSignature) -> Result<Address, SigningError> {
        ecdsa::recover_signer(digest, signature)
    }

    fn authorize(
        &self,
        message: &TypedMessage,
        signature: &RecoverableSignature,
        expected: Address,
    ) -> Result<Address, SigningError> {
        let digest = self.digest(message)?;
        match ecdsa::verify_signer(&digest, signature, expected) {
            Ok(signer) => {
                debug!(primary_type = message.primary_type(), "Typed message authorized");
                Ok(signer)
            }
            Err(e) => {
                warn!(primary_type = message.primary_type(), error = %e, "Typed message rejected");
                Err(e)
            }
        }
    }
}
