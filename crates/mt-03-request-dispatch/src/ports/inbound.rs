//! # Inbound Ports (Driving Ports / API)

use crate::domain::entities::{AuthorizedAction, DispatchReceipt};
use crate::domain::errors::DispatchError;
use async_trait::async_trait;
use mt_01_abi_codec::AbiValue;
use shared_types::Address;
use std::time::Duration;

/// Outbound half of the meta-transaction flow.
#[async_trait]
pub trait RequestDispatchApi: Send + Sync {
    /// Encode `function(args)`, wrap it for `contract` and publish it keyed
    /// by `correlation_id`, using the configured deadline.
    async fn dispatch(
        &self,
        correlation_id: &str,
        contract: Address,
        function: &str,
        args: &[AbiValue],
    ) -> Result<DispatchReceipt, DispatchError>;

    /// [`Self::dispatch`] with an explicit deadline.
    async fn dispatch_with_deadline(
        &self,
        correlation_id: &str,
        contract: Address,
        function: &str,
        args: &[AbiValue],
        deadline: Duration,
    ) -> Result<DispatchReceipt, DispatchError>;

    /// Verify the action's signer, then dispatch it. Nothing is published
    /// when verification fails.
    async fn authorize_and_dispatch(&self, action: &AuthorizedAction) -> Result<DispatchReceipt, DispatchError>;
}
