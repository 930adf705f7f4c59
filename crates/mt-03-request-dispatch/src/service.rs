//! # Request Dispatcher Service
//!
//! Encodes, wraps and publishes transaction requests.

use crate::domain::entities::{AuthorizedAction, DispatchReceipt, DispatcherConfig};
use crate::domain::errors::DispatchError;
use crate::ports::inbound::RequestDispatchApi;
use async_trait::async_trait;
use mt_01_abi_codec::{AbiValue, ContractInterface};
use mt_02_typed_signing::TypedSigningApi;
use shared_bus::MessageBus;
use shared_types::{to_hex, Address, EventEnvelope, TransactionRequestData, TRANSACTION_REQUEST_EVENT};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Publishes authorized contract calls to the relayer.
pub struct RequestDispatcher<B: MessageBus> {
    bus: Arc<B>,
    signing: Arc<dyn TypedSigningApi>,
    interface: Arc<ContractInterface>,
    config: DispatcherConfig,
}

impl<B: MessageBus> RequestDispatcher<B> {
    pub fn new(
        bus: Arc<B>,
        signing: Arc<dyn TypedSigningApi>,
        interface: Arc<ContractInterface>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            bus,
            signing,
            interface,
            config,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    async fn publish(
        &self,
        correlation_id: &str,
        contract: Address,
        function: &str,
        args: &[AbiValue],
        deadline: Duration,
    ) -> Result<DispatchReceipt, DispatchError> {
        if correlation_id.is_empty() {
            return Err(DispatchError::InvalidRequest("empty correlation id".into()));
        }

        let calldata = self.interface.function(function)?.encode_call(args)?;
        let envelope = EventEnvelope::new(
            self.config.source.clone(),
            TRANSACTION_REQUEST_EVENT,
            correlation_id,
            TransactionRequestData {
                id: correlation_id.to_string(),
                to: to_hex(&contract),
                data: to_hex(&calldata),
            },
        );
        let payload = envelope.to_bytes()?;

        let receivers = match tokio::time::timeout(
            deadline,
            self.bus.publish(&self.config.topic, correlation_id, payload),
        )
        .await
        {
            Ok(Ok(receivers)) => receivers,
            Ok(Err(e)) => {
                warn!(correlation_id, function, error = %e, "Publish failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(correlation_id, function, ?deadline, "Publish timed out");
                return Err(DispatchError::Timeout(deadline));
            }
        };

        info!(
            correlation_id,
            function,
            envelope_id = %envelope.id,
            receivers,
            "Dispatched transaction request"
        );

        Ok(DispatchReceipt {
            correlation_id: correlation_id.to_string(),
            envelope_id: envelope.id,
            calldata,
            receivers,
        })
    }
}

#[async_trait]
impl<B: MessageBus> RequestDispatchApi for RequestDispatcher<B> {
    async fn dispatch(
        &self,
        correlation_id: &str,
        contract: Address,
        function: &str,
        args: &[AbiValue],
    ) -> Result<DispatchReceipt, DispatchError> {
        self.publish(correlation_id, contract, function, args, self.config.deadline)
            .await
    }

    async fn dispatch_with_deadline(
        &self,
        correlation_id: &str,
        contract: Address,
        function: &str,
        args: &[AbiValue],
        deadline: Duration,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.publish(correlation_id, contract, function, args, deadline).await
    }

    async fn authorize_and_dispatch(&self, action: &AuthorizedAction) -> Result<DispatchReceipt, DispatchError> {
        let signer = self
            .signing
            .authorize(&action.message, &action.signature, action.expected_signer)?;
        debug!(
            correlation_id = %action.correlation_id,
            signer = %to_hex(&signer),
            "Action authorized"
        );

        self.publish(
            &action.correlation_id,
            action.contract,
            &action.function,
            &action.args,
            self.config.deadline,
        )
        .await
    }
}
