//! # Test Harness
//!
//! A wired runtime, deterministic signers and a relayer stand-in that answers
//! every `transaction.request` with a scripted series of status
//! notifications carrying the registry log the call would have emitted.

use k256::ecdsa::SigningKey;
use mt_01_abi_codec::{keccak256, registry_interface, AbiValue};
use mt_02_typed_signing::{address_from_pubkey, messages, sign_digest, RecoverableSignature, TypedMessage, TypedSigningApi};
use mt_03_request_dispatch::AuthorizedAction;
use mt_04_reconciliation::MetaTransactionRequest;
use node_runtime::{load_config_from, MetaTxRuntime, RuntimeConfig};
use parking_lot::Mutex;
use shared_bus::{InMemoryMessageBus, MessageBus, SubscriptionError, TopicFilter};
use shared_types::{
    from_hex, to_hex, Address, EventEnvelope, Hash, LogData, RawLog, TransactionInfo, TransactionRequestData,
    TransactionStatus, TransactionStatusData, U256, TRANSACTION_STATUS_EVENT,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const RELAYER_SOURCE: &str = "relayer/simulated";
pub const VERIFYING_CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
/// Node id handed to the first minted vehicle.
pub const FIRST_NODE_ID: u64 = 1000;
/// Owner the relayer reports on unpair events.
pub const UNPAIR_OWNER: Address = [0xEE; 20];

/// Runtime configuration for tests: short backoff, generous retry budget.
pub fn test_config(overrides: &[(&str, &str)]) -> RuntimeConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("MTX_VERIFYING_CONTRACT".to_string(), VERIFYING_CONTRACT.to_string()),
        ("MTX_RETRY_ATTEMPTS".to_string(), "20".to_string()),
        ("MTX_RETRY_BACKOFF_MS".to_string(), "5".to_string()),
        ("MTX_RETRY_MAX_BACKOFF_MS".to_string(), "20".to_string()),
    ]);
    for (k, v) in overrides {
        vars.insert((*k).to_string(), (*v).to_string());
    }
    let (config, ignored) = load_config_from(|key| vars.get(key).cloned());
    assert!(ignored.is_empty(), "ignored overrides: {ignored:?}");
    config
}

// =============================================================================
// Signers and actions
// =============================================================================

/// A deterministic secp256k1 key.
pub struct Signer {
    key: SigningKey,
    pub address: Address,
}

impl Signer {
    pub fn from_seed(seed: u8) -> Self {
        let key = SigningKey::from_slice(&[seed; 32]).expect("valid scalar");
        let address = address_from_pubkey(key.verifying_key());
        Self { key, address }
    }

    pub fn sign(&self, signing: &dyn TypedSigningApi, message: &TypedMessage) -> RecoverableSignature {
        let digest = signing.digest(message).expect("digest");
        sign_digest(&self.key, &digest).expect("sign")
    }
}

fn signature_bytes(signature: &RecoverableSignature) -> AbiValue {
    AbiValue::Bytes(signature.to_bytes().to_vec())
}

pub fn mint_vehicle_action(
    runtime: &MetaTxRuntime,
    correlation_id: &str,
    owner: &Signer,
    manufacturer_node: u64,
    attributes: &[(&str, &str)],
) -> AuthorizedAction {
    let names: Vec<&str> = attributes.iter().map(|(a, _)| *a).collect();
    let infos: Vec<&str> = attributes.iter().map(|(_, i)| *i).collect();
    let message = messages::mint_vehicle_sign(U256::from(manufacturer_node), owner.address, &names, &infos);
    let signature = owner.sign(runtime.signing().as_ref(), &message);

    let attr_info = attributes
        .iter()
        .map(|(a, i)| AbiValue::Tuple(vec![AbiValue::string(*a), AbiValue::string(*i)]))
        .collect();
    AuthorizedAction {
        correlation_id: correlation_id.to_string(),
        contract: runtime.registry_contract(),
        function: "mintVehicleSign".to_string(),
        args: vec![
            AbiValue::uint(manufacturer_node),
            AbiValue::Address(owner.address),
            AbiValue::Array(attr_info),
            signature_bytes(&signature),
        ],
        message,
        signature,
        expected_signer: owner.address,
    }
}

pub fn claim_action(
    runtime: &MetaTxRuntime,
    correlation_id: &str,
    owner: &Signer,
    device: &Signer,
    device_node: u64,
) -> AuthorizedAction {
    let message = messages::claim_aftermarket_device_sign(U256::from(device_node), owner.address);
    let owner_sig = owner.sign(runtime.signing().as_ref(), &message);
    let device_sig = device.sign(runtime.signing().as_ref(), &message);
    AuthorizedAction {
        correlation_id: correlation_id.to_string(),
        contract: runtime.registry_contract(),
        function: "claimAftermarketDeviceSign".to_string(),
        args: vec![
            AbiValue::uint(device_node),
            AbiValue::Address(owner.address),
            signature_bytes(&owner_sig),
            signature_bytes(&device_sig),
        ],
        message,
        signature: owner_sig,
        expected_signer: owner.address,
    }
}

pub fn unpair_action(
    runtime: &MetaTxRuntime,
    correlation_id: &str,
    owner: &Signer,
    device_node: u64,
    vehicle_node: u64,
) -> AuthorizedAction {
    let message = messages::unpair_aftermarket_device_sign(U256::from(device_node), U256::from(vehicle_node));
    let signature = owner.sign(runtime.signing().as_ref(), &message);
    AuthorizedAction {
        correlation_id: correlation_id.to_string(),
        contract: runtime.registry_contract(),
        function: "unpairAftermarketDeviceSign".to_string(),
        args: vec![
            AbiValue::uint(device_node),
            AbiValue::uint(vehicle_node),
            signature_bytes(&signature),
        ],
        message,
        signature,
        expected_signer: owner.address,
    }
}

// =============================================================================
// Simulated relayer
// =============================================================================

/// What the relayer sends back for each request.
#[derive(Debug, Clone)]
pub struct RelayerScript {
    /// Statuses, in delivery order.
    pub statuses: Vec<TransactionStatus>,
    /// Attach the emitted log to every `Confirmed` notification.
    pub include_logs: bool,
    /// Pause before each notification.
    pub delay: Duration,
}

impl Default for RelayerScript {
    fn default() -> Self {
        Self {
            statuses: vec![
                TransactionStatus::Submitted,
                TransactionStatus::Mined,
                TransactionStatus::Confirmed,
            ],
            include_logs: true,
            delay: Duration::ZERO,
        }
    }
}

impl RelayerScript {
    pub fn with_statuses(statuses: &[TransactionStatus]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn without_logs(mut self) -> Self {
        self.include_logs = false;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Answers transaction requests the way the external relayer would.
pub struct SimulatedRelayer {
    task: JoinHandle<()>,
    received: Arc<Mutex<Vec<TransactionRequestData>>>,
}

impl SimulatedRelayer {
    /// Subscribe to `request_topic` now and answer on `status_topic`.
    pub fn spawn(
        bus: Arc<InMemoryMessageBus>,
        request_topic: &str,
        status_topic: &str,
        script: RelayerScript,
    ) -> Self {
        let mut requests = bus.subscribe(TopicFilter::topic(request_topic));
        let received = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&received);
        let status_topic = status_topic.to_string();

        let task = tokio::spawn(async move {
            let mut next_node = FIRST_NODE_ID;
            loop {
                let message = match requests.recv().await {
                    Ok(message) => message,
                    Err(SubscriptionError::Lagged { .. }) => continue,
                    Err(SubscriptionError::Closed) => return,
                };
                let Ok(envelope) = EventEnvelope::<TransactionRequestData>::from_bytes(&message.payload) else {
                    continue;
                };
                let request = envelope.data;
                let log = emitted_log(&request, next_node);
                next_node += 1;
                seen.lock().push(request.clone());

                let hash = keccak256(request.id.as_bytes());
                for status in &script.statuses {
                    tokio::time::sleep(script.delay).await;
                    let logs = match (&log, *status, script.include_logs) {
                        (Some(log), TransactionStatus::Confirmed, true) => vec![log.clone()],
                        _ => Vec::new(),
                    };
                    let Ok(payload) = status_envelope(&request.id, *status, Some(hash), &logs).to_bytes() else {
                        continue;
                    };
                    if bus.publish(&status_topic, &request.id, payload).await.is_err() {
                        return;
                    }
                }
            }
        });

        Self { task, received }
    }

    /// Requests seen so far.
    pub fn received(&self) -> Vec<TransactionRequestData> {
        self.received.lock().clone()
    }
}

impl Drop for SimulatedRelayer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The registry log the requested call would emit, if the call is known.
pub fn emitted_log(request: &TransactionRequestData, node_id: u64) -> Option<RawLog> {
    let iface = registry_interface().ok()?;
    let calldata = from_hex("data", &request.data).ok()?;
    let (function, args) = iface.decode_call_args(&calldata).ok()?;
    let (event, values) = match function.name() {
        "mintVehicleSign" => ("NodeMinted", vec![AbiValue::uint(1), AbiValue::uint(node_id)]),
        "claimAftermarketDeviceSign" => ("AftermarketDeviceClaimed", vec![args.first()?.clone(), args.get(1)?.clone()]),
        "unpairAftermarketDeviceSign" => (
            "AftermarketDeviceUnpaired",
            vec![args.first()?.clone(), args.get(1)?.clone(), AbiValue::Address(UNPAIR_OWNER)],
        ),
        _ => return None,
    };
    iface.event(event).ok()?.encode_log(&values).ok()
}

/// A `transaction.status` envelope as the relayer publishes it.
pub fn status_envelope(
    correlation_id: &str,
    status: TransactionStatus,
    hash: Option<Hash>,
    logs: &[RawLog],
) -> EventEnvelope<TransactionStatusData> {
    EventEnvelope::new(
        RELAYER_SOURCE,
        TRANSACTION_STATUS_EVENT,
        correlation_id,
        TransactionStatusData {
            request_id: correlation_id.to_string(),
            status,
            transaction: hash.map(|h| TransactionInfo {
                hash: to_hex(&h),
                logs: logs.iter().map(LogData::from_raw).collect(),
            }),
        },
    )
}

// =============================================================================
// Harness
// =============================================================================

/// A started runtime with a relayer attached to its bus.
pub struct Harness {
    pub runtime: MetaTxRuntime,
    pub relayer: SimulatedRelayer,
}

impl Harness {
    pub fn start(script: RelayerScript) -> Self {
        Self::start_with(test_config(&[]), script)
    }

    pub fn start_with(config: RuntimeConfig, script: RelayerScript) -> Self {
        let runtime = MetaTxRuntime::new(config).expect("runtime");
        let relayer = SimulatedRelayer::spawn(
            runtime.bus(),
            &runtime.config().bus.request_topic,
            &runtime.config().bus.status_topic,
            script,
        );
        runtime.start().expect("start");
        Self { runtime, relayer }
    }

    /// Poll the store until the request satisfies `done`.
    pub async fn wait_for<F>(&self, id: &str, done: F) -> MetaTransactionRequest
    where
        F: Fn(&MetaTransactionRequest) -> bool,
    {
        let store = self.runtime.store();
        let found = tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                if let Some(request) = store.get(id) {
                    if done(&request) {
                        return request;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        match found {
            Ok(request) => request,
            Err(_) => panic!("request {id} never reached the expected state: {:?}", store.get(id)),
        }
    }

    /// Publish a raw payload on the status topic.
    pub async fn publish_status(&self, key: &str, payload: Vec<u8>) {
        self.runtime
            .bus()
            .publish(&self.runtime.config().bus.status_topic, key, payload)
            .await
            .expect("publish status");
    }

    pub async fn stop(self) {
        self.runtime.shutdown().await;
    }
}
