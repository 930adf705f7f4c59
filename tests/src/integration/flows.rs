//! # End-to-End Meta-Transaction Flows
//!
//! Authorize, dispatch, relay and reconcile over one in-memory bus.
//!
//! ```text
//! AuthorizedAction → RequestDispatcher ──request──→ SimulatedRelayer
//!                                                        │ Submitted / Mined / Confirmed + log
//! InMemoryRequestStore ← ReconciliationEngine ← StatusConsumer ←─status─┘
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::{
        claim_action, emitted_log, mint_vehicle_action, status_envelope, test_config, unpair_action, Harness,
        RelayerScript, Signer, FIRST_NODE_ID, UNPAIR_OWNER,
    };
    use mt_01_abi_codec::keccak256;
    use mt_02_typed_signing::SigningError;
    use mt_03_request_dispatch::{DispatchError, RequestDispatchApi};
    use mt_04_reconciliation::{MetaTransactionRequest, Outcome, ReconciliationApi, RequestStore, StatusNotification};
    use shared_bus::MessageBus;
    use shared_types::{to_hex, TransactionStatus, U256};
    use std::time::Duration;
    use TransactionStatus::*;

    async fn insert(harness: &Harness, id: &str, outcome: Outcome) {
        harness
            .runtime
            .store()
            .insert(MetaTransactionRequest::new(id, outcome))
            .await
            .unwrap();
    }

    fn confirmed(request: &MetaTransactionRequest) -> bool {
        request.status == Confirmed
    }

    // =========================================================================
    // HAPPY PATHS
    // =========================================================================

    #[tokio::test]
    async fn test_mint_vehicle_flow() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(1);
        insert(&harness, "mint-1", Outcome::mint("vehicle-1")).await;

        let action = mint_vehicle_action(
            &harness.runtime,
            "mint-1",
            &owner,
            42,
            &[("Make", "Tesla"), ("Model", "Model 3"), ("Year", "2020")],
        );
        let receipt = harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();
        assert_eq!(&receipt.calldata[..4], &[0x1b, 0x1a, 0x82, 0xc8]);

        let request = harness.wait_for("mint-1", confirmed).await;
        assert_eq!(
            request.outcome,
            Outcome::Mint {
                device_id: "vehicle-1".to_string(),
                token_id: Some(U256::from(FIRST_NODE_ID)),
            }
        );
        assert_eq!(request.hash, Some(keccak256(b"mint-1")));

        let received = harness.relayer.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id, "mint-1");
        assert_eq!(received[0].to, to_hex(&harness.runtime.registry_contract()));
        assert_eq!(received[0].data, to_hex(&receipt.calldata));

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_claim_flow_records_owner() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(2);
        let device = Signer::from_seed(3);
        insert(&harness, "claim-1", Outcome::claim("unit-7")).await;

        let action = claim_action(&harness.runtime, "claim-1", &owner, &device, 7);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();

        let request = harness.wait_for("claim-1", confirmed).await;
        assert_eq!(
            request.outcome,
            Outcome::Claim {
                unit_id: "unit-7".to_string(),
                owner: Some(owner.address),
            }
        );
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_unpair_flow_clears_pairing() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(4);
        insert(&harness, "unpair-1", Outcome::unpair("integration-1", "pairing-9")).await;

        let action = unpair_action(&harness.runtime, "unpair-1", &owner, 11, 12);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();

        let request = harness.wait_for("unpair-1", confirmed).await;
        assert_eq!(
            request.outcome,
            Outcome::Unpair {
                integration_id: "integration-1".to_string(),
                pairing_request: None,
            }
        );
        assert_ne!(UNPAIR_OWNER, owner.address);
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_parallel_requests_keep_their_outcomes() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(5);
        insert(&harness, "mint-a", Outcome::mint("vehicle-a")).await;
        insert(&harness, "mint-b", Outcome::mint("vehicle-b")).await;

        let dispatcher = harness.runtime.dispatcher();
        let a = mint_vehicle_action(&harness.runtime, "mint-a", &owner, 1, &[("Make", "Ford")]);
        let b = mint_vehicle_action(&harness.runtime, "mint-b", &owner, 1, &[("Make", "Kia")]);
        dispatcher.authorize_and_dispatch(&a).await.unwrap();
        dispatcher.authorize_and_dispatch(&b).await.unwrap();

        let a = harness.wait_for("mint-a", confirmed).await;
        let b = harness.wait_for("mint-b", confirmed).await;
        assert_eq!(
            a.outcome,
            Outcome::Mint {
                device_id: "vehicle-a".to_string(),
                token_id: Some(U256::from(FIRST_NODE_ID)),
            }
        );
        assert_eq!(
            b.outcome,
            Outcome::Mint {
                device_id: "vehicle-b".to_string(),
                token_id: Some(U256::from(FIRST_NODE_ID + 1)),
            }
        );
        harness.stop().await;
    }

    // =========================================================================
    // ORDERING AND REPLAY
    // =========================================================================

    #[tokio::test]
    async fn test_out_of_order_statuses_never_regress() {
        let harness = Harness::start(RelayerScript::with_statuses(&[Confirmed, Mined, Submitted]));
        let owner = Signer::from_seed(6);
        insert(&harness, "ooo-1", Outcome::mint("vehicle-ooo")).await;

        let action = mint_vehicle_action(&harness.runtime, "ooo-1", &owner, 3, &[("Make", "BMW")]);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();

        let request = harness.wait_for("ooo-1", confirmed).await;
        assert!(request.outcome.is_applied());

        // let the late Mined and Submitted notifications drain
        tokio::time::sleep(Duration::from_millis(100)).await;
        let store = harness.runtime.store();
        assert_eq!(store.get("ooo-1").unwrap().status, Confirmed);
        assert_eq!(store.commit_count(), 1);
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_mined_before_submitted_still_confirms() {
        let harness = Harness::start(RelayerScript::with_statuses(&[Mined, Submitted, Confirmed]));
        let owner = Signer::from_seed(7);
        insert(&harness, "swap-1", Outcome::claim("unit-swap")).await;

        let action = claim_action(&harness.runtime, "swap-1", &owner, &Signer::from_seed(8), 99);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();

        let request = harness.wait_for("swap-1", confirmed).await;
        assert!(request.outcome.is_applied());
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_replayed_confirmation_is_idempotent() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(9);
        insert(&harness, "replay-1", Outcome::mint("vehicle-r")).await;

        let action = mint_vehicle_action(&harness.runtime, "replay-1", &owner, 5, &[("Make", "Audi")]);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();
        let before = harness.wait_for("replay-1", confirmed).await;
        let commits = harness.runtime.store().commit_count();

        // a replay carrying a different node id must not overwrite the first
        let request = harness.relayer.received().remove(0);
        let replayed_log = emitted_log(&request, 5555).unwrap();
        let notification = StatusNotification::new("replay-1", Confirmed)
            .with_hash(keccak256(b"replay-1"))
            .with_logs(vec![replayed_log.clone()]);

        let report = harness.runtime.engine().on_status_notification(&notification).await.unwrap();
        assert!(!report.advanced);
        assert!(!report.outcome_applied);
        assert_eq!(report.status, Confirmed);

        let envelope = status_envelope("replay-1", Confirmed, Some(keccak256(b"replay-1")), &[replayed_log]);
        harness.publish_status("replay-1", envelope.to_bytes().unwrap()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let after = harness.runtime.store().get("replay-1").unwrap();
        assert_eq!(after, before);
        assert_eq!(harness.runtime.store().commit_count(), commits);
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_confirmation_without_log_then_replay_with_log() {
        let harness = Harness::start(RelayerScript::default().without_logs());
        let owner = Signer::from_seed(10);
        insert(&harness, "late-log", Outcome::claim("unit-late")).await;

        let action = claim_action(&harness.runtime, "late-log", &owner, &Signer::from_seed(11), 21);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();

        let request = harness.wait_for("late-log", confirmed).await;
        assert!(!request.outcome.is_applied());

        let relayed = harness.relayer.received().remove(0);
        let log = emitted_log(&relayed, 0).unwrap();
        let envelope = status_envelope("late-log", Confirmed, Some(keccak256(b"late-log")), &[log]);
        harness.publish_status("late-log", envelope.to_bytes().unwrap()).await;

        let request = harness.wait_for("late-log", |r| r.outcome.is_applied()).await;
        assert_eq!(
            request.outcome,
            Outcome::Claim {
                unit_id: "unit-late".to_string(),
                owner: Some(owner.address),
            }
        );
        harness.stop().await;
    }

    // =========================================================================
    // RACES AND FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_notification_before_request_row_is_retried() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(12);

        let action = mint_vehicle_action(&harness.runtime, "race-1", &owner, 8, &[("Make", "Fiat")]);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();

        // the row lands after the relayer has already answered
        tokio::time::sleep(Duration::from_millis(30)).await;
        insert(&harness, "race-1", Outcome::mint("vehicle-race")).await;

        let request = harness.wait_for("race-1", confirmed).await;
        assert!(request.outcome.is_applied());
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_exhausted_retry_budget_drops_notification() {
        let config = test_config(&[("MTX_RETRY_ATTEMPTS", "2"), ("MTX_RETRY_BACKOFF_MS", "1")]);
        let harness = Harness::start_with(config, RelayerScript::with_statuses(&[Submitted]));
        let owner = Signer::from_seed(13);

        let action = mint_vehicle_action(&harness.runtime, "lost-1", &owner, 8, &[("Make", "Seat")]);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        insert(&harness, "lost-1", Outcome::mint("vehicle-lost")).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(harness.runtime.store().get("lost-1").unwrap().status, Unstarted);
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_unknown_request_does_not_stall_other_flows() {
        let config = test_config(&[
            ("MTX_RETRY_ATTEMPTS", "1000"),
            ("MTX_RETRY_BACKOFF_MS", "50"),
            ("MTX_RETRY_MAX_BACKOFF_MS", "50"),
        ]);
        let harness = Harness::start_with(config, RelayerScript::default());
        let owner = Signer::from_seed(18);

        // no row will ever exist for this one
        let orphan = status_envelope("orphan-1", Mined, Some(keccak256(b"orphan-1")), &[]);
        harness.publish_status("orphan-1", orphan.to_bytes().unwrap()).await;

        let dispatcher = harness.runtime.dispatcher();
        for (i, id) in ["busy-1", "busy-2", "busy-3"].into_iter().enumerate() {
            insert(&harness, id, Outcome::mint(format!("vehicle-{id}"))).await;
            let action = mint_vehicle_action(&harness.runtime, id, &owner, i as u64 + 1, &[("Make", "Volvo")]);
            dispatcher.authorize_and_dispatch(&action).await.unwrap();
        }
        for id in ["busy-1", "busy-2", "busy-3"] {
            assert!(harness.wait_for(id, confirmed).await.outcome.is_applied());
        }

        let stats = harness.runtime.consumer_stats();
        assert_eq!(stats.failed(), 0);
        assert_eq!(stats.lagged(), 0);
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_unauthorized_action_never_reaches_relayer() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(14);
        let impostor = Signer::from_seed(15);
        insert(&harness, "forged-1", Outcome::mint("vehicle-forged")).await;

        let mut action = mint_vehicle_action(&harness.runtime, "forged-1", &impostor, 1, &[("Make", "VW")]);
        action.expected_signer = owner.address;

        let err = harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap_err();
        assert!(matches!(err, DispatchError::Signing(SigningError::SignerMismatch { .. })));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(harness.relayer.received().is_empty());
        assert_eq!(harness.runtime.bus().messages_published(), 0);
        assert_eq!(harness.runtime.store().get("forged-1").unwrap().status, Unstarted);
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_status_is_skipped() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(16);
        insert(&harness, "after-junk", Outcome::mint("vehicle-j")).await;

        harness.publish_status("after-junk", b"{not json".to_vec()).await;

        let action = mint_vehicle_action(&harness.runtime, "after-junk", &owner, 2, &[("Make", "Opel")]);
        harness.runtime.dispatcher().authorize_and_dispatch(&action).await.unwrap();

        let request = harness.wait_for("after-junk", confirmed).await;
        assert!(request.outcome.is_applied());
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_fails() {
        let harness = Harness::start(RelayerScript::default());
        let owner = Signer::from_seed(17);
        let action = mint_vehicle_action(&harness.runtime, "closed-1", &owner, 2, &[("Make", "Mini")]);
        let dispatcher = harness.runtime.dispatcher();

        harness.stop().await;
        let err = dispatcher.authorize_and_dispatch(&action).await.unwrap_err();
        assert!(matches!(err, DispatchError::TransportFailure(_)));
    }
}
