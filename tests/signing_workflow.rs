//! End-to-end draft and signing workflows against the mock settlement authority
//!
//! These tests drive the public API the way an application would: build a
//! draft, run both signing phases, submit, and inspect what the authority saw.

use std::sync::Arc;

use ledger_wallet_libs::{
    authority::{
        fetch_utxos_for_addresses, CachingAuthority, MockAuthorityFailureModes,
        MockSettlementAuthority, SettlementAuthority,
    },
    data_structures::{Address, Amount, Hash256, LockingCondition, Outpoint, Utxo},
    signing::{DraftBuilder, SighashType, SigningCoordinator, SigningSession, SigningState},
    utils::BatchProcessor,
    FeePolicy, Wallet, WalletConfig, WalletError,
};

fn funded(mock: &MockSettlementAuthority, owner: Address, amounts: &[u64]) {
    let utxos = amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            Utxo::native(
                Outpoint::new(Hash256::new([i as u8 + 1; 32]), i as u32),
                Amount::from(*amount),
            )
        })
        .collect();
    mock.set_utxos(owner, utxos);
}

fn recipient() -> Address {
    Address::new([0xBB; 20])
}

/// Single 1,000,000 UTXO, transfer 100,000: one input, payment plus change,
/// and a signature the authority verifies against the hash it issued
#[tokio::test]
async fn test_transfer_scenario_end_to_end() {
    let wallet = Wallet::from_private_key([0x11; 32]).unwrap();
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, wallet.address(), &[1_000_000]);
    let config = WalletConfig::default();

    let draft = DraftBuilder::new(mock.clone(), &config)
        .build_transfer(wallet.address(), recipient(), Amount::from(100_000u64), None)
        .await
        .unwrap();

    assert_eq!(draft.inputs().len(), 1);
    assert_eq!(draft.outputs().len(), 2);
    assert_eq!(*draft.outputs()[0].owner(), recipient());
    assert_eq!(draft.outputs()[0].amount(), Amount::from(100_000u64));
    assert_eq!(*draft.outputs()[1].owner(), wallet.address());
    assert_eq!(draft.outputs()[1].amount(), Amount::from(900_000u64));
    assert!(draft.output_total() + draft.fee() <= draft.input_total());

    let coordinator = SigningCoordinator::new(mock.clone(), &config);
    let mut session = SigningSession::new(draft.clone());

    coordinator.request_hash(&mut session).await.unwrap();
    assert_eq!(session.state(), SigningState::HashRequested);
    let issued = mock
        .signature_hash_for(&draft, 0, SighashType::All)
        .unwrap();
    assert_eq!(session.hash().unwrap().digest(), &issued);

    coordinator.sign(&mut session, &wallet).unwrap();
    let signature = *session.signature().unwrap();
    assert!(wallet.verify_digest(&issued, &signature));

    let signed_tx = coordinator.finalize(&mut session).await.unwrap();
    assert!(signed_tx.ends_with(&hex::encode(signature)));

    let result = coordinator.submit(&mut session).await.unwrap();
    assert!(result.accepted);
    assert_eq!(session.state(), SigningState::Submitted);
    assert_eq!(mock.submitted_transactions(), vec![signed_tx]);
}

#[tokio::test]
async fn test_insufficient_balance_makes_no_hash_request() {
    let wallet = Wallet::from_private_key([0x12; 32]).unwrap();
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, wallet.address(), &[300, 200]);

    let err = DraftBuilder::new(mock.clone(), &WalletConfig::default())
        .build_transfer(wallet.address(), recipient(), Amount::from(1_000u64), None)
        .await
        .unwrap_err();

    match err {
        WalletError::InsufficientBalance {
            required,
            available,
        } => {
            assert_eq!(required, Amount::from(1_000u64));
            assert_eq!(available, Amount::from(500u64));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(mock.calls(), vec!["getUTXO"]);
}

#[tokio::test]
async fn test_flat_fee_is_carried_into_change() {
    let wallet = Wallet::from_private_key([0x13; 32]).unwrap();
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, wallet.address(), &[400, 700]);
    let config = WalletConfig::default().with_fee_policy(FeePolicy::Flat(Amount::from(50u64)));

    let draft = DraftBuilder::new(mock.clone(), &config)
        .build_transfer(wallet.address(), recipient(), Amount::from(600u64), None)
        .await
        .unwrap();

    // 650 needed: the 700 UTXO covers it alone
    assert_eq!(draft.inputs().len(), 1);
    assert_eq!(draft.fee(), Amount::from(50u64));
    assert_eq!(draft.outputs()[1].amount(), Amount::from(50u64));
    assert_eq!(draft.output_total() + draft.fee(), draft.input_total());
}

#[tokio::test]
async fn test_invalid_lock_fails_before_any_network_call() {
    let wallet = Wallet::from_private_key([0x14; 32]).unwrap();
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, wallet.address(), &[1_000]);

    let lock = LockingCondition::multi_key(3, vec![wallet.public_key_compressed().unwrap().to_vec()], false);
    let result = DraftBuilder::new(mock.clone(), &WalletConfig::default())
        .build_with_lock(wallet.address(), recipient(), Amount::from(10u64), None, lock)
        .await;

    assert!(matches!(result, Err(WalletError::ValidationError(_))));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_ledger_rejection_is_final() {
    let wallet = Wallet::from_private_key([0x15; 32]).unwrap();
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, wallet.address(), &[5_000]);
    mock.reject_submissions("input already spent");
    let config = WalletConfig::default();

    let draft = DraftBuilder::new(mock.clone(), &config)
        .build_transfer(wallet.address(), recipient(), Amount::from(1_000u64), None)
        .await
        .unwrap();
    let err = SigningCoordinator::new(mock.clone(), &config)
        .sign_and_submit(draft, &wallet)
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::Rejected { .. }));
    assert!(err.requires_new_draft());
    assert_eq!(mock.submitted_transactions().len(), 1);
}

#[tokio::test]
async fn test_authority_errors_are_not_retried() {
    let wallet = Wallet::from_private_key([0x16; 32]).unwrap();
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, wallet.address(), &[5_000]);
    let config = WalletConfig::default();

    let draft = DraftBuilder::new(mock.clone(), &config)
        .build_transfer(wallet.address(), recipient(), Amount::from(1_000u64), None)
        .await
        .unwrap();
    mock.set_failure_modes(MockAuthorityFailureModes {
        fail_finalize: true,
        ..Default::default()
    });

    let coordinator = SigningCoordinator::new(mock.clone(), &config);
    let mut session = SigningSession::new(draft);
    coordinator.request_hash(&mut session).await.unwrap();
    coordinator.sign(&mut session, &wallet).unwrap();
    assert!(matches!(
        coordinator.finalize(&mut session).await,
        Err(WalletError::AuthorityError { .. })
    ));
    assert_eq!(session.state(), SigningState::Rejected);
    assert_eq!(mock.call_count("finalizeTransactionFromDraft"), 1);
    assert_eq!(mock.call_count("sendRawTransaction"), 0);
}

#[tokio::test]
async fn test_configured_sighash_and_input_index_reach_the_authority() {
    let wallet = Wallet::from_private_key([0x17; 32]).unwrap();
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, wallet.address(), &[5_000]);
    let config = WalletConfig::default()
        .with_sighash_type(SighashType::SingleAnyoneCanPay)
        .with_input_index(0);

    let draft = DraftBuilder::new(mock.clone(), &config)
        .build_transfer(wallet.address(), recipient(), Amount::from(1_000u64), None)
        .await
        .unwrap();
    SigningCoordinator::new(mock.clone(), &config)
        .sign_and_submit(draft, &wallet)
        .await
        .unwrap();

    let finalize = &mock.finalize_requests()[0];
    assert_eq!(finalize.sighash_type, SighashType::SingleAnyoneCanPay);
    let wire = serde_json::to_value(finalize).unwrap();
    assert_eq!(wire["sighash_type"], 0x83);
    assert!(wire.get("unsignedTx").is_some());
    let pubkey = wire["pubkey"].as_str().unwrap();
    assert!(pubkey.starts_with("0x"));
    assert_eq!(pubkey.len(), 2 + 66);
}

#[tokio::test]
async fn test_cosigners_then_final_signer() {
    let owner = Wallet::from_private_key([0x18; 32]).unwrap();
    let cosigners = [
        Wallet::from_private_key([0x19; 32]).unwrap(),
        Wallet::from_private_key([0x1A; 32]).unwrap(),
    ];
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, owner.address(), &[10_000]);
    let config = WalletConfig::default();

    let keys = cosigners
        .iter()
        .map(|w| w.public_key_compressed().unwrap().to_vec())
        .collect();
    let draft = DraftBuilder::new(mock.clone(), &config)
        .build_with_lock(
            owner.address(),
            recipient(),
            Amount::from(2_500u64),
            None,
            LockingCondition::multi_key(2, keys, true),
        )
        .await
        .unwrap();

    let coordinator = SigningCoordinator::new(mock.clone(), &config);
    let mut digests = Vec::new();
    for cosigner in &cosigners {
        let cosignature = coordinator.cosign(&draft, cosigner).await.unwrap();
        digests.push(cosignature.digest);
    }
    // Same draft, same parameters: every signer signs the same digest
    assert_eq!(digests[0], digests[1]);

    let (_, result) = coordinator.sign_and_submit(draft, &owner).await.unwrap();
    assert!(result.accepted);
    assert_eq!(mock.call_count("computeSignatureHashFromDraft"), 3);
    assert_eq!(mock.call_count("finalizeTransactionFromDraft"), 1);
}

#[tokio::test]
async fn test_cached_snapshots_and_batch_queries() {
    let mock = Arc::new(MockSettlementAuthority::new());
    let addresses: Vec<Address> = (0..6u8).map(|i| Address::new([i; 20])).collect();
    for (i, address) in addresses.iter().enumerate() {
        funded(&mock, *address, &[(i as u64 + 1) * 100]);
    }
    mock.fail_address(addresses[3]);

    let caching: Arc<dyn SettlementAuthority> =
        Arc::new(CachingAuthority::new(mock.clone(), &WalletConfig::default()));
    let processor = BatchProcessor::new(2, 2);

    let first = fetch_utxos_for_addresses(caching.clone(), addresses.clone(), &processor).await;
    assert_eq!(first.len(), 6);
    for (i, (address, result)) in first.iter().enumerate() {
        assert_eq!(*address, addresses[i]);
        if i == 3 {
            assert!(matches!(result, Err(WalletError::TransportError(_))));
        } else {
            assert_eq!(result.as_ref().unwrap()[0].amount, Amount::from((i as u64 + 1) * 100));
        }
    }

    // Only the failed address goes back to the authority
    mock.clear_failing_addresses();
    let second = fetch_utxos_for_addresses(caching, addresses, &processor).await;
    assert!(second.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(mock.call_count("getUTXO"), 7);
}

#[tokio::test]
async fn test_submission_refreshes_cached_snapshot() {
    let wallet = Wallet::from_private_key([0x1B; 32]).unwrap();
    let mock = Arc::new(MockSettlementAuthority::new());
    funded(&mock, wallet.address(), &[5_000]);
    let config = WalletConfig::default();
    let caching: Arc<dyn SettlementAuthority> =
        Arc::new(CachingAuthority::new(mock.clone(), &config));
    let builder = DraftBuilder::new(caching.clone(), &config);

    let first = builder
        .build_transfer(wallet.address(), recipient(), Amount::from(1_000u64), None)
        .await
        .unwrap();
    SigningCoordinator::new(caching.clone(), &config)
        .sign_and_submit(first, &wallet)
        .await
        .unwrap();

    // After the submission the ledger holds only the change output
    let change = Utxo::native(
        Outpoint::new(Hash256::new([0x77; 32]), 1),
        Amount::from(4_000u64),
    );
    mock.set_utxos(wallet.address(), vec![change.clone()]);

    let second = builder
        .build_transfer(wallet.address(), recipient(), Amount::from(500u64), None)
        .await
        .unwrap();
    assert_eq!(second.inputs()[0].outpoint(), change.outpoint);
    assert_eq!(mock.call_count("getUTXO"), 2);
}
