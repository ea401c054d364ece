//! Fetch / initialize / append protocol against the in-memory ledger

use meme_portal_sdk::testing::InMemoryLedger;
use meme_portal_sdk::*;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    ledger: Arc<InMemoryLedger>,
    client: RemoteStoreClient,
    ctx: ConnectionContext,
    user: Pubkey,
}

async fn harness() -> Harness {
    let descriptor = ProgramDescriptor::new(Pubkey::new_unique());
    let ledger = Arc::new(InMemoryLedger::new(descriptor.clone()));
    let credential = StoreCredential::from_keypair(Keypair::new());
    let client = RemoteStoreClient::new(ledger.clone(), credential, descriptor);

    let wallet = Arc::new(KeypairWallet::new(Keypair::new(), true));
    let user = wallet.pubkey();
    let session = SessionManager::new(Some(wallet as Arc<dyn WalletExtension>))
        .check_session()
        .await;
    assert_eq!(session.address(), Some(user));

    let ctx = ConnectionContext::build(&NetworkConfig::default(), session);
    Harness {
        ledger,
        client,
        ctx,
        user,
    }
}

fn links(list: &RecordList) -> Vec<&str> {
    list.records().iter().map(|r| r.link.as_str()).collect()
}

#[tokio::test]
async fn test_fetch_before_initialize_is_uninitialized() {
    let h = harness().await;

    assert_eq!(h.client.fetch(&h.ctx).await, RecordList::Uninitialized);
    assert_eq!(h.client.fetch_state(&h.ctx).await, StoreState::Uninitialized);
    assert_eq!(h.client.cache().snapshot(), Some(RecordList::Uninitialized));
}

#[tokio::test]
async fn test_initialize_then_fetch_is_empty() {
    let h = harness().await;

    let submitted = h.client.initialize(&h.ctx).await.unwrap();
    assert_eq!(submitted.records, RecordList::Records(vec![]));

    let list = h.client.fetch(&h.ctx).await;
    assert_eq!(list, RecordList::Records(vec![]));
    assert_eq!(h.ledger.submission_count(), 1);
}

#[tokio::test]
async fn test_append_records_link_and_creator() {
    let h = harness().await;
    h.client.initialize(&h.ctx).await.unwrap();
    h.client.append(&h.ctx, "http://first").await.unwrap();
    let before = h.client.fetch(&h.ctx).await;

    let outcome = h.client.append(&h.ctx, "http://second").await.unwrap();
    let AppendOutcome::Appended(submitted) = outcome else {
        panic!("expected Appended, got {:?}", outcome);
    };

    let after = h.client.fetch(&h.ctx).await;
    assert_eq!(submitted.records, after);

    let records = after.records();
    assert_eq!(records.len(), 2);
    let last = records.last().unwrap();
    assert_eq!(last.link, "http://second");
    assert_eq!(last.creator, h.user);
    assert_eq!(&records[..1], before.records());
}

#[tokio::test]
async fn test_append_empty_link_submits_nothing() {
    let h = harness().await;
    h.client.initialize(&h.ctx).await.unwrap();
    h.client.append(&h.ctx, "http://a").await.unwrap();
    let submissions = h.ledger.submission_count();
    let cached = h.client.cache().snapshot();

    let outcome = h.client.append(&h.ctx, "").await.unwrap();

    assert_eq!(outcome, AppendOutcome::Skipped);
    assert_eq!(h.ledger.submission_count(), submissions);
    assert_eq!(h.client.cache().snapshot(), cached);
}

#[tokio::test]
async fn test_network_failure_reads_as_uninitialized() {
    let h = harness().await;
    h.client.initialize(&h.ctx).await.unwrap();
    h.client.append(&h.ctx, "http://a").await.unwrap();
    assert_eq!(links(&h.client.fetch(&h.ctx).await), vec!["http://a"]);

    h.ledger.set_fail_reads(true);

    assert_eq!(h.client.fetch(&h.ctx).await, RecordList::Uninitialized);
    assert!(matches!(
        h.client.fetch_state(&h.ctx).await,
        StoreState::FetchFailed(FetchError::Network(_))
    ));
    // The failed read does not overwrite the last successful one
    let cached = h.client.cache().snapshot().unwrap();
    assert_eq!(links(&cached), vec!["http://a"]);
}

#[tokio::test]
async fn test_scenario_preserves_submission_order() {
    let h = harness().await;
    assert!(h.client.fetch(&h.ctx).await.is_uninitialized());

    h.client.initialize(&h.ctx).await.unwrap();
    h.client.append(&h.ctx, "http://a").await.unwrap();
    h.client.append(&h.ctx, "http://b").await.unwrap();

    let list = h.client.fetch(&h.ctx).await;
    assert_eq!(links(&list), vec!["http://a", "http://b"]);
    assert!(list.records().iter().all(|r| r.creator == h.user));
}

#[tokio::test]
async fn test_missing_signer_submits_nothing() {
    let h = harness().await;
    let ctx = ConnectionContext::build(&NetworkConfig::default(), Session::empty());

    assert_eq!(
        h.client.initialize(&ctx).await.unwrap_err(),
        SubmissionError::MissingSigner
    );
    assert_eq!(
        h.client.append(&ctx, "http://a").await.unwrap_err(),
        SubmissionError::MissingSigner
    );
    assert_eq!(h.ledger.submission_count(), 0);

    // Reads need no signer
    assert_eq!(h.client.fetch(&ctx).await, RecordList::Uninitialized);
}

#[tokio::test]
async fn test_second_initialize_is_rejected_remotely() {
    let h = harness().await;
    h.client.initialize(&h.ctx).await.unwrap();
    h.client.append(&h.ctx, "http://a").await.unwrap();

    let err = h.client.initialize(&h.ctx).await.unwrap_err();
    assert!(err.is_rejection());

    assert_eq!(links(&h.client.fetch(&h.ctx).await), vec!["http://a"]);
}

#[tokio::test]
async fn test_concurrent_initialize_is_guarded_locally() {
    let h = harness().await;
    h.ledger.set_submit_delay(Some(Duration::from_millis(20)));

    let (first, second) = tokio::join!(h.client.initialize(&h.ctx), h.client.initialize(&h.ctx));

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), SubmissionError::InitializeInFlight);
    assert_eq!(h.ledger.submission_count(), 1);

    // The guard is released once the first call returns
    h.ledger.set_submit_delay(None);
    assert!(h.client.initialize(&h.ctx).await.unwrap_err().is_rejection());
}

#[tokio::test]
async fn test_append_before_initialize_leaves_cache_untouched() {
    let h = harness().await;
    h.client.fetch(&h.ctx).await;

    let err = h.client.append(&h.ctx, "http://a").await.unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(h.client.cache().snapshot(), Some(RecordList::Uninitialized));
}

#[tokio::test]
async fn test_submission_network_failure_leaves_cache_untouched() {
    let h = harness().await;
    h.client.initialize(&h.ctx).await.unwrap();
    let cached = h.client.cache().snapshot();

    h.ledger.set_fail_submissions(true);
    let err = h.client.append(&h.ctx, "http://a").await.unwrap_err();

    assert!(matches!(err, SubmissionError::Network(_)));
    assert_eq!(h.client.cache().snapshot(), cached);

    h.ledger.set_fail_submissions(false);
    assert_eq!(h.client.fetch(&h.ctx).await, RecordList::Records(vec![]));
}

#[tokio::test]
async fn test_subscribers_observe_resync() {
    let h = harness().await;
    let mut receiver = h.client.cache().subscribe();

    h.client.initialize(&h.ctx).await.unwrap();
    receiver.changed().await.unwrap();
    assert_eq!(
        *receiver.borrow_and_update(),
        Some(RecordList::Records(vec![]))
    );

    h.client.append(&h.ctx, "http://a").await.unwrap();
    receiver.changed().await.unwrap();
    let seen = receiver.borrow_and_update().clone().unwrap();
    assert_eq!(links(&seen), vec!["http://a"]);
}

#[tokio::test]
async fn test_undecodable_payload_is_fetch_failure() {
    let h = harness().await;
    h.ledger.set_account_data(h.client.store_address(), vec![0xAB; 64]);

    assert!(matches!(
        h.client.fetch_state(&h.ctx).await,
        StoreState::FetchFailed(FetchError::Decode(_))
    ));
    assert_eq!(h.client.fetch(&h.ctx).await, RecordList::Uninitialized);
    assert!(h.client.cache().snapshot().is_none());
}

#[tokio::test]
async fn test_concurrent_appends_both_land() {
    let h = harness().await;
    h.client.initialize(&h.ctx).await.unwrap();

    let (a, b) = tokio::join!(
        h.client.append(&h.ctx, "http://a"),
        h.client.append(&h.ctx, "http://b")
    );
    assert!(a.is_ok() && b.is_ok());

    let list = h.client.fetch(&h.ctx).await;
    let mut seen = links(&list);
    seen.sort_unstable();
    assert_eq!(seen, vec!["http://a", "http://b"]);
}
