//! Tests for the transaction store.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{MockTransactionGateway, NotificationLevel};
use crate::domain::ErrorCode;
use crate::test_support::{RecordingNotifier, transaction};

type Store = TransactionStore<MockTransactionGateway, RecordingNotifier>;

fn make_store(
    gateway: MockTransactionGateway,
    policy: RefreshFailurePolicy,
) -> (Store, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let store = TransactionStore::new(Arc::new(gateway), Arc::clone(&notifier), policy);
    (store, notifier)
}

fn draft() -> TransactionDraft {
    TransactionDraft {
        name: "Sofa".to_owned(),
        kind: "furniture".to_owned(),
        date: "2024-05-01".to_owned(),
        source_city: "Pune".to_owned(),
        destination_city: "Delhi".to_owned(),
        description: None,
        amount: None,
    }
}

fn three_records() -> Vec<Transaction> {
    vec![
        transaction(1, "Sofa"),
        transaction(2, "Piano"),
        transaction(3, "Boxes"),
    ]
}

fn seeded(gateway: &mut MockTransactionGateway, records: Vec<Transaction>) {
    gateway.expect_list().times(1).return_once(move || Ok(records));
}

#[tokio::test]
async fn create_refetches_and_replaces_snapshot() {
    let mut gateway = MockTransactionGateway::new();
    gateway
        .expect_create()
        .withf(|draft| draft.name == "Sofa")
        .times(1)
        .return_once(|_| Ok(Acknowledgement::default()));
    seeded(&mut gateway, three_records());
    let (store, notifier) = make_store(gateway, RefreshFailurePolicy::default());

    let message = store
        .create_transaction(&draft())
        .await
        .expect("create succeeds");

    assert_eq!(message, "Transaction created successfully");
    assert_eq!(store.transactions(), three_records());
    assert_eq!(store.transactions().len(), 3);
    assert!(!store.is_loading());
    assert_eq!(
        notifier.messages(NotificationLevel::Success),
        vec!["Transaction created successfully".to_owned()]
    );
}

#[tokio::test]
async fn success_prefers_backend_message() {
    let mut gateway = MockTransactionGateway::new();
    gateway
        .expect_pay()
        .return_once(|_| Ok(Acknowledgement::with_message("Payment received")));
    seeded(&mut gateway, vec![transaction(7, "Piano")]);
    let (store, notifier) = make_store(gateway, RefreshFailurePolicy::default());

    let message = store
        .pay_transaction(TransactionId::new(7))
        .await
        .expect("pay succeeds");

    assert_eq!(message, "Payment received");
    assert_eq!(
        notifier.messages(NotificationLevel::Success),
        vec!["Payment received".to_owned()]
    );
}

#[rstest]
#[case(ApiError::rejected(403_u16, "Only admins can delete"), "Only admins can delete", true)]
#[case(ApiError::status(404_u16), "Failed to delete transaction", true)]
#[case(ApiError::server_fault(500_u16), crate::domain::SERVER_FAULT_MESSAGE, false)]
#[case(ApiError::unauthorized("expired"), "expired", false)]
#[case(ApiError::timeout("deadline"), "Failed to delete transaction", true)]
#[tokio::test]
async fn failed_mutation_keeps_snapshot_and_skips_refetch(
    #[case] failure: ApiError,
    #[case] expected: &str,
    #[case] notified: bool,
) {
    let mut gateway = MockTransactionGateway::new();
    seeded(&mut gateway, vec![transaction(1, "Sofa")]);
    gateway
        .expect_delete()
        .times(1)
        .return_once(move |_| Err(failure));
    let (store, notifier) = make_store(gateway, RefreshFailurePolicy::default());
    store.fetch_transactions().await.expect("initial load");
    let before = store.transactions();

    let err = store
        .delete_transaction(TransactionId::new(1))
        .await
        .expect_err("delete fails");

    assert_eq!(err.message(), expected);
    assert_eq!(store.transactions(), before);
    assert!(!store.is_loading());
    let expected_notifications = if notified {
        vec![expected.to_owned()]
    } else {
        Vec::new()
    };
    assert_eq!(
        notifier.messages(NotificationLevel::Error),
        expected_notifications
    );
}

#[tokio::test]
async fn invalid_draft_short_circuits_without_calls() {
    let mut gateway = MockTransactionGateway::new();
    gateway.expect_create().never();
    gateway.expect_list().never();
    let (store, notifier) = make_store(gateway, RefreshFailurePolicy::default());
    let mut invalid = draft();
    invalid.source_city = "  ".to_owned();

    let err = store
        .create_transaction(&invalid)
        .await
        .expect_err("validation fails");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(!store.is_loading());
    assert_eq!(notifier.messages(NotificationLevel::Error).len(), 1);
}

#[rstest]
#[case(-5.0)]
#[case(f64::INFINITY)]
#[tokio::test]
async fn invalid_amount_short_circuits(#[case] raw: f64) {
    let mut gateway = MockTransactionGateway::new();
    gateway.expect_update_amount().never();
    let (store, _notifier) = make_store(gateway, RefreshFailurePolicy::default());

    let err = store
        .update_amount(TransactionId::new(1), raw)
        .await
        .expect_err("invalid amount");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn empty_update_short_circuits() {
    let mut gateway = MockTransactionGateway::new();
    gateway.expect_update().never();
    let (store, _notifier) = make_store(gateway, RefreshFailurePolicy::default());

    store
        .update_transaction(TransactionId::new(1), &TransactionChanges::default())
        .await
        .expect_err("empty changes");
}

#[tokio::test]
async fn transitions_send_trimmed_values() {
    let mut gateway = MockTransactionGateway::new();
    gateway
        .expect_update_delivery_status()
        .withf(|id, status| id.get() == 4 && status == "in transit")
        .times(1)
        .return_once(|_, _| Ok(Acknowledgement::default()));
    gateway
        .expect_update_delivery_date()
        .withf(|_, date| date == "2024-06-01")
        .times(1)
        .return_once(|_, _| Ok(Acknowledgement::default()));
    gateway
        .expect_update_amount()
        .withf(|_, amount| (amount.get() - 250.0).abs() < f64::EPSILON)
        .times(1)
        .return_once(|_, _| Ok(Acknowledgement::default()));
    gateway
        .expect_list()
        .times(3)
        .returning(|| Ok(vec![transaction(4, "Sofa")]));
    let (store, notifier) = make_store(gateway, RefreshFailurePolicy::default());
    let id = TransactionId::new(4);

    store
        .update_delivery_status(id, " in transit ")
        .await
        .expect("status");
    store
        .update_delivery_date(id, "2024-06-01")
        .await
        .expect("date");
    store.update_amount(id, 250.0).await.expect("amount");

    assert_eq!(
        notifier.messages(NotificationLevel::Success),
        vec![
            "Delivery status updated".to_owned(),
            "Delivery date updated".to_owned(),
            "Amount updated".to_owned(),
        ]
    );
}

#[rstest]
#[case(RefreshFailurePolicy::Clear, 0)]
#[case(RefreshFailurePolicy::Preserve, 1)]
#[tokio::test]
async fn refresh_failure_follows_policy(
    #[case] policy: RefreshFailurePolicy,
    #[case] remaining: usize,
) {
    let mut gateway = MockTransactionGateway::new();
    let mut calls = 0;
    gateway.expect_list().times(2).returning(move || {
        calls += 1;
        if calls == 1 {
            Ok(vec![transaction(1, "Sofa")])
        } else {
            Err(ApiError::transport("offline"))
        }
    });
    let (store, _notifier) = make_store(gateway, policy);
    store.fetch_transactions().await.expect("first load");

    store
        .fetch_transactions()
        .await
        .expect_err("second load fails");

    assert_eq!(store.transactions().len(), remaining);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn mutation_succeeds_even_when_refetch_fails() {
    let mut gateway = MockTransactionGateway::new();
    gateway
        .expect_pay()
        .return_once(|_| Ok(Acknowledgement::default()));
    gateway
        .expect_list()
        .return_once(|| Err(ApiError::server_fault(502_u16)));
    let (store, _notifier) = make_store(gateway, RefreshFailurePolicy::Clear);

    let message = store
        .pay_transaction(TransactionId::new(1))
        .await
        .expect("pay succeeds");
    assert_eq!(message, "Payment successful");
    assert!(store.transactions().is_empty());
}

#[tokio::test]
async fn get_transaction_leaves_cache_alone() {
    let mut gateway = MockTransactionGateway::new();
    gateway
        .expect_get()
        .withf(|id| id.get() == 9)
        .return_once(|_| Ok(transaction(9, "Crate")));
    let (store, notifier) = make_store(gateway, RefreshFailurePolicy::default());

    let record = store
        .get_transaction(TransactionId::new(9))
        .await
        .expect("review succeeds");

    assert_eq!(record.name, "Crate");
    assert!(store.transactions().is_empty());
    assert!(notifier.notifications().is_empty());
}

#[tokio::test]
async fn find_looks_up_cached_records() {
    let mut gateway = MockTransactionGateway::new();
    seeded(&mut gateway, three_records());
    let (store, _notifier) = make_store(gateway, RefreshFailurePolicy::default());
    let updates = store.subscribe();

    store.fetch_transactions().await.expect("load");

    assert!(updates.has_changed().expect("sender alive"));
    assert_eq!(
        store.find(TransactionId::new(2)).map(|record| record.name),
        Some("Piano".to_owned())
    );
    assert!(store.find(TransactionId::new(42)).is_none());
}

#[rstest]
#[case("clear", RefreshFailurePolicy::Clear)]
#[case("PRESERVE", RefreshFailurePolicy::Preserve)]
fn refresh_policy_parses_config_spellings(
    #[case] raw: &str,
    #[case] expected: RefreshFailurePolicy,
) {
    assert_eq!(raw.parse::<RefreshFailurePolicy>().expect("parse"), expected);
}
