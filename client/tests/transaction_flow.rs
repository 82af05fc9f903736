//! Transaction store and event handling over the real HTTP adapters.

use client::domain::ports::NotificationLevel;
use client::domain::{
    ErrorCode, LOGIN_PATH, SERVER_FAULT_MESSAGE, SESSION_EXPIRED_MESSAGE, TransactionDraft,
    TransactionId,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;

use support::{Backend, start};

const ALICE: &str = r#"{"id":1,"username":"alice","email":"alice@example.com","roles":["user"]}"#;

fn record(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "user_id": 1,
        "type": "furniture",
        "date": "2024-05-01",
        "delivery_date": "to be updated",
        "source_city": "Pune",
        "destination_city": "Delhi",
        "internal_status": "requested",
        "delivery_status": "processing",
        "description": null,
        "amount": 0.0,
        "user": "alice"
    })
}

async fn signed_in() -> Backend {
    let backend = start(&[("token", "T1"), ("user", ALICE)]).await;
    Mock::given(method("GET"))
        .and(path("/api/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ALICE))
        .mount(&backend.server)
        .await;
    backend
        .app
        .navigate("/transactions")
        .await
        .expect("navigate");
    backend
}

#[tokio::test]
async fn listing_sends_stored_token() {
    let backend = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/get"))
        .and(header("Authentication-Token", "T1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([record(1, "Sofa"), record(2, "Piano")])),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let count = backend
        .app
        .transactions()
        .fetch_transactions()
        .await
        .expect("list");

    assert_eq!(count, 2);
    let names: Vec<String> = backend
        .app
        .transactions()
        .transactions()
        .into_iter()
        .map(|transaction| transaction.name)
        .collect();
    assert_eq!(names, vec!["Sofa".to_owned(), "Piano".to_owned()]);
}

#[tokio::test]
async fn listing_skips_invalid_records() {
    let backend = signed_in().await;
    let mut broken = record(2, "Piano");
    broken["amount"] = json!(-1.0);
    Mock::given(method("GET"))
        .and(path("/api/get"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([record(1, "Sofa"), broken, record(3, "Desk")])),
        )
        .mount(&backend.server)
        .await;

    let count = backend
        .app
        .transactions()
        .fetch_transactions()
        .await
        .expect("list");

    assert_eq!(count, 2);
    let ids: Vec<u64> = backend
        .app
        .transactions()
        .transactions()
        .into_iter()
        .map(|transaction| transaction.id.get())
        .collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(backend.notifier.messages(NotificationLevel::Error).is_empty());
}

#[tokio::test]
async fn create_refetches_the_collection() {
    let backend = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/api/create"))
        .and(body_json(json!({
            "name": "Desk",
            "type": "furniture",
            "date": "2024-05-03",
            "source_city": "Pune",
            "destination_city": "Mumbai"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            record(1, "Sofa"),
            record(2, "Piano"),
            record(3, "Desk")
        ])))
        .expect(1)
        .mount(&backend.server)
        .await;
    let draft = TransactionDraft {
        name: "Desk".to_owned(),
        kind: "furniture".to_owned(),
        date: "2024-05-03".to_owned(),
        source_city: "Pune".to_owned(),
        destination_city: "Mumbai".to_owned(),
        description: None,
        amount: None,
    };

    let message = backend
        .app
        .transactions()
        .create_transaction(&draft)
        .await
        .expect("create");

    assert_eq!(message, "Transaction created successfully");
    assert_eq!(backend.app.transactions().transactions().len(), 3);
    assert!(!backend.app.transactions().is_loading());
    assert_eq!(
        backend.notifier.messages(NotificationLevel::Success),
        vec!["Transaction created successfully".to_owned()]
    );
}

#[tokio::test]
async fn rejected_mutation_surfaces_backend_message() {
    let backend = signed_in().await;
    Mock::given(method("DELETE"))
        .and(path("/api/delete/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "Transaction not found"})),
        )
        .mount(&backend.server)
        .await;

    let err = backend
        .app
        .transactions()
        .delete_transaction(TransactionId::new(9))
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(
        backend.notifier.messages(NotificationLevel::Error),
        vec!["Transaction not found".to_owned()]
    );
    assert!(!backend.app.transactions().is_loading());
}

#[tokio::test]
async fn expired_token_tears_down_the_session() {
    let backend = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/get"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&backend.server)
        .await;

    let err = backend
        .app
        .transactions()
        .fetch_transactions()
        .await
        .expect_err("expired");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert!(backend.storage.snapshot().is_empty());

    assert_eq!(backend.app.process_events().await, 1);

    assert!(!backend.app.session().is_authenticated());
    assert!(backend.app.session().snapshot().token().is_none());
    assert_eq!(
        backend.app.location().map(|found| found.path().to_owned()),
        Some(LOGIN_PATH.to_owned())
    );
    assert_eq!(
        backend.notifier.messages(NotificationLevel::Warning),
        vec![SESSION_EXPIRED_MESSAGE.to_owned()]
    );
}

#[tokio::test]
async fn expired_token_during_mutation_warns_once() {
    let backend = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/pay/4"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&backend.server)
        .await;

    let err = backend
        .app
        .transactions()
        .pay_transaction(TransactionId::new(4))
        .await
        .expect_err("expired");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(backend.app.process_events().await, 1);

    assert!(backend.notifier.messages(NotificationLevel::Error).is_empty());
    assert_eq!(
        backend.notifier.messages(NotificationLevel::Warning),
        vec![SESSION_EXPIRED_MESSAGE.to_owned()]
    );
}

#[tokio::test]
async fn server_faults_show_generic_text() {
    let backend = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/pay/4"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "Traceback (most recent call last)"})),
        )
        .mount(&backend.server)
        .await;

    let err = backend
        .app
        .transactions()
        .pay_transaction(TransactionId::new(4))
        .await
        .expect_err("fault");

    assert_eq!(err.message(), SERVER_FAULT_MESSAGE);
    assert_eq!(backend.app.process_events().await, 1);
    assert!(backend.app.session().is_authenticated());
    assert_eq!(
        backend.notifier.messages(NotificationLevel::Error),
        vec![SERVER_FAULT_MESSAGE.to_owned()]
    );
}

#[tokio::test]
async fn amount_updates_post_the_new_amount() {
    let backend = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/api/update_amount/3"))
        .and(body_json(json!({"amount": 250.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Amount updated"})))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([record(3, "Desk")])))
        .mount(&backend.server)
        .await;

    let message = backend
        .app
        .transactions()
        .update_amount(TransactionId::new(3), 250.0)
        .await
        .expect("amount");

    assert_eq!(message, "Amount updated");
}

#[tokio::test]
async fn review_does_not_touch_the_cache() {
    let backend = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/review_transaction/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(2, "Piano")))
        .mount(&backend.server)
        .await;

    let transaction = backend
        .app
        .transactions()
        .get_transaction(TransactionId::new(2))
        .await
        .expect("review");

    assert_eq!(transaction.name, "Piano");
    assert!(backend.app.transactions().transactions().is_empty());
}
