//! Transfer integration tests.

mod common;

use axum::http::StatusCode;
use common::{Session, TestHarness};
use serde_json::{json, Value};

/// Alice with a default account A funded to `balance` and an empty account B.
async fn funded(harness: &TestHarness, balance: Value) -> (Session, Value, Value) {
    let alice = harness.session("alice@x.com").await;
    let number = harness.number_of(&alice, &alice.account_id).await;
    harness.fund(&alice, &number, balance).await;
    let a = harness.account(&alice, &number).await;
    let b = harness.open_account(&alice).await;
    (alice, a, b)
}

async fn transfer(
    harness: &TestHarness,
    session: &Session,
    from: &Value,
    to: &Value,
    amount: Value,
) -> axum_test::TestResponse {
    harness
        .server
        .post("/v1/transaction")
        .add_header("authorization", session.auth_header.clone())
        .json(&json!({
            "account_from": from["account_id"],
            "account_to": to["account_id"],
            "amount": amount,
            "date": "2026-01-01T00:00:00Z",
        }))
        .await
}

async fn balance(harness: &TestHarness, session: &Session, account: &Value) -> String {
    let number = account["account_number"].as_str().unwrap();
    harness.account(session, number).await["balance"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn transfer_moves_money() {
    let harness = TestHarness::new();
    let (alice, a, b) = funded(&harness, json!(100)).await;

    let response = transfer(&harness, &alice, &a, &b, json!(40)).await;

    response.assert_status(StatusCode::CREATED);
    let receipt: Value = response.json();
    assert_eq!(receipt["account_from"], a["account_id"]);
    assert_eq!(receipt["account_to"], b["account_id"]);
    assert_eq!(receipt["amount"], "40");
    assert!(receipt["transaction_id"].is_string());

    assert_eq!(balance(&harness, &alice, &a).await, "60");
    assert_eq!(balance(&harness, &alice, &b).await, "40");
}

#[tokio::test]
async fn transfer_shows_in_both_histories() {
    let harness = TestHarness::new();
    let (alice, a, b) = funded(&harness, json!(100)).await;
    transfer(&harness, &alice, &a, &b, json!(40))
        .await
        .assert_status(StatusCode::CREATED);
    transfer(&harness, &alice, &b, &a, json!("2.5"))
        .await
        .assert_status(StatusCode::CREATED);

    for account in [&a, &b] {
        let number = account["account_number"].as_str().unwrap();
        let history: Vec<Value> = harness
            .server
            .get(&format!("/v1/account/{number}/transactions"))
            .add_header("authorization", alice.auth_header.clone())
            .await
            .json();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["amount"], "2.5");
        assert_eq!(history[1]["amount"], "40");
    }
}

#[tokio::test]
async fn self_transfer_is_conversion_type() {
    let harness = TestHarness::new();
    let (alice, a, _) = funded(&harness, json!(100)).await;

    let response = transfer(&harness, &alice, &a, &a, json!(10)).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "conversion_type");
    assert_eq!(balance(&harness, &alice, &a).await, "100");
}

#[tokio::test]
async fn non_positive_amount_is_amount_too_small() {
    let harness = TestHarness::new();
    let (alice, a, b) = funded(&harness, json!(100)).await;

    for amount in [json!(0), json!(-5)] {
        let response = transfer(&harness, &alice, &a, &b, amount).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "amount_too_small");
    }
}

#[tokio::test]
async fn insufficient_funds_is_amount_too_small() {
    let harness = TestHarness::new();
    let (alice, a, b) = funded(&harness, json!(5)).await;

    let response = transfer(&harness, &alice, &a, &b, json!(10)).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "amount_too_small");
    assert_eq!(balance(&harness, &alice, &a).await, "5");
    assert_eq!(balance(&harness, &alice, &b).await, "0");
}

#[tokio::test]
async fn unknown_destination_is_not_found() {
    let harness = TestHarness::new();
    let (alice, a, _) = funded(&harness, json!(100)).await;
    let ghost = json!({ "account_id": "ghostacct1" });

    let response = transfer(&harness, &alice, &a, &ghost, json!(1)).await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("ghostacct1"));
}

#[tokio::test]
async fn non_numeric_amount_is_conversion_type() {
    let harness = TestHarness::new();
    let (alice, a, b) = funded(&harness, json!(100)).await;

    let response = transfer(&harness, &alice, &a, &b, json!("forty")).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "conversion_type");
}

#[tokio::test]
async fn storage_failure_rolls_back_and_hides_details() {
    let harness = TestHarness::new();
    let (alice, a, b) = funded(&harness, json!(100)).await;
    harness.store.fail_next_transaction_insert();

    let response = transfer(&harness, &alice, &a, &b, json!(40)).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "internal_error");
    assert!(!body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("injected"));
    assert_eq!(balance(&harness, &alice, &a).await, "100");
    assert_eq!(balance(&harness, &alice, &b).await, "0");
}
