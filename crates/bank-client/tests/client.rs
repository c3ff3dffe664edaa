//! Client SDK tests against a mocked service.

use bank_client::{BankClient, ClientError};
use bank_core::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "6f1c1f4e-3b1a-4c1e-9d5a-2b7f0e8a9c10";

async fn authed(server: &MockServer) -> BankClient {
    BankClient::new(server.uri()).unwrap().with_token("tok")
}

#[tokio::test]
async fn register_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/register"))
        .and(body_json(json!({ "email": "a@x.com", "password": "Aa1!2345" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user_id": USER_ID,
            "email": "a@x.com",
            "account_id": "abc123DEF4",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = BankClient::new(server.uri()).unwrap();
    let user = client.register("a@x.com", "Aa1!2345").await.unwrap();

    assert_eq!(user.user_id.to_string(), USER_ID);
    assert_eq!(user.account_id.unwrap().as_str(), "abc123DEF4");
}

#[tokio::test]
async fn login_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "header.claims.sig",
            "token_type": "bearer",
            "expires_in": 900,
        })))
        .mount(&server)
        .await;

    let client = BankClient::new(server.uri()).unwrap();
    let token = client.login("a@x.com", "Aa1!2345").await.unwrap();

    assert_eq!(token.access_token, "header.claims.sig");
    assert_eq!(token.expires_in, 900);
}

#[tokio::test]
async fn protected_calls_send_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "account_id": "abc123DEF4",
            "account_number": "12345678901234567890",
            "user_id": USER_ID,
            "balance": "60.50",
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = authed(&server).await.list_accounts().await.unwrap();

    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].balance, Decimal::new(6050, 2));
}

#[tokio::test]
async fn transfer_sends_amount_and_decodes_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transaction"))
        .and(body_json(json!({
            "account_from": "aaaaaaaaaa",
            "account_to": "bbbbbbbbbb",
            "amount": "40",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "transaction_id": "0b8e3b1c-8d0f-4a55-9a4e-7c2d1f3e5a60",
            "account_from": "aaaaaaaaaa",
            "account_to": "bbbbbbbbbb",
            "amount": "40",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = authed(&server)
        .await
        .transfer("aaaaaaaaaa", "bbbbbbbbbb", Decimal::from(40))
        .await
        .unwrap();

    assert_eq!(receipt.account_to.as_str(), "bbbbbbbbbb");
    assert_eq!(receipt.amount, Decimal::from(40));
}

#[tokio::test]
async fn history_decodes_timestamps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/account/42/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "transaction_id": "0b8e3b1c-8d0f-4a55-9a4e-7c2d1f3e5a60",
            "account_from": "aaaaaaaaaa",
            "account_to": "bbbbbbbbbb",
            "amount": "2.5",
            "created_at": "2026-01-01T12:00:00+00:00",
        }])))
        .mount(&server)
        .await;

    let history = authed(&server).await.list_transactions("42").await.unwrap();

    assert_eq!(history[0].amount, Decimal::new(25, 1));
    assert_eq!(history[0].created_at.timestamp(), 1_767_268_800);
}

#[tokio::test]
async fn delete_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/account/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    authed(&server).await.delete_account("42").await.unwrap();
}

#[tokio::test]
async fn error_codes_map_to_typed_errors() {
    let server = MockServer::start().await;
    let envelope = |code: &str| {
        json!({ "error": { "code": code, "message": format!("{code} happened") } })
    };
    Mock::given(method("GET"))
        .and(path("/v1/account/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(envelope("not_found")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/transaction"))
        .respond_with(ResponseTemplate::new(400).set_body_json(envelope("amount_too_small")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/user/u"))
        .respond_with(ResponseTemplate::new(409).set_body_json(envelope("conflict")))
        .mount(&server)
        .await;

    let client = authed(&server).await;

    let missing = client.get_account("1").await.unwrap_err();
    assert!(matches!(missing, ClientError::NotFound(_)));

    let poor = client
        .transfer("aaaaaaaaaa", "bbbbbbbbbb", Decimal::ONE)
        .await
        .unwrap_err();
    assert!(matches!(poor, ClientError::AmountTooSmall(_)));

    let restricted = client.delete_user("u").await.unwrap_err();
    match restricted {
        ClientError::Api { code, status, .. } => {
            assert_eq!(code, "conflict");
            assert_eq!(status, 409);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unauthorized_and_non_json_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": "unauthorized", "message": "invalid or expired token" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = BankClient::new(server.uri()).unwrap();

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(err.status(), Some(401));

    let err = client.health().await.unwrap_err();
    assert_eq!(err.status(), Some(502));
}
