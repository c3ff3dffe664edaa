//! Common test utilities for bank-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use bank_ledger::{Algorithm, Authenticator, Ledger, Params, PasswordHasher, TokenConfig};
use bank_service::{create_router, AppState, ServiceConfig};
use bank_store::MemoryStore;

/// Password that satisfies every complexity rule.
pub const PASSWORD: &str = "Aa1!2345";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server, for fault injection.
    pub store: Arc<MemoryStore>,
}

/// A registered and logged-in user.
pub struct Session {
    /// User ID as returned by registration.
    pub user_id: String,
    /// Email the user registered with.
    pub email: String,
    /// Default account ID.
    pub account_id: String,
    /// `Authorization` header value.
    pub auth_header: String,
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        jwt_secret: "integration-test-secret".into(),
        jwt_algorithm: Algorithm::HS256,
        token_ttl_minutes: 15,
        db_max_connections: 1,
        db_acquire_timeout_seconds: 1,
        db_lock_timeout_ms: 1000,
        cors_origins: vec!["*".into()],
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 30,
    }
}

impl TestHarness {
    /// Create a new test harness with an empty in-memory store.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();

        let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");
        let ledger = Ledger::with_hasher(Arc::clone(&store), PasswordHasher::new(params));
        let token_config = TokenConfig::new(
            &config.jwt_secret,
            config.jwt_algorithm,
            Duration::from_secs(config.token_ttl_minutes * 60),
        )
        .expect("valid token config");
        let auth = Authenticator::new(Arc::clone(&store), token_config);

        let state = AppState::from_parts(ledger, auth, config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }

    /// Register `email` and log in.
    pub async fn session(&self, email: &str) -> Session {
        let registered = self
            .server
            .post("/v1/register")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        registered.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = registered.json();

        let login = self
            .server
            .post("/v1/login")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        login.assert_status_ok();
        let token: Value = login.json();

        Session {
            user_id: body["user_id"].as_str().expect("user_id").to_string(),
            email: email.to_string(),
            account_id: body["account_id"].as_str().expect("account_id").to_string(),
            auth_header: format!(
                "Bearer {}",
                token["access_token"].as_str().expect("access_token")
            ),
        }
    }

    /// Open a second account for `session` and return its JSON record.
    pub async fn open_account(&self, session: &Session) -> Value {
        let response = self
            .server
            .post("/v1/account")
            .add_header("authorization", session.auth_header.clone())
            .json(&json!({ "user_id": session.user_id }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Set an account's balance through the override endpoint.
    pub async fn fund(&self, session: &Session, number: &str, amount: Value) {
        self.server
            .put("/v1/account")
            .add_header("authorization", session.auth_header.clone())
            .json(&json!({ "number": number, "new_amount": amount }))
            .await
            .assert_status_ok();
    }

    /// Fetch an account by number.
    pub async fn account(&self, session: &Session, number: &str) -> Value {
        let response = self
            .server
            .get(&format!("/v1/account/{number}"))
            .add_header("authorization", session.auth_header.clone())
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// Look up the number of an account by its ID.
    pub async fn number_of(&self, session: &Session, account_id: &str) -> String {
        let accounts: Vec<Value> = self
            .server
            .get("/v1/accounts")
            .add_header("authorization", session.auth_header.clone())
            .await
            .json();
        accounts
            .iter()
            .find(|a| a["account_id"] == account_id)
            .and_then(|a| a["account_number"].as_str())
            .expect("account listed")
            .to_string()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
