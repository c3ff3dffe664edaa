//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use bank_store::Store;

use crate::handlers::{accounts, health, session, transactions, users};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check (pings the store)
/// - `POST /v1/register` - Register a user with a default account
/// - `POST /v1/login` - Exchange credentials for a bearer token
///
/// ## Users (bearer auth)
/// - `GET /v1/users` - List users
/// - `PUT /v1/user` - Change a user's email
/// - `DELETE /v1/user/:user_id` - Delete a user without accounts
///
/// ## Accounts (bearer auth)
/// - `POST /v1/account` - Open an account
/// - `GET /v1/accounts` - List accounts
/// - `PUT /v1/account` - Overwrite a balance
/// - `GET /v1/account/:number` - Get an account
/// - `DELETE /v1/account/:number` - Delete an account
/// - `GET /v1/account/:number/transactions` - Transfer history
///
/// ## Transfers (bearer auth)
/// - `POST /v1/transaction` - Move money between accounts
pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Session
        .route("/register", post(users::register::<S>))
        .route("/login", post(session::login::<S>))
        // Users
        .route("/users", get(users::list_users::<S>))
        .route("/user", put(users::update_user::<S>))
        .route("/user/:user_id", delete(users::delete_user::<S>))
        // Accounts
        .route(
            "/account",
            post(accounts::create_account::<S>).put(accounts::update_account::<S>),
        )
        .route("/accounts", get(accounts::list_accounts::<S>))
        .route(
            "/account/:number",
            get(accounts::get_account::<S>).delete(accounts::delete_account::<S>),
        )
        .route(
            "/account/:number/transactions",
            get(accounts::list_transactions::<S>),
        )
        // Transfers
        .route("/transaction", post(transactions::create_transaction::<S>));

    Router::new()
        .route("/health", get(health::health::<S>))
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
