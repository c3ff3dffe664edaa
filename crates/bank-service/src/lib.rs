//! HTTP API service for the bank ledger.
//!
//! This crate exposes the ledger and authentication engines over HTTP:
//!
//! - User registration, login and management
//! - Account management and balance overrides
//! - Transfers between accounts
//!
//! # Authentication
//!
//! `POST /v1/login` returns a signed bearer token. Every other route except
//! registration and the health check requires it in the `Authorization`
//! header.
//!
//! # Errors
//!
//! Failures are returned as `{ "error": { "code": ..., "message": ... } }`
//! with a status derived from the ledger error kind.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
