//! Request and response types for the bank client.

use bank_core::Decimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use bank_core::{TransferReceipt, UserSummary};

/// Credentials for registration and login.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Email change request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateUserRequest<'a> {
    pub user_id: &'a str,
    pub new_email: &'a str,
}

/// Account opening request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateAccountRequest<'a> {
    pub user_id: &'a str,
}

/// Balance override request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateAccountRequest<'a> {
    pub number: &'a str,
    pub new_amount: Decimal,
}

/// Transfer request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransferRequest<'a> {
    pub account_from: &'a str,
    pub account_to: &'a str,
    pub amount: Decimal,
}

/// Bearer token issued by login.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The signed token.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    /// Seconds until expiry.
    pub expires_in: u64,
}

/// A user after an email change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    /// User ID.
    pub user_id: String,
    /// Current email.
    pub email: String,
}

/// An account as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    /// Internal account ID, used as a transfer endpoint.
    pub account_id: String,
    /// Public account number, used to address the account.
    pub account_number: String,
    /// Owning user ID.
    pub user_id: String,
    /// Current balance.
    pub balance: Decimal,
}

/// A committed transfer in an account's history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionInfo {
    /// Transaction ID.
    pub transaction_id: String,
    /// Debited account ID.
    pub account_from: String,
    /// Credited account ID.
    pub account_to: String,
    /// Amount moved.
    pub amount: Decimal,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    /// `"ok"` when the store answered.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// Error envelope returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
}
