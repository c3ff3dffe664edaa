//! Account management handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bank_core::{Account, Transaction, UserId, ValidationError};
use bank_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::{account_number, amount_from_json, ApiJson};
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Internal account ID.
    pub account_id: String,
    /// Public account number.
    pub account_number: String,
    /// Owning user ID.
    pub user_id: String,
    /// Balance as a decimal string.
    pub balance: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id.to_string(),
            account_number: account.account_number.to_string(),
            user_id: account.user_id.to_string(),
            balance: account.balance.to_string(),
        }
    }
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub transaction_id: String,
    /// Debited account ID.
    pub account_from: String,
    /// Credited account ID.
    pub account_to: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&Transaction> for TransactionResponse {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.transaction_id.to_string(),
            account_from: tx.account_id_from.to_string(),
            account_to: tx.account_id_to.to_string(),
            amount: tx.amount.to_string(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Create account request.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Owner of the new account.
    pub user_id: String,
}

/// Balance override request.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// Public account number.
    pub number: String,
    /// New balance, as a JSON number or numeric string.
    pub new_amount: Value,
}

/// Open a zero-balance account for an existing user.
pub async fn create_account<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _auth: AuthUser,
    ApiJson(body): ApiJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let user_id = body
        .user_id
        .parse::<UserId>()
        .map_err(|e| ApiError::from(ValidationError::from(e)))?;
    let account = state.ledger.create_account(&user_id).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// List all accounts.
pub async fn list_accounts<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _auth: AuthUser,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = state.ledger.list_accounts().await?;
    Ok(Json(accounts.iter().map(AccountResponse::from).collect()))
}

/// Get one account by number.
pub async fn get_account<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _auth: AuthUser,
    Path(number): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.ledger.get_account(&account_number(&number)?).await?;
    Ok(Json(AccountResponse::from(&account)))
}

/// List an account's transfers, newest first.
pub async fn list_transactions<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _auth: AuthUser,
    Path(number): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let history = state
        .ledger
        .list_transactions(&account_number(&number)?)
        .await?;
    Ok(Json(history.iter().map(TransactionResponse::from).collect()))
}

/// Overwrite an account's balance.
pub async fn update_account<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let number = account_number(&body.number)?;
    let new_amount = amount_from_json(&body.new_amount)?;
    let account = state.ledger.update_account(&number, new_amount).await?;

    tracing::info!(
        account_number = %number,
        caller = %auth.subject,
        "Balance override applied"
    );
    Ok(Json(AccountResponse::from(&account)))
}

/// Delete an account and its transfer history.
pub async fn delete_account<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _auth: AuthUser,
    Path(number): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.ledger.delete_account(&account_number(&number)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
