//! Transfer handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use bank_core::{AccountId, TransferReceipt, ValidationError};
use bank_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::{amount_from_json, ApiJson};
use crate::state::AppState;

/// Transfer request.
///
/// A client-supplied `date` field is ignored. The store stamps every
/// transfer itself.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Account ID to debit.
    pub account_from: String,
    /// Account ID to credit.
    pub account_to: String,
    /// Amount, as a JSON number or numeric string.
    pub amount: Value,
}

fn account_id(raw: &str) -> Result<AccountId, ApiError> {
    raw.parse::<AccountId>()
        .map_err(|e| ApiError::from(ValidationError::from(e)))
}

/// Move money between two accounts.
pub async fn create_transaction<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransferReceipt>), ApiError> {
    let from = account_id(&body.account_from)?;
    let to = account_id(&body.account_to)?;
    let amount = amount_from_json(&body.amount)?;

    let receipt = state.ledger.create_transaction(&from, &to, amount).await?;

    tracing::debug!(
        transaction_id = %receipt.transaction_id,
        caller = %auth.subject,
        "Transfer request served"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}
