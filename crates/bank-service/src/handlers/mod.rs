//! HTTP request handlers.

pub mod accounts;
pub mod health;
pub mod session;
pub mod transactions;
pub mod users;

use axum::extract::FromRequest;
use serde_json::Value;

use bank_core::validation::parse_amount;
use bank_core::{AccountNumber, Decimal, ValidationError};

use crate::error::ApiError;

/// `Json` extractor whose rejections use the service's error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Read a monetary amount sent either as a JSON number or as a string.
///
/// # Errors
///
/// Returns `ValidationError::ConversionType` for anything that is not a
/// number.
pub fn amount_from_json(value: &Value) -> Result<Decimal, ValidationError> {
    match value {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(s),
        other => Err(ValidationError::ConversionType(format!(
            "amount must be a number, got {other}"
        ))),
    }
}

/// Parse an account number taken from a path or body.
pub(crate) fn account_number(raw: &str) -> Result<AccountNumber, ApiError> {
    raw.parse::<AccountNumber>()
        .map_err(|e| ApiError::from(ValidationError::from(e)))
}
