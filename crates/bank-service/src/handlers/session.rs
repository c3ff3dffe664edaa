//! Login handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use bank_ledger::AccessToken;
use bank_store::Store;

use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::state::AppState;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Registered email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Exchange credentials for a bearer token.
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let token = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(token))
}
