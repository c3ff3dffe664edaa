//! User management handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use bank_core::{User, UserId, UserSummary, ValidationError};
use bank_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::state::AppState;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email to register.
    pub email: String,
    /// Plaintext password, checked against the complexity rules.
    pub password: String,
}

/// Email change request.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// User to change.
    pub user_id: String,
    /// Replacement email.
    pub new_email: String,
}

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub user_id: String,
    /// Email.
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            email: user.email.clone(),
        }
    }
}

fn user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse::<UserId>()
        .map_err(|e| ApiError::from(ValidationError::from(e)))
}

/// Register a user with one default account.
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let summary = state.ledger.create_user(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// List all users.
pub async fn list_users<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _auth: AuthUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.ledger.list_users().await?))
}

/// Change a user's email.
pub async fn update_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = user_id(&body.user_id)?;
    let user = state.ledger.update_user(&id, &body.new_email).await?;

    tracing::info!(user_id = %id, caller = %auth.subject, "User email changed");
    Ok(Json(UserResponse::from(&user)))
}

/// Delete a user who owns no accounts.
pub async fn delete_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = user_id(&raw_id)?;
    state.ledger.delete_user(&id).await?;

    tracing::info!(user_id = %id, caller = %auth.subject, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
