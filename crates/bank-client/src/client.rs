//! Bank ledger HTTP client implementation.

use std::time::Duration;

use bank_core::Decimal;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClientError;
use crate::types::{
    AccountInfo, ApiErrorResponse, CreateAccountRequest, Credentials, HealthStatus,
    TokenResponse, TransactionInfo, TransferReceipt, TransferRequest, UpdateAccountRequest,
    UpdateUserRequest, UserInfo, UserSummary,
};

/// Bank ledger API client.
///
/// Cheap to clone. Calls on protected routes need a token set through
/// [`BankClient::with_token`].
#[derive(Debug, Clone)]
pub struct BankClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BankClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://bank-ledger:8080"`)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Return a copy of this client that sends `token` as a bearer credential.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store is unavailable.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.client.get(format!("{}/health", self.base_url)).send().await?;
        handle_response(response).await
    }

    /// Register a user. The service also opens their first account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the
    /// email or password.
    pub async fn register(&self, email: &str, password: &str) -> Result<UserSummary, ClientError> {
        let body = Credentials { email, password };
        let response = self
            .request(Method::POST, "/v1/register")
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the credentials do not match.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ClientError> {
        let body = Credentials { email, password };
        let response = self
            .request(Method::POST, "/v1/login")
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ClientError> {
        self.get("/v1/users").await
    }

    /// Change a user's email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn update_user(&self, user_id: &str, new_email: &str) -> Result<UserInfo, ClientError> {
        self.send_json(Method::PUT, "/v1/user", &UpdateUserRequest { user_id, new_email })
            .await
    }

    /// Delete a user who no longer owns any accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/v1/user/{user_id}")).await
    }

    /// Open a zero-balance account for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn create_account(&self, user_id: &str) -> Result<AccountInfo, ClientError> {
        self.send_json(Method::POST, "/v1/account", &CreateAccountRequest { user_id })
            .await
    }

    /// List all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_accounts(&self) -> Result<Vec<AccountInfo>, ClientError> {
        self.get("/v1/accounts").await
    }

    /// Get an account by number.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if no account has that number.
    pub async fn get_account(&self, number: &str) -> Result<AccountInfo, ClientError> {
        self.get(&format!("/v1/account/{number}")).await
    }

    /// List an account's transfers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if no account has that number.
    pub async fn list_transactions(&self, number: &str) -> Result<Vec<TransactionInfo>, ClientError> {
        self.get(&format!("/v1/account/{number}/transactions"))
            .await
    }

    /// Overwrite an account's balance.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AmountTooSmall` for a negative amount.
    pub async fn update_account(
        &self,
        number: &str,
        new_amount: Decimal,
    ) -> Result<AccountInfo, ClientError> {
        self.send_json(
            Method::PUT,
            "/v1/account",
            &UpdateAccountRequest { number, new_amount },
        )
        .await
    }

    /// Delete an account together with its transfer history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn delete_account(&self, number: &str) -> Result<(), ClientError> {
        self.delete(&format!("/v1/account/{number}")).await
    }

    /// Move `amount` from one account to another.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AmountTooSmall` if the source cannot cover the
    /// amount, and `ClientError::NotFound` if either account is missing.
    pub async fn transfer(
        &self,
        account_from: &str,
        account_to: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt, ClientError> {
        let body = TransferRequest {
            account_from,
            account_to,
            amount,
        };
        self.send_json(Method::POST, "/v1/transaction", &body).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path).send().await?;
        handle_response(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path).json(body).send().await?;
        handle_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.request(Method::DELETE, path).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(into_error(response).await)
    }
}

/// Decode a success body or convert the error envelope.
async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if response.status().is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }
    Err(into_error(response).await)
}

async fn into_error(response: Response) -> ClientError {
    let status = response.status();

    // Try to parse error response
    let error_body: Result<ApiErrorResponse, _> = response.json().await;

    match error_body {
        Ok(api_error) => {
            let code = api_error.error.code;
            let message = api_error.error.message;
            tracing::debug!(status = status.as_u16(), code = %code, "request rejected");

            match code.as_str() {
                "unauthorized" => ClientError::Unauthorized(message),
                "not_found" => ClientError::NotFound(message),
                "amount_too_small" => ClientError::AmountTooSmall(message),
                _ => ClientError::Api {
                    code,
                    message,
                    status: status.as_u16(),
                },
            }
        }
        Err(_) => ClientError::Api {
            code: "unknown".to_string(),
            message: format!("HTTP {status}"),
            status: status.as_u16(),
        },
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}
