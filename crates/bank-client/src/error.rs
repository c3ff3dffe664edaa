//! Client error types.

/// Errors that can occur when using the bank client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The bearer token is missing, expired or was refused.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The addressed user or account does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The source account cannot cover the transfer, or the amount is not
    /// positive.
    #[error("amount too small: {0}")]
    AmountTooSmall(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status of a server-side rejection, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::AmountTooSmall(_) => Some(400),
            Self::Http(_) | Self::Serialization(_) | Self::Configuration(_) => None,
        }
    }
}
