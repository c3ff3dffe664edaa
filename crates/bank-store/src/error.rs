//! Error types for the storage layer.

use bank_core::{LedgerError, ValidationError};

use crate::schema::constraint;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique or primary-key constraint rejected the write.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint.
        constraint: String,
    },

    /// A foreign-key constraint rejected the write or delete.
    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation {
        /// Name of the violated constraint.
        constraint: String,
    },

    /// A check constraint rejected the write.
    #[error("check constraint violated: {constraint}")]
    CheckViolation {
        /// Name of the violated constraint.
        constraint: String,
    },

    /// A connection, lock or statement did not complete in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A stored row could not be decoded into a record.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),
}

/// PostgreSQL SQLSTATE codes the store classifies.
mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const LOCK_NOT_AVAILABLE: &str = "55P03";
    pub const QUERY_CANCELED: &str = "57014";
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                let constraint = db.constraint().unwrap_or("unknown").to_string();
                match db.code().as_deref() {
                    Some(sqlstate::UNIQUE_VIOLATION) => Self::UniqueViolation { constraint },
                    Some(sqlstate::FOREIGN_KEY_VIOLATION) => {
                        Self::ForeignKeyViolation { constraint }
                    }
                    Some(sqlstate::CHECK_VIOLATION) => Self::CheckViolation { constraint },
                    Some(sqlstate::LOCK_NOT_AVAILABLE | sqlstate::QUERY_CANCELED) => {
                        Self::Timeout(db.message().to_string())
                    }
                    _ => Self::Database(err.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => Self::Timeout("connection pool exhausted".into()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                Self::Corrupt(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint: name } => Self::Duplicate(
                match name.as_str() {
                    constraint::USERS_EMAIL_KEY => "email already registered",
                    constraint::ACCOUNTS_NUMBER_KEY => "account number already in use",
                    constraint::ACCOUNTS_PKEY => "account id already in use",
                    _ => "record already exists",
                }
                .to_string(),
            ),
            StoreError::ForeignKeyViolation { constraint: name } => Self::Restricted(
                match name.as_str() {
                    constraint::ACCOUNTS_USER_FKEY => "user is referenced by accounts",
                    constraint::TRANSACTIONS_FROM_FKEY | constraint::TRANSACTIONS_TO_FKEY => {
                        "account is referenced by transactions"
                    }
                    _ => "record is referenced elsewhere",
                }
                .to_string(),
            ),
            StoreError::CheckViolation { constraint: name } => {
                Self::Validation(ValidationError::AmountTooSmall(format!(
                    "rejected by storage constraint {name}"
                )))
            }
            StoreError::Timeout(msg) => Self::Unavailable(msg),
            StoreError::Corrupt(msg) | StoreError::Database(msg) => Self::Storage(msg),
        }
    }
}
