//! Error types for the bank ledger.
//!
//! Every engine operation reports failures as a [`LedgerError`]. The kinds are
//! deliberately coarse so the transport layer can map each one to a single
//! status code without inspecting messages.

use std::fmt;

use crate::ids::IdError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger and authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity ("user", "account").
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A uniqueness rule was violated.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Input failed a validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credentials did not match. Deliberately carries no detail.
    #[error("invalid email or password")]
    AuthenticationFailed,

    /// Token is malformed, expired, badly signed or has no subject.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The operation would orphan dependent records.
    #[error("restricted: {0}")]
    Restricted(String),

    /// The store did not answer within its time bound.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Unclassified persistence failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Shorthand for a missing user.
    pub fn user_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "user",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing account.
    pub fn account_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "account",
            id: id.to_string(),
        }
    }

    /// Returns `true` for insufficient-funds and non-positive amount errors.
    #[must_use]
    pub const fn is_amount_too_small(&self) -> bool {
        matches!(self, Self::Validation(ValidationError::AmountTooSmall(_)))
    }

    /// Returns `true` for type and same-account errors.
    #[must_use]
    pub const fn is_conversion_type(&self) -> bool {
        matches!(self, Self::Validation(ValidationError::ConversionType(_)))
    }
}

impl From<IdError> for LedgerError {
    fn from(err: IdError) -> Self {
        Self::Validation(ValidationError::InvalidId(err))
    }
}

/// Input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The email address is malformed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The password breaks one or more complexity rules.
    #[error("weak password: {}", join_rules(.0))]
    WeakPassword(Vec<PasswordRule>),

    /// An amount is too small: non-positive transfer, negative balance or
    /// insufficient funds.
    #[error("amount too small: {0}")]
    AmountTooSmall(String),

    /// A value has the wrong type or shape for the operation.
    #[error("conversion error: {0}")]
    ConversionType(String),

    /// An identifier could not be parsed.
    #[error(transparent)]
    InvalidId(#[from] IdError),
}

/// A single password complexity rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordRule {
    /// At least [`crate::validation::MIN_PASSWORD_LEN`] characters.
    MinLength,
    /// At least one lowercase letter.
    Lowercase,
    /// At least one uppercase letter.
    Uppercase,
    /// At least one digit.
    Digit,
    /// At least one punctuation or symbol character.
    Symbol,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MinLength => "must be at least 8 characters long",
            Self::Lowercase => "must contain a lowercase letter",
            Self::Uppercase => "must contain an uppercase letter",
            Self::Digit => "must contain a digit",
            Self::Symbol => "must contain a symbol",
        };
        f.write_str(text)
    }
}

fn join_rules(rules: &[PasswordRule]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
