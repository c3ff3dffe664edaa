//! Identifier types for the bank ledger.
//!
//! This module provides strongly-typed identifiers for users, accounts and
//! transactions.
//!
//! # Accounts have two identifiers
//!
//! - [`AccountId`] is a short random string used as the storage join key.
//! - [`AccountNumber`] is a large random number used as the public handle.
//!
//! The two live in different value spaces and are generated independently.

use std::fmt;
use std::str::FromStr;

use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Length of a generated [`AccountId`].
pub const ACCOUNT_ID_LEN: usize = 10;

/// Longest [`AccountId`] the schema accepts.
pub const ACCOUNT_ID_MAX_LEN: usize = 12;

/// Maximum number of decimal digits in an [`AccountNumber`].
pub const ACCOUNT_NUMBER_DIGITS: usize = 26;

/// Exclusive upper bound of the account-number space (`10^26`).
pub const ACCOUNT_NUMBER_SPACE: u128 = 100_000_000_000_000_000_000_000_000;

/// Macro to define a UUID-based identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `uuid::Uuid` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `Serialize`, `Deserialize` (as string)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
macro_rules! uuid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create a new identifier from a UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Return the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
                Ok(Self(uuid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

uuid_id_type!(UserId, "A user identifier (UUID v4).");
uuid_id_type!(TransactionId, "A transfer record identifier (UUID v4).");

/// Internal account identifier.
///
/// A short random alphanumeric string. It is the primary key of an account
/// and the target of every foreign key that references one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Generate a new random account identifier.
    #[must_use]
    pub fn generate() -> Self {
        let id = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ACCOUNT_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
        if s.is_empty() || s.len() > ACCOUNT_ID_MAX_LEN || !s.chars().all(valid_char) {
            return Err(IdError::InvalidAccountId);
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccountId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

/// Public account number.
///
/// A random value below `10^26`, rendered as a plain decimal string. It is
/// the handle clients use to address an account and is unrelated to the
/// account's [`AccountId`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(u128);

impl AccountNumber {
    /// Generate a random account number from 122 bits of UUID v4 entropy.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().as_u128() % ACCOUNT_NUMBER_SPACE)
    }

    /// Build an account number from a raw value.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidAccountNumber` if the value is outside the
    /// account-number space.
    pub fn new(value: u128) -> Result<Self, IdError> {
        if value >= ACCOUNT_NUMBER_SPACE {
            return Err(IdError::InvalidAccountNumber);
        }
        Ok(Self(value))
    }

    /// Return the raw value.
    #[must_use]
    pub const fn value(&self) -> u128 {
        self.0
    }

    /// Convert to a scale-zero decimal, the form the store persists.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        // values below 10^26 always fit in the 96-bit mantissa
        i128::try_from(self.0)
            .ok()
            .and_then(|raw| Decimal::try_from_i128_with_scale(raw, 0).ok())
            .unwrap_or(Decimal::MAX)
    }

    /// Convert back from the stored decimal form.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidAccountNumber` for fractional, negative or
    /// out-of-range values.
    pub fn from_decimal(value: Decimal) -> Result<Self, IdError> {
        let normalized = value.normalize();
        if normalized.scale() != 0 {
            return Err(IdError::InvalidAccountNumber);
        }
        let raw =
            u128::try_from(normalized.mantissa()).map_err(|_| IdError::InvalidAccountNumber)?;
        Self::new(raw)
    }
}

impl FromStr for AccountNumber {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > ACCOUNT_NUMBER_DIGITS || !s.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(IdError::InvalidAccountNumber);
        }
        let value = s.parse::<u128>().map_err(|_| IdError::InvalidAccountNumber)?;
        Self::new(value)
    }
}

impl fmt::Debug for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountNumber({})", self.0)
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountNumber> for String {
    fn from(number: AccountNumber) -> Self {
        number.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The input is not a valid account identifier.
    #[error("invalid account id: expected 1-12 characters from [A-Za-z0-9_-]")]
    InvalidAccountId,

    /// The input is not a valid account number.
    #[error("invalid account number: expected up to 26 decimal digits")]
    InvalidAccountNumber,
}
