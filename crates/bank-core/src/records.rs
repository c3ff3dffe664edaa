//! Ledger records.
//!
//! `New*` types describe rows about to be inserted; the store fills in the
//! server-assigned parts (default balance, timestamps) and hands back the
//! full record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, AccountNumber, TransactionId, UserId};

/// A registered user.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// The user ID.
    pub user_id: UserId,
    /// Email address, unique across users, compared case-sensitively.
    pub email: String,
    /// PHC-formatted password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A user row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user ID.
    pub user_id: UserId,
    /// Email address.
    pub email: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
}

impl NewUser {
    /// Create a new user row with a freshly generated ID.
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            user_id: UserId::generate(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

/// A user as listed: identity plus the ID of their first account, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// The user ID.
    pub user_id: UserId,
    /// Email address.
    pub email: String,
    /// The user's first account, if they still own one.
    pub account_id: Option<AccountId>,
}

/// A balance holder owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Internal identifier, the foreign-key target.
    pub account_id: AccountId,
    /// Public handle.
    pub account_number: AccountNumber,
    /// Owning user.
    pub user_id: UserId,
    /// Current balance, never negative.
    pub balance: Decimal,
}

impl Account {
    /// Check if the account can fund a debit of `amount`.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

/// An account row about to be inserted. Accounts always start at zero.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Internal identifier.
    pub account_id: AccountId,
    /// Public handle.
    pub account_number: AccountNumber,
    /// Owning user.
    pub user_id: UserId,
}

impl NewAccount {
    /// Create a new account row for `user_id` with the given public number.
    #[must_use]
    pub fn new(user_id: UserId, account_number: AccountNumber) -> Self {
        Self {
            account_id: AccountId::generate(),
            account_number,
            user_id,
        }
    }
}

/// An immutable record of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction ID.
    pub transaction_id: TransactionId,
    /// Debited account.
    pub account_id_from: AccountId,
    /// Credited account.
    pub account_id_to: AccountId,
    /// Transferred amount, always positive.
    pub amount: Decimal,
    /// When the store recorded the transfer.
    pub created_at: DateTime<Utc>,
}

/// A transfer row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The transaction ID.
    pub transaction_id: TransactionId,
    /// Debited account.
    pub account_id_from: AccountId,
    /// Credited account.
    pub account_id_to: AccountId,
    /// Transferred amount.
    pub amount: Decimal,
}

impl NewTransaction {
    /// Create a new transfer row with a freshly generated ID.
    #[must_use]
    pub fn new(from: AccountId, to: AccountId, amount: Decimal) -> Self {
        Self {
            transaction_id: TransactionId::generate(),
            account_id_from: from,
            account_id_to: to,
            amount,
        }
    }
}

/// The economic facts of a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// The transaction ID.
    pub transaction_id: TransactionId,
    /// Debited account.
    pub account_from: AccountId,
    /// Credited account.
    pub account_to: AccountId,
    /// Transferred amount.
    pub amount: Decimal,
}

impl From<&Transaction> for TransferReceipt {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.transaction_id,
            account_from: tx.account_id_from.clone(),
            account_to: tx.account_id_to.clone(),
            amount: tx.amount,
        }
    }
}
