//! Core types and rules for the bank ledger.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - **Identifiers**: `UserId`, `AccountId`, `AccountNumber`, `TransactionId`
//! - **Records**: `User`, `Account`, `Transaction`
//! - **Errors**: `LedgerError`, the taxonomy every engine reports in
//! - **Validation**: pure predicates applied before anything reaches storage
//!
//! # Money
//!
//! Balances and amounts are `rust_decimal::Decimal`. Binary floating point is
//! never used for money, so a debit and its matching credit always have the
//! exact same magnitude.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod records;
pub mod validation;

pub use error::{LedgerError, PasswordRule, Result, ValidationError};
pub use ids::{AccountId, AccountNumber, IdError, TransactionId, UserId};
pub use records::{
    Account, NewAccount, NewTransaction, NewUser, Transaction, TransferReceipt, User, UserSummary,
};

pub use rust_decimal::Decimal;
