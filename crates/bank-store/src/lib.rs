//! Storage layer for the bank ledger.
//!
//! This crate provides persistent storage for users, accounts and transfer
//! records behind two traits:
//!
//! - [`Store`]: a long-lived client, constructed once at startup and shared.
//! - [`UnitOfWork`]: one atomic, all-or-nothing sequence of reads and writes.
//!
//! Two backends implement them:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, row locks with `SELECT ... FOR UPDATE`
//! - [`MemoryStore`]: an in-process store enforcing the same constraints,
//!   used by tests and local development
//!
//! # Unit-of-work discipline
//!
//! A unit of work must end in [`UnitOfWork::commit`] or
//! [`UnitOfWork::rollback`]. Dropping it without committing discards every
//! write made through it and releases the underlying connection or lock.
//!
//! # Example
//!
//! ```no_run
//! use bank_core::{AccountNumber, NewAccount, NewUser};
//! use bank_store::{MemoryStore, Store, UnitOfWork};
//!
//! # async fn example() -> bank_store::Result<()> {
//! let store = MemoryStore::new();
//!
//! let mut unit = store.begin().await?;
//! let user = unit.insert_user(&NewUser::new("a@x.com", "$argon2id$...")).await?;
//! unit.insert_account(&NewAccount::new(user.user_id, AccountNumber::generate()))
//!     .await?;
//! unit.commit().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::{PgStore, PgStoreOptions};

use async_trait::async_trait;
use rust_decimal::Decimal;

use bank_core::{
    Account, AccountId, AccountNumber, NewAccount, NewTransaction, NewUser, Transaction, User,
    UserId, UserSummary,
};

/// A storage backend that hands out units of work.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// The unit-of-work type this backend produces.
    type Unit: UnitOfWork;

    /// Start a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Timeout` if no connection or lock could be
    /// acquired within the configured bound.
    async fn begin(&self) -> Result<Self::Unit>;

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not answer.
    async fn ping(&self) -> Result<()>;
}

/// One atomic sequence of reads and writes.
///
/// Writes are only visible to other units of work after [`commit`](Self::commit).
#[async_trait]
pub trait UnitOfWork: Send {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UniqueViolation` if the email is taken.
    async fn insert_user(&mut self, user: &NewUser) -> Result<User>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn find_user(&mut self, user_id: &UserId) -> Result<Option<User>>;

    /// Get a user by exact email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>>;

    /// List users in registration order, each with their first account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_users(&mut self) -> Result<Vec<UserSummary>>;

    /// Change a user's email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UniqueViolation` if another user owns the email.
    async fn update_user_email(&mut self, user_id: &UserId, email: &str) -> Result<()>;

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ForeignKeyViolation` if the user still owns accounts.
    async fn delete_user(&mut self, user_id: &UserId) -> Result<()>;

    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert a zero-balance account.
    ///
    /// # Errors
    ///
    /// - `StoreError::UniqueViolation` on an account id or number clash.
    /// - `StoreError::ForeignKeyViolation` if the owner does not exist.
    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account>;

    /// Get an account by its public number without locking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn find_account_by_number(&mut self, number: &AccountNumber)
        -> Result<Option<Account>>;

    /// Get an account by its public number and lock it until the unit of
    /// work ends.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Timeout` if the lock is not granted in time.
    async fn lock_account_by_number(&mut self, number: &AccountNumber)
        -> Result<Option<Account>>;

    /// Lock the given accounts until the unit of work ends.
    ///
    /// Locks are taken in ascending `account_id` order. Accounts that do not
    /// exist are absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Timeout` if a lock is not granted in time.
    async fn lock_accounts(&mut self, account_ids: &[AccountId]) -> Result<Vec<Account>>;

    /// Check whether an account number is already assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn account_number_exists(&mut self, number: &AccountNumber) -> Result<bool>;

    /// List all accounts in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_accounts(&mut self) -> Result<Vec<Account>>;

    /// Count the accounts a user owns.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn count_accounts_for_user(&mut self, user_id: &UserId) -> Result<u64>;

    /// Overwrite an account's balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CheckViolation` for a negative balance.
    async fn set_balance(&mut self, account_id: &AccountId, balance: Decimal) -> Result<()>;

    /// Delete an account. Its transfer records are removed with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn delete_account(&mut self, account_id: &AccountId) -> Result<()>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Append a transfer record. The store assigns `created_at`.
    ///
    /// # Errors
    ///
    /// - `StoreError::CheckViolation` if the amount is not positive.
    /// - `StoreError::ForeignKeyViolation` if either account does not exist.
    async fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction>;

    /// List transfers touching an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_transactions(&mut self, account_id: &AccountId) -> Result<Vec<Transaction>>;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Make every write of this unit of work durable and visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing is persisted then.
    async fn commit(self) -> Result<()>;

    /// Discard every write of this unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to roll back cleanly.
    async fn rollback(self) -> Result<()>;
}
