//! In-memory storage implementation.
//!
//! This module provides the `MemoryStore` implementation of the `Store` trait.
//! A unit of work holds the store's single async mutex for its whole lifetime
//! and writes to a private copy of the tables; commit swaps the copy in.
//! Units of work are therefore fully serialized, which trivially satisfies the
//! row-locking contract of [`UnitOfWork::lock_accounts`].
//!
//! The same constraints the SQL schema declares are enforced here: unique
//! email and account number, foreign keys, `ON DELETE RESTRICT` for users,
//! `ON DELETE CASCADE` for transfer records and the amount/balance checks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bank_core::{
    Account, AccountId, AccountNumber, NewAccount, NewTransaction, NewUser, Transaction, User,
    UserId, UserSummary,
};

use crate::error::{Result, StoreError};
use crate::schema::constraint;
use crate::{Store, UnitOfWork};

/// Default bound on waiting for the store lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// The full contents of the store, in insertion order.
#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
}

/// In-memory storage backend.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    lock_timeout: Duration,
    fail_next_transaction_insert: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create an empty store that gives up waiting for a unit of work after
    /// `lock_timeout`.
    #[must_use]
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            lock_timeout,
            fail_next_transaction_insert: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make the next [`UnitOfWork::insert_transaction`] fail with a database
    /// error. Used to exercise rollback paths.
    pub fn fail_next_transaction_insert(&self) {
        self.fail_next_transaction_insert
            .store(true, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<MemoryUnit> {
        let guard = tokio::time::timeout(self.lock_timeout, Arc::clone(&self.tables).lock_owned())
            .await
            .map_err(|_| StoreError::Timeout("memory store is busy".into()))?;
        let working = Tables::clone(&guard);

        Ok(MemoryUnit {
            guard,
            working,
            fail_next_transaction_insert: Arc::clone(&self.fail_next_transaction_insert),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A unit of work over a [`MemoryStore`].
pub struct MemoryUnit {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fail_next_transaction_insert: Arc<AtomicBool>,
}

impl MemoryUnit {
    fn account_mut(&mut self, account_id: &AccountId) -> Option<&mut Account> {
        self.working
            .accounts
            .iter_mut()
            .find(|a| &a.account_id == account_id)
    }

    fn has_account(&self, account_id: &AccountId) -> bool {
        self.working
            .accounts
            .iter()
            .any(|a| &a.account_id == account_id)
    }
}

fn unique(name: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: name.to_string(),
    }
}

fn foreign_key(name: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: name.to_string(),
    }
}

fn check(name: &str) -> StoreError {
    StoreError::CheckViolation {
        constraint: name.to_string(),
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    // =========================================================================
    // User Operations
    // =========================================================================

    async fn insert_user(&mut self, user: &NewUser) -> Result<User> {
        if self.working.users.iter().any(|u| u.email == user.email) {
            return Err(unique(constraint::USERS_EMAIL_KEY));
        }
        if self.working.users.iter().any(|u| u.user_id == user.user_id) {
            return Err(unique("users_pkey"));
        }

        let record = User {
            user_id: user.user_id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        };
        self.working.users.push(record.clone());
        Ok(record)
    }

    async fn find_user(&mut self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self
            .working
            .users
            .iter()
            .find(|u| &u.user_id == user_id)
            .cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        Ok(self.working.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&mut self) -> Result<Vec<UserSummary>> {
        let tables = &self.working;
        Ok(tables
            .users
            .iter()
            .map(|u| UserSummary {
                user_id: u.user_id,
                email: u.email.clone(),
                account_id: tables
                    .accounts
                    .iter()
                    .find(|a| a.user_id == u.user_id)
                    .map(|a| a.account_id.clone()),
            })
            .collect())
    }

    async fn update_user_email(&mut self, user_id: &UserId, email: &str) -> Result<()> {
        if self
            .working
            .users
            .iter()
            .any(|u| u.email == email && &u.user_id != user_id)
        {
            return Err(unique(constraint::USERS_EMAIL_KEY));
        }
        if let Some(user) = self.working.users.iter_mut().find(|u| &u.user_id == user_id) {
            user.email = email.to_string();
        }
        Ok(())
    }

    async fn delete_user(&mut self, user_id: &UserId) -> Result<()> {
        if self.working.accounts.iter().any(|a| &a.user_id == user_id) {
            return Err(foreign_key(constraint::ACCOUNTS_USER_FKEY));
        }
        self.working.users.retain(|u| &u.user_id != user_id);
        Ok(())
    }

    // =========================================================================
    // Account Operations
    // =========================================================================

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account> {
        if self.has_account(&account.account_id) {
            return Err(unique(constraint::ACCOUNTS_PKEY));
        }
        if self
            .working
            .accounts
            .iter()
            .any(|a| a.account_number == account.account_number)
        {
            return Err(unique(constraint::ACCOUNTS_NUMBER_KEY));
        }
        if !self
            .working
            .users
            .iter()
            .any(|u| u.user_id == account.user_id)
        {
            return Err(foreign_key(constraint::ACCOUNTS_USER_FKEY));
        }

        let record = Account {
            account_id: account.account_id.clone(),
            account_number: account.account_number,
            user_id: account.user_id,
            balance: Decimal::ZERO,
        };
        self.working.accounts.push(record.clone());
        Ok(record)
    }

    async fn find_account_by_number(
        &mut self,
        number: &AccountNumber,
    ) -> Result<Option<Account>> {
        Ok(self
            .working
            .accounts
            .iter()
            .find(|a| &a.account_number == number)
            .cloned())
    }

    async fn lock_account_by_number(
        &mut self,
        number: &AccountNumber,
    ) -> Result<Option<Account>> {
        // the unit of work already holds the store lock
        self.find_account_by_number(number).await
    }

    async fn lock_accounts(&mut self, account_ids: &[AccountId]) -> Result<Vec<Account>> {
        let mut found: Vec<Account> = self
            .working
            .accounts
            .iter()
            .filter(|a| account_ids.contains(&a.account_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        Ok(found)
    }

    async fn account_number_exists(&mut self, number: &AccountNumber) -> Result<bool> {
        Ok(self
            .working
            .accounts
            .iter()
            .any(|a| &a.account_number == number))
    }

    async fn list_accounts(&mut self) -> Result<Vec<Account>> {
        Ok(self.working.accounts.clone())
    }

    async fn count_accounts_for_user(&mut self, user_id: &UserId) -> Result<u64> {
        let count = self
            .working
            .accounts
            .iter()
            .filter(|a| &a.user_id == user_id)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn set_balance(&mut self, account_id: &AccountId, balance: Decimal) -> Result<()> {
        if balance < Decimal::ZERO {
            return Err(check(constraint::ACCOUNTS_BALANCE_NON_NEGATIVE));
        }
        if let Some(account) = self.account_mut(account_id) {
            account.balance = balance;
        }
        Ok(())
    }

    async fn delete_account(&mut self, account_id: &AccountId) -> Result<()> {
        self.working.transactions.retain(|t| {
            &t.account_id_from != account_id && &t.account_id_to != account_id
        });
        self.working.accounts.retain(|a| &a.account_id != account_id);
        Ok(())
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    async fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction> {
        if self.fail_next_transaction_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Database("injected transaction insert failure".into()));
        }
        if transaction.amount <= Decimal::ZERO {
            return Err(check(constraint::TRANSACTIONS_AMOUNT_POSITIVE));
        }
        if !self.has_account(&transaction.account_id_from) {
            return Err(foreign_key(constraint::TRANSACTIONS_FROM_FKEY));
        }
        if !self.has_account(&transaction.account_id_to) {
            return Err(foreign_key(constraint::TRANSACTIONS_TO_FKEY));
        }

        let record = Transaction {
            transaction_id: transaction.transaction_id,
            account_id_from: transaction.account_id_from.clone(),
            account_id_to: transaction.account_id_to.clone(),
            amount: transaction.amount,
            created_at: Utc::now(),
        };
        self.working.transactions.push(record.clone());
        Ok(record)
    }

    async fn list_transactions(&mut self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        Ok(self
            .working
            .transactions
            .iter()
            .rev()
            .filter(|t| &t.account_id_from == account_id || &t.account_id_to == account_id)
            .cloned()
            .collect())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    async fn commit(self) -> Result<()> {
        let Self {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
