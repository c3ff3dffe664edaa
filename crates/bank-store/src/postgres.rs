//! PostgreSQL storage implementation.
//!
//! This module provides the `PgStore` implementation of the `Store` trait,
//! backed by a bounded `sqlx` connection pool. Each unit of work is one
//! database transaction with `lock_timeout` and `statement_timeout` set
//! locally, so a contended row lock or a slow statement fails with
//! `StoreError::Timeout` instead of hanging the request.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use tracing::{debug, info};

use bank_core::{
    Account, AccountId, AccountNumber, NewAccount, NewTransaction, NewUser, Transaction,
    TransactionId, User, UserId, UserSummary,
};

use crate::error::{Result, StoreError};
use crate::{Store, UnitOfWork};

/// Connection and locking bounds for a [`PgStore`].
#[derive(Debug, Clone)]
pub struct PgStoreOptions {
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long `begin` waits for a pooled connection.
    pub acquire_timeout: Duration,
    /// How long a statement waits for a row lock.
    pub lock_timeout: Duration,
    /// How long a single statement may run.
    pub statement_timeout: Duration,
}

impl Default for PgStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            lock_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

/// PostgreSQL storage backend.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    lock_timeout: Duration,
    statement_timeout: Duration,
}

impl PgStore {
    /// Connect to `database_url` with the given bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial connection cannot be established.
    pub async fn connect(database_url: &str, options: &PgStoreOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(database_url)
            .await?;

        info!(
            max_connections = options.max_connections,
            "PostgreSQL connection pool established"
        );
        Ok(Self::from_pool(pool, options))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool, options: &PgStoreOptions) -> Self {
        Self {
            pool,
            lock_timeout: options.lock_timeout,
            statement_timeout: options.statement_timeout,
        }
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to apply.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        info!("database migrations applied");
        Ok(())
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Unit = PgUnit;

    async fn begin(&self) -> Result<PgUnit> {
        let mut tx = self.pool.begin().await?;

        // SET does not accept bind parameters; both values are integers
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        Ok(PgUnit { tx })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A unit of work over a [`PgStore`]: one database transaction.
pub struct PgUnit {
    tx: sqlx::Transaction<'static, Postgres>,
}

// =============================================================================
// Row decoding
// =============================================================================

fn corrupt(column: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{column}: {err}"))
}

fn account_id_column(row: &PgRow, column: &str) -> Result<AccountId> {
    let raw: String = row.try_get(column)?;
    AccountId::from_str(&raw).map_err(|e| corrupt(column, e))
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
    })
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    let number: Decimal = row.try_get("account_number")?;
    Ok(Account {
        account_id: account_id_column(row, "account_id")?,
        account_number: AccountNumber::from_decimal(number)
            .map_err(|e| corrupt("account_number", e))?,
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        balance: row.try_get("balance")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(Transaction {
        transaction_id: TransactionId::from_uuid(row.try_get("transaction_id")?),
        account_id_from: account_id_column(row, "account_id_from")?,
        account_id_to: account_id_column(row, "account_id_to")?,
        amount: row.try_get("amount")?,
        created_at,
    })
}

const ACCOUNT_COLUMNS: &str = "account_id, account_number, user_id, balance";

#[async_trait]
impl UnitOfWork for PgUnit {
    // =========================================================================
    // User Operations
    // =========================================================================

    async fn insert_user(&mut self, user: &NewUser) -> Result<User> {
        let row = sqlx::query(
            r"
            INSERT INTO users (user_id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING user_id, email, password_hash
            ",
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *self.tx)
        .await?;

        user_from_row(&row)
    }

    async fn find_user(&mut self, user_id: &UserId) -> Result<Option<User>> {
        sqlx::query("SELECT user_id, email, password_hash FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        sqlx::query("SELECT user_id, email, password_hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn list_users(&mut self) -> Result<Vec<UserSummary>> {
        let rows = sqlx::query(
            r"
            SELECT u.user_id, u.email,
                   (SELECT a.account_id FROM accounts a
                    WHERE a.user_id = u.user_id
                    ORDER BY a.created_at, a.account_id
                    LIMIT 1) AS account_id
            FROM users u
            ORDER BY u.created_at, u.user_id
            ",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| -> Result<UserSummary> {
                let account_id: Option<String> = row.try_get("account_id")?;
                Ok(UserSummary {
                    user_id: UserId::from_uuid(row.try_get("user_id")?),
                    email: row.try_get("email")?,
                    account_id: account_id
                        .map(|raw| AccountId::from_str(&raw))
                        .transpose()
                        .map_err(|e| corrupt("account_id", e))?,
                })
            })
            .collect()
    }

    async fn update_user_email(&mut self, user_id: &UserId, email: &str) -> Result<()> {
        sqlx::query("UPDATE users SET email = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(email)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_user(&mut self, user_id: &UserId) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Account Operations
    // =========================================================================

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account> {
        let row = sqlx::query(&format!(
            r"
            INSERT INTO accounts (account_id, account_number, user_id)
            VALUES ($1, $2, $3)
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(account.account_id.as_str())
        .bind(account.account_number.to_decimal())
        .bind(account.user_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await?;

        account_from_row(&row)
    }

    async fn find_account_by_number(
        &mut self,
        number: &AccountNumber,
    ) -> Result<Option<Account>> {
        sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_number = $1"
        ))
        .bind(number.to_decimal())
        .fetch_optional(&mut *self.tx)
        .await?
        .as_ref()
        .map(account_from_row)
        .transpose()
    }

    async fn lock_account_by_number(
        &mut self,
        number: &AccountNumber,
    ) -> Result<Option<Account>> {
        sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_number = $1 FOR UPDATE"
        ))
        .bind(number.to_decimal())
        .fetch_optional(&mut *self.tx)
        .await?
        .as_ref()
        .map(account_from_row)
        .transpose()
    }

    async fn lock_accounts(&mut self, account_ids: &[AccountId]) -> Result<Vec<Account>> {
        let ids: Vec<&str> = account_ids.iter().map(AccountId::as_str).collect();
        debug!(accounts = ?ids, "locking accounts");

        let rows = sqlx::query(&format!(
            r"
            SELECT {ACCOUNT_COLUMNS} FROM accounts
            WHERE account_id = ANY($1)
            ORDER BY account_id
            FOR UPDATE
            "
        ))
        .bind(&ids[..])
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn account_number_exists(&mut self, number: &AccountNumber) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE account_number = $1)")
                .bind(number.to_decimal())
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn list_accounts(&mut self) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, account_id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn count_accounts_for_user(&mut self, user_id: &UserId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await?;
        u64::try_from(count).map_err(|e| corrupt("count", e))
    }

    async fn set_balance(&mut self, account_id: &AccountId, balance: Decimal) -> Result<()> {
        sqlx::query("UPDATE accounts SET balance = $2 WHERE account_id = $1")
            .bind(account_id.as_str())
            .bind(balance)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_account(&mut self, account_id: &AccountId) -> Result<()> {
        sqlx::query("DELETE FROM accounts WHERE account_id = $1")
            .bind(account_id.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    async fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction> {
        // clock_timestamp() keeps transfers made in one unit of work ordered
        let row = sqlx::query(
            r"
            INSERT INTO transactions
                (transaction_id, account_id_from, account_id_to, amount, created_at)
            VALUES ($1, $2, $3, $4, clock_timestamp())
            RETURNING transaction_id, account_id_from, account_id_to, amount, created_at
            ",
        )
        .bind(transaction.transaction_id.as_uuid())
        .bind(transaction.account_id_from.as_str())
        .bind(transaction.account_id_to.as_str())
        .bind(transaction.amount)
        .fetch_one(&mut *self.tx)
        .await?;

        transaction_from_row(&row)
    }

    async fn list_transactions(&mut self, account_id: &AccountId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r"
            SELECT transaction_id, account_id_from, account_id_to, amount, created_at
            FROM transactions
            WHERE account_id_from = $1 OR account_id_to = $1
            ORDER BY created_at DESC, transaction_id DESC
            ",
        )
        .bind(account_id.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
