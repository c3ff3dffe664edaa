//! Ledger operations engine.
//!
//! Every public operation runs in exactly one unit of work: it begins one,
//! does its reads and writes, and then commits on success or rolls back on
//! any error. Transfers lock both accounts in ascending id order before
//! checking the balance, so concurrent transfers out of one account are
//! serialized and can never overdraw it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use bank_core::validation::{
    validate_email, validate_new_balance, validate_password, validate_transfer,
};
use bank_core::{
    Account, AccountId, AccountNumber, Decimal, LedgerError, NewAccount, NewTransaction, NewUser,
    Result, Transaction, TransferReceipt, User, UserId, UserSummary, ValidationError,
};
use bank_store::{Store, UnitOfWork};

use crate::password::PasswordHasher;

/// How many fresh account numbers are tried before giving up.
pub const ACCOUNT_NUMBER_ATTEMPTS: usize = 3;

/// The ledger engine.
pub struct Ledger<S: Store> {
    store: Arc<S>,
    hasher: PasswordHasher,
}

impl<S: Store> Ledger<S> {
    /// Create a ledger over `store` with default password hashing.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_hasher(store, PasswordHasher::default())
    }

    /// Create a ledger with a specific password hasher.
    pub fn with_hasher(store: Arc<S>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn begin(&self) -> Result<S::Unit> {
        Ok(self.store.begin().await?)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Register a user together with one default account.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email or a weak password.
    /// - `Duplicate` if the email is already registered.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<UserSummary> {
        validate_email(email)?;
        validate_password(password)?;
        let password_hash = self.hasher.hash(password)?;

        let mut unit = self.begin().await?;
        let outcome = register(&mut unit, NewUser::new(email, password_hash)).await;
        let summary = settle(unit, outcome).await?;

        info!(user_id = %summary.user_id, "user registered");
        Ok(summary)
    }

    /// List every user with the id of their first account.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let mut unit = self.begin().await?;
        let outcome = unit.list_users().await.map_err(LedgerError::from);
        settle(unit, outcome).await
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no user has this email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        let mut unit = self.begin().await?;
        let outcome = unit
            .find_user_by_email(email)
            .await
            .map_err(LedgerError::from)
            .and_then(|user| user.ok_or_else(|| LedgerError::user_not_found(email)));
        settle(unit, outcome).await
    }

    /// Change a user's email. Setting the current email again is a no-op.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email.
    /// - `NotFound` if the user does not exist.
    /// - `Duplicate` if another user owns the email.
    pub async fn update_user(&self, user_id: &UserId, new_email: &str) -> Result<User> {
        validate_email(new_email)?;

        let mut unit = self.begin().await?;
        let outcome = change_email(&mut unit, user_id, new_email).await;
        let user = settle(unit, outcome).await?;

        info!(user_id = %user.user_id, "user email updated");
        Ok(user)
    }

    /// Delete a user who owns no accounts.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist.
    /// - `Restricted` if the user still owns accounts.
    pub async fn delete_user(&self, user_id: &UserId) -> Result<()> {
        let mut unit = self.begin().await?;
        let outcome = remove_user(&mut unit, user_id).await;
        settle(unit, outcome).await?;

        info!(user_id = %user_id, "user deleted");
        Ok(())
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Open a zero-balance account for an existing user.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist.
    /// - `Duplicate` if no unique account number could be allocated.
    pub async fn create_account(&self, user_id: &UserId) -> Result<Account> {
        let mut unit = self.begin().await?;
        let outcome = open_account(&mut unit, user_id).await;
        let account = settle(unit, outcome).await?;

        info!(
            user_id = %user_id,
            account_id = %account.account_id,
            "account opened"
        );
        Ok(account)
    }

    /// List every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut unit = self.begin().await?;
        let outcome = unit.list_accounts().await.map_err(LedgerError::from);
        settle(unit, outcome).await
    }

    /// Get an account by its public number.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this number.
    pub async fn get_account(&self, number: &AccountNumber) -> Result<Account> {
        let mut unit = self.begin().await?;
        let outcome = unit
            .find_account_by_number(number)
            .await
            .map_err(LedgerError::from)
            .and_then(|account| account.ok_or_else(|| LedgerError::account_not_found(number)));
        settle(unit, outcome).await
    }

    /// List the transfers touching an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this number.
    pub async fn list_transactions(&self, number: &AccountNumber) -> Result<Vec<Transaction>> {
        let mut unit = self.begin().await?;
        let outcome = history(&mut unit, number).await;
        settle(unit, outcome).await
    }

    /// Overwrite an account's balance. This is an administrative correction,
    /// not a transfer: no other account is touched and nothing is recorded.
    ///
    /// # Errors
    ///
    /// - `Validation(AmountTooSmall)` for a negative amount.
    /// - `NotFound` if no account has this number.
    pub async fn update_account(
        &self,
        number: &AccountNumber,
        new_amount: Decimal,
    ) -> Result<Account> {
        validate_new_balance(new_amount)?;

        let mut unit = self.begin().await?;
        let outcome = overwrite_balance(&mut unit, number, new_amount).await;
        let account = settle(unit, outcome).await?;

        warn!(
            account_id = %account.account_id,
            balance = %account.balance,
            "account balance overwritten"
        );
        Ok(account)
    }

    /// Delete an account and, through the store's cascade, its transfers.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this number.
    pub async fn delete_account(&self, number: &AccountNumber) -> Result<()> {
        let mut unit = self.begin().await?;
        let outcome = remove_account(&mut unit, number).await;
        let account_id = settle(unit, outcome).await?;

        info!(account_id = %account_id, "account deleted");
        Ok(())
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Move `amount` from one account to another.
    ///
    /// The debit, the credit and the transfer record are written in one unit
    /// of work; if any of them fails none is kept.
    ///
    /// # Errors
    ///
    /// - `Validation(ConversionType)` if both accounts are the same.
    /// - `Validation(AmountTooSmall)` for a non-positive amount or
    ///   insufficient funds.
    /// - `NotFound` naming the first missing account.
    /// - `Unavailable` if the account locks are not granted in time.
    pub async fn create_transaction(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt> {
        validate_transfer(from, to, amount)?;

        let mut unit = self.begin().await?;
        let outcome = transfer(&mut unit, from, to, amount).await;
        let receipt = settle(unit, outcome).await?;

        info!(
            transaction_id = %receipt.transaction_id,
            from = %receipt.account_from,
            to = %receipt.account_to,
            amount = %receipt.amount,
            "transfer committed"
        );
        Ok(receipt)
    }
}

impl<S: Store> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit-of-work bodies
// =============================================================================

/// Commit `unit` if `outcome` succeeded, roll it back otherwise.
async fn settle<U: UnitOfWork, T>(unit: U, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            unit.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

async fn fresh_account_number<U: UnitOfWork>(unit: &mut U) -> Result<AccountNumber> {
    for attempt in 1..=ACCOUNT_NUMBER_ATTEMPTS {
        let number = AccountNumber::generate();
        if !unit.account_number_exists(&number).await? {
            return Ok(number);
        }
        debug!(attempt, "account number collision, regenerating");
    }
    Err(LedgerError::Duplicate(
        "could not allocate a unique account number".into(),
    ))
}

async fn register<U: UnitOfWork>(unit: &mut U, user: NewUser) -> Result<UserSummary> {
    if unit.find_user_by_email(&user.email).await?.is_some() {
        return Err(LedgerError::Duplicate("email already registered".into()));
    }

    let user = unit.insert_user(&user).await?;
    let number = fresh_account_number(unit).await?;
    let account = unit
        .insert_account(&NewAccount::new(user.user_id, number))
        .await?;

    Ok(UserSummary {
        user_id: user.user_id,
        email: user.email,
        account_id: Some(account.account_id),
    })
}

async fn change_email<U: UnitOfWork>(
    unit: &mut U,
    user_id: &UserId,
    new_email: &str,
) -> Result<User> {
    let mut user = unit
        .find_user(user_id)
        .await?
        .ok_or_else(|| LedgerError::user_not_found(user_id))?;

    if user.email == new_email {
        return Ok(user);
    }
    if let Some(owner) = unit.find_user_by_email(new_email).await? {
        if &owner.user_id != user_id {
            return Err(LedgerError::Duplicate("email already registered".into()));
        }
    }

    unit.update_user_email(user_id, new_email).await?;
    user.email = new_email.to_string();
    Ok(user)
}

async fn remove_user<U: UnitOfWork>(unit: &mut U, user_id: &UserId) -> Result<()> {
    if unit.find_user(user_id).await?.is_none() {
        return Err(LedgerError::user_not_found(user_id));
    }

    let owned = unit.count_accounts_for_user(user_id).await?;
    if owned > 0 {
        return Err(LedgerError::Restricted(format!(
            "user still owns {owned} account(s)"
        )));
    }

    unit.delete_user(user_id).await?;
    Ok(())
}

async fn open_account<U: UnitOfWork>(unit: &mut U, user_id: &UserId) -> Result<Account> {
    if unit.find_user(user_id).await?.is_none() {
        return Err(LedgerError::user_not_found(user_id));
    }

    let number = fresh_account_number(unit).await?;
    Ok(unit
        .insert_account(&NewAccount::new(*user_id, number))
        .await?)
}

async fn history<U: UnitOfWork>(unit: &mut U, number: &AccountNumber) -> Result<Vec<Transaction>> {
    let account = unit
        .find_account_by_number(number)
        .await?
        .ok_or_else(|| LedgerError::account_not_found(number))?;
    Ok(unit.list_transactions(&account.account_id).await?)
}

async fn overwrite_balance<U: UnitOfWork>(
    unit: &mut U,
    number: &AccountNumber,
    new_amount: Decimal,
) -> Result<Account> {
    let mut account = unit
        .lock_account_by_number(number)
        .await?
        .ok_or_else(|| LedgerError::account_not_found(number))?;

    unit.set_balance(&account.account_id, new_amount).await?;
    account.balance = new_amount;
    Ok(account)
}

async fn remove_account<U: UnitOfWork>(unit: &mut U, number: &AccountNumber) -> Result<AccountId> {
    let account = unit
        .lock_account_by_number(number)
        .await?
        .ok_or_else(|| LedgerError::account_not_found(number))?;

    unit.delete_account(&account.account_id).await?;
    Ok(account.account_id)
}

async fn transfer<U: UnitOfWork>(
    unit: &mut U,
    from: &AccountId,
    to: &AccountId,
    amount: Decimal,
) -> Result<TransferReceipt> {
    let locked = unit.lock_accounts(&[from.clone(), to.clone()]).await?;
    let find = |id: &AccountId| {
        locked
            .iter()
            .find(|a| &a.account_id == id)
            .cloned()
            .ok_or_else(|| LedgerError::account_not_found(id))
    };
    let source = find(from)?;
    let destination = find(to)?;

    if !source.has_sufficient_funds(amount) {
        debug!(
            account_id = %source.account_id,
            balance = %source.balance,
            amount = %amount,
            "transfer rejected: insufficient funds"
        );
        return Err(ValidationError::AmountTooSmall(format!(
            "insufficient funds in account {}",
            source.account_id
        ))
        .into());
    }

    let debited = source
        .balance
        .checked_sub(amount)
        .ok_or_else(|| balance_overflow(&source.account_id))?;
    let credited = destination
        .balance
        .checked_add(amount)
        .ok_or_else(|| balance_overflow(&destination.account_id))?;

    unit.set_balance(&source.account_id, debited).await?;
    unit.set_balance(&destination.account_id, credited).await?;
    let record = unit
        .insert_transaction(&NewTransaction::new(from.clone(), to.clone(), amount))
        .await?;

    Ok(TransferReceipt::from(&record))
}

fn balance_overflow(account_id: &AccountId) -> LedgerError {
    ValidationError::ConversionType(format!(
        "balance of account {account_id} would overflow"
    ))
    .into()
}
