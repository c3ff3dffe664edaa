//! Database schema definitions.
//!
//! Table and constraint names declared by the migrations in `migrations/`.
//! Both backends report violations using these names so errors can be
//! classified the same way regardless of where they came from.

/// Table names.
pub mod table {
    /// Registered users, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Accounts, keyed by `account_id`, unique on `account_number`.
    pub const ACCOUNTS: &str = "accounts";

    /// Append-only transfer records, keyed by `transaction_id`.
    pub const TRANSACTIONS: &str = "transactions";
}

/// Constraint names.
pub mod constraint {
    /// `users.email` is unique.
    pub const USERS_EMAIL_KEY: &str = "users_email_key";

    /// `accounts.account_id` is the primary key.
    pub const ACCOUNTS_PKEY: &str = "accounts_pkey";

    /// `accounts.account_number` is unique.
    pub const ACCOUNTS_NUMBER_KEY: &str = "accounts_account_number_key";

    /// `accounts.user_id` references `users`, `ON DELETE RESTRICT`.
    pub const ACCOUNTS_USER_FKEY: &str = "accounts_user_id_fkey";

    /// `accounts.balance >= 0`.
    pub const ACCOUNTS_BALANCE_NON_NEGATIVE: &str = "accounts_balance_non_negative";

    /// `transactions.account_id_from` references `accounts`, `ON DELETE CASCADE`.
    pub const TRANSACTIONS_FROM_FKEY: &str = "transactions_account_id_from_fkey";

    /// `transactions.account_id_to` references `accounts`, `ON DELETE CASCADE`.
    pub const TRANSACTIONS_TO_FKEY: &str = "transactions_account_id_to_fkey";

    /// `transactions.amount > 0`.
    pub const TRANSACTIONS_AMOUNT_POSITIVE: &str = "transactions_amount_positive";
}
