//! Ledger and authentication engines for the bank ledger.
//!
//! This crate holds the business logic that sits between the transport layer
//! and the store:
//!
//! - [`Ledger`]: users, accounts and atomic transfers, one unit of work per
//!   operation
//! - [`Authenticator`]: credential checks and stateless signed tokens
//!
//! Both engines are constructed once with a shared store and injected
//! wherever they are needed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bank_core::Decimal;
//! use bank_ledger::Ledger;
//! use bank_store::MemoryStore;
//!
//! # async fn example() -> bank_core::Result<()> {
//! let ledger = Ledger::new(Arc::new(MemoryStore::new()));
//!
//! let alice = ledger.create_user("alice@example.com", "Aa1!2345").await?;
//! let savings = ledger.create_account(&alice.user_id).await?;
//! ledger.update_account(&savings.account_number, Decimal::ONE_HUNDRED).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod ledger;
pub mod password;

pub use auth::{AccessToken, Authenticator, Claims, TokenConfig};
pub use ledger::Ledger;
pub use password::{verify_password, Params, PasswordHasher};

pub use jsonwebtoken::Algorithm;
