//! Bank ledger client SDK.
//!
//! A thin typed wrapper over the service's HTTP API.
//!
//! # Example
//!
//! ```no_run
//! use bank_client::BankClient;
//! use bank_core::Decimal;
//!
//! # async fn example() -> Result<(), bank_client::ClientError> {
//! let client = BankClient::new("http://bank-ledger:8080")?;
//!
//! let alice = client.register("alice@example.com", "Aa1!2345").await?;
//! let token = client.login("alice@example.com", "Aa1!2345").await?;
//! let client = client.with_token(token.access_token);
//!
//! let savings = client.create_account(&alice.user_id.to_string()).await?;
//! let receipt = client
//!     .transfer(
//!         &alice.account_id.map(|id| id.to_string()).unwrap_or_default(),
//!         &savings.account_id,
//!         Decimal::new(4000, 2),
//!     )
//!     .await?;
//!
//! println!("Transfer {} committed", receipt.transaction_id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{BankClient, ClientOptions};
pub use error::ClientError;
pub use types::*;
