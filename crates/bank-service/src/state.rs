//! Application state.

use std::sync::Arc;

use bank_ledger::{Authenticator, Ledger};
use bank_store::Store;

use crate::config::{ConfigError, ServiceConfig};

/// Application state shared across handlers.
pub struct AppState<S: Store> {
    /// The ledger engine.
    pub ledger: Arc<Ledger<S>>,

    /// The authentication engine.
    pub auth: Arc<Authenticator<S>>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl<S: Store> AppState<S> {
    /// Build both engines over one shared store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the token configuration is unusable.
    pub fn new(store: Arc<S>, config: ServiceConfig) -> Result<Self, ConfigError> {
        let token_config = config.token_config()?;
        tracing::info!(
            algorithm = ?token_config.algorithm(),
            ttl_secs = token_config.ttl().as_secs(),
            "Token signing configured"
        );

        Ok(Self {
            ledger: Arc::new(Ledger::new(Arc::clone(&store))),
            auth: Arc::new(Authenticator::new(store, token_config)),
            config,
        })
    }

    /// Assemble state from pre-built engines.
    #[must_use]
    pub fn from_parts(ledger: Ledger<S>, auth: Authenticator<S>, config: ServiceConfig) -> Self {
        Self {
            ledger: Arc::new(ledger),
            auth: Arc::new(auth),
            config,
        }
    }
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            auth: Arc::clone(&self.auth),
            config: self.config.clone(),
        }
    }
}
