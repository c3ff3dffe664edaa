//! Service configuration.

use std::str::FromStr;
use std::time::Duration;

use bank_ledger::{Algorithm, TokenConfig};
use bank_store::PgStoreOptions;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Service configuration loaded from environment variables.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection string. Required.
    pub database_url: String,

    /// Shared secret for signing tokens. Required.
    pub jwt_secret: String,

    /// HMAC signing algorithm. Required.
    pub jwt_algorithm: Algorithm,

    /// Access token lifetime in minutes (default: 15).
    pub token_ttl_minutes: u64,

    /// Maximum pooled database connections (default: 10).
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection (default: 5).
    pub db_acquire_timeout_seconds: u64,

    /// Milliseconds a statement waits for a row lock (default: 5000).
    pub db_lock_timeout_ms: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or any value
    /// fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let jwt_algorithm = parse_algorithm(&required("JWT_ALGORITHM")?)?;

        Ok(Self {
            listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".into()),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_algorithm,
            token_ttl_minutes: parse_or(&lookup, "TOKEN_TTL_MINUTES", 15)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout_seconds: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECONDS", 5)?,
            db_lock_timeout_ms: parse_or(&lookup, "DB_LOCK_TIMEOUT_MS", 5000)?,
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", 1024 * 1024)?, // 1MB
            request_timeout_seconds: parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?,
        })
    }

    /// Connection bounds for the PostgreSQL store.
    #[must_use]
    pub fn store_options(&self) -> PgStoreOptions {
        PgStoreOptions {
            max_connections: self.db_max_connections,
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout_seconds),
            lock_timeout: Duration::from_millis(self.db_lock_timeout_ms),
            statement_timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }

    /// Access token lifetime.
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_minutes.saturating_mul(60))
    }

    /// Token signing configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the secret or algorithm is unusable.
    pub fn token_config(&self) -> Result<TokenConfig, ConfigError> {
        TokenConfig::new(&self.jwt_secret, self.jwt_algorithm, self.token_ttl()).map_err(|_| {
            ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: "secret must be non-empty and the algorithm HMAC".into(),
            }
        })
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("listen_addr", &self.listen_addr)
            .field("database_url", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_seconds", &self.db_acquire_timeout_seconds)
            .field("db_lock_timeout_ms", &self.db_lock_timeout_ms)
            .field("cors_origins", &self.cors_origins)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

/// Parse an HMAC algorithm name.
fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: "JWT_ALGORITHM",
        reason: format!("{raw:?} is not one of HS256, HS384, HS512"),
    };
    match Algorithm::from_str(raw.trim()).map_err(|_| invalid())? {
        alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => Ok(alg),
        _ => Err(invalid()),
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}
