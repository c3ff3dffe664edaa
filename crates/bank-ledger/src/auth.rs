//! Authentication engine.
//!
//! Credentials are checked against the stored argon2 hash; sessions are
//! stateless HMAC-signed JWTs whose subject is the user's email. The signing
//! algorithm and secret always come from [`TokenConfig`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bank_core::{LedgerError, Result, User};
use bank_store::{Store, UnitOfWork};

use crate::password::{verify_dummy, verify_password};

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Token signing configuration.
#[derive(Clone)]
pub struct TokenConfig {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenConfig {
    /// Build a configuration from a shared secret.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidToken` if `algorithm` is not an HMAC
    /// algorithm or the secret is empty.
    pub fn new(secret: &str, algorithm: Algorithm, ttl: Duration) -> Result<Self> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(LedgerError::InvalidToken);
        }
        if secret.is_empty() {
            return Err(LedgerError::InvalidToken);
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// The signing algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Lifetime of tokens issued by [`Authenticator::login`].
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// A freshly issued access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// The signed JWT.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// The authentication engine.
pub struct Authenticator<S: Store> {
    store: Arc<S>,
    config: TokenConfig,
}

impl<S: Store> Authenticator<S> {
    /// Create an authenticator over `store`.
    pub fn new(store: Arc<S>, config: TokenConfig) -> Self {
        Self { store, config }
    }

    /// The token configuration.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Check an email and password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for an unknown email and for a wrong
    /// password alike.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let mut unit = self.store.begin().await?;
        let found = unit.find_user_by_email(email).await;
        unit.rollback().await?;

        let matched = match found? {
            Some(user) => verify_password(password, &user.password_hash).then_some(user),
            None => {
                verify_dummy(password);
                None
            }
        };

        matched.ok_or_else(|| {
            debug!("authentication failed");
            LedgerError::AuthenticationFailed
        })
    }

    /// Authenticate and issue a token with the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the credentials do not match.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        let user = self.authenticate(email, password).await?;
        let access_token = self.issue_token(&user.email, self.config.ttl)?;

        debug!(user_id = %user.user_id, "token issued");
        Ok(AccessToken {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.config.ttl.as_secs(),
        })
    }

    /// Sign a token for `subject` that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if signing fails.
    pub fn issue_token(&self, subject: &str, ttl: Duration) -> Result<String> {
        self.issue_token_at(subject, ttl, Utc::now())
    }

    /// Sign a token as if it had been issued at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if signing fails.
    pub fn issue_token_at(
        &self,
        subject: &str,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let iat = issued_at.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        };

        encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.config.encoding_key,
        )
        .map_err(|e| LedgerError::Storage(format!("token signing failed: {e}")))
    }

    /// Check a token's signature and expiry and return its subject.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for a malformed, badly signed or expired token,
    /// or one without a subject.
    pub fn verify_token(&self, token: &str) -> Result<String> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.config.decoding_key, &validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            LedgerError::InvalidToken
        })?;

        if data.claims.sub.is_empty() {
            return Err(LedgerError::InvalidToken);
        }
        Ok(data.claims.sub)
    }
}

impl<S: Store> std::fmt::Debug for Authenticator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use bank_store::MemoryStore;
    use chrono::TimeDelta;

    use super::*;
    use crate::ledger::Ledger;
    use crate::password::fast_hasher;

    const SECRET: &str = "test-secret-do-not-use";
    const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);

    fn config() -> TokenConfig {
        TokenConfig::new(SECRET, Algorithm::HS256, FIFTEEN_MINUTES).unwrap()
    }

    async fn setup() -> Authenticator<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        Ledger::with_hasher(Arc::clone(&store), fast_hasher())
            .create_user("a@x.com", "Aa1!2345")
            .await
            .unwrap();
        Authenticator::new(store, config())
    }

    #[tokio::test]
    async fn correct_credentials_authenticate() {
        let auth = setup().await;
        let user = auth.authenticate("a@x.com", "Aa1!2345").await.unwrap();
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_alike() {
        let auth = setup().await;

        let wrong = auth.authenticate("a@x.com", "Aa1!2346").await.unwrap_err();
        let unknown = auth.authenticate("b@x.com", "Aa1!2345").await.unwrap_err();
        assert!(matches!(wrong, LedgerError::AuthenticationFailed));
        assert!(matches!(unknown, LedgerError::AuthenticationFailed));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn login_issues_verifiable_bearer_token() {
        let auth = setup().await;
        let token = auth.login("a@x.com", "Aa1!2345").await.unwrap();

        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 900);
        assert_eq!(auth.verify_token(&token.access_token).unwrap(), "a@x.com");
    }

    #[tokio::test]
    async fn token_round_trip() {
        let auth = setup().await;
        let token = auth.issue_token("a@x.com", FIFTEEN_MINUTES).unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), "a@x.com");
    }

    #[tokio::test]
    async fn expired_token_is_invalid() {
        let auth = setup().await;
        let issued_at = Utc::now() - TimeDelta::minutes(20);
        let token = auth
            .issue_token_at("a@x.com", FIFTEEN_MINUTES, issued_at)
            .unwrap();

        assert!(matches!(
            auth.verify_token(&token),
            Err(LedgerError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn foreign_signature_is_invalid() {
        let auth = setup().await;
        let other = Authenticator::new(
            Arc::new(MemoryStore::new()),
            TokenConfig::new("another-secret", Algorithm::HS256, FIFTEEN_MINUTES).unwrap(),
        );
        let token = other.issue_token("a@x.com", FIFTEEN_MINUTES).unwrap();

        assert!(matches!(
            auth.verify_token(&token),
            Err(LedgerError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn malformed_and_subjectless_tokens_are_invalid() {
        let auth = setup().await;
        assert!(auth.verify_token("not.a.jwt").is_err());
        assert!(auth.verify_token("").is_err());

        let empty_subject = auth.issue_token("", FIFTEEN_MINUTES).unwrap();
        assert!(matches!(
            auth.verify_token(&empty_subject),
            Err(LedgerError::InvalidToken)
        ));
    }

    #[test]
    fn asymmetric_algorithms_are_refused() {
        assert!(TokenConfig::new(SECRET, Algorithm::RS256, FIFTEEN_MINUTES).is_err());
        assert!(TokenConfig::new("", Algorithm::HS256, FIFTEEN_MINUTES).is_err());
    }

    #[test]
    fn debug_output_omits_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains(SECRET));
    }
}
