//! Password hashing.
//!
//! Passwords are hashed with argon2id and a random salt into a PHC string.
//! Verification reads the parameters back out of the stored string, so
//! hashes made with different cost settings remain verifiable.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::{Algorithm, Argon2, Version};

pub use argon2::Params;

use bank_core::{LedgerError, Result};

/// Hashes passwords for storage.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with explicit argon2id cost parameters.
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash `password` with a fresh salt.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Storage` if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LedgerError::Storage(format!("password hashing failed: {e}")))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

/// Check `password` against a stored PHC hash.
///
/// A malformed stored hash never matches.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// Spend the cost of one verification when there is no stored hash.
///
/// Keeps a lookup miss as slow as a wrong password.
pub(crate) fn verify_dummy(password: &str) {
    let _ = verify_password(password, dummy_hash());
}

/// Hash of a throwaway password with production cost parameters.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        PasswordHasher::default()
            .hash("dummy-password-never-issued")
            .unwrap_or_default()
    })
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid params"))
}
