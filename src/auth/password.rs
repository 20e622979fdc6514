use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{error, warn};

lazy_static! {
    /// Verified in place of a real hash when the account does not exist.
    static ref DUMMY_HASH: String = hash_password("biolink-no-such-account").unwrap_or_default();
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Hashes with Argon2id default parameters and a fresh salt; output is a PHC string.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// A stored hash that does not parse never verifies.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    #[cfg(test)]
    test_support::record_verify(plain);
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Runs one full verification against a throwaway hash and always fails,
/// so a missing account costs the same as a wrong password.
pub fn verify_dummy(plain: &str) -> bool {
    let _ = verify_password(plain, &DUMMY_HASH);
    false
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    lazy_static::lazy_static! {
        static ref VERIFIED: Mutex<Vec<String>> = Mutex::new(Vec::new());
    }

    pub(super) fn record_verify(plain: &str) {
        VERIFIED.lock().unwrap().push(plain.to_string());
    }

    /// Number of Argon2 verifications run for `plain` so far.
    pub(crate) fn argon2_runs_for(plain: &str) -> usize {
        VERIFIED.lock().unwrap().iter().filter(|p| *p == plain).count()
    }
}
