//! Password policy and argon2 hashing for user accounts.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{error, warn};

pub const MIN_PASSWORD_LEN: usize = 8;
/// Caps the work a single request can ask argon2 to do.
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password must be at least {0} characters")]
    TooShort(usize),
    #[error("Password must be at most {0} characters")]
    TooLong(usize),
    #[error("Password must not be blank")]
    Blank,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is unreadable: {0}")]
    CorruptHash(String),
}

impl PasswordError {
    /// Rejections the client can fix by choosing another password.
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::TooShort(_) | Self::TooLong(_) | Self::Blank)
    }
}

/// Length is counted in chars, so non-ASCII passwords are not penalized.
pub fn check_policy(plain: &str) -> Result<(), PasswordError> {
    let len = plain.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort(MIN_PASSWORD_LEN));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(PasswordError::TooLong(MAX_PASSWORD_LEN));
    }
    if plain.trim().is_empty() {
        return Err(PasswordError::Blank);
    }
    Ok(())
}

/// Applies [`check_policy`], then hashes with a fresh salt.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    if let Err(e) = check_policy(plain) {
        warn!(error = %e, "password rejected by policy");
        return Err(e);
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hashing failed");
            PasswordError::Hash(e.to_string())
        })
}

/// `Ok(false)` on mismatch. Stored hashes predate any policy change, so
/// the policy is not applied here.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash does not parse");
        PasswordError::CorruptHash(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
