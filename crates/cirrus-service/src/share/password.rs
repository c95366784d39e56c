use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use cirrus_core::{AppError, AppResult};

/// Argon2id hashing for share-link passwords. Only the PHC string ever
/// reaches the database.
#[derive(Debug, Clone, Default)]
pub struct SharePasswordHasher;

impl SharePasswordHasher {
    pub fn new() -> Self {
        Self
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

        Ok(hash.to_string())
    }

    /// `Ok(false)` for a wrong password. Errors are reserved for hashes
    /// that cannot be parsed at all.
    pub fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Stored password hash is invalid: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!("Failed to verify password: {e}"))),
        }
    }
}
