/// Argon2id hashing for the credentials stored on `users.password_hash`
use crate::error::{IdentityError, Result};
use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};

/// PHC string for a password that already passed `validate_password`
/// (six characters or more); only used off the async executor.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Internal(format!("Argon2 hashing failed: {e}")))
}

/// `Ok(false)` is a wrong password and becomes `InvalidCredentials` at login.
/// A stored hash that does not parse is an internal error, never a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let stored = PasswordHash::new(password_hash)
        .map_err(|e| IdentityError::Internal(format!("Stored password hash unreadable: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Internal(format!("Argon2 verification failed: {e}"))),
    }
}
