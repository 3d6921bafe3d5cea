//! Password policy and hashing.
//!
//! Hashes are Argon2id PHC strings. Accounts created through Google sign-in
//! have no hash at all; callers treat a missing hash as "cannot log in with a
//! password".

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from password validation and hashing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The password does not meet the policy.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
    /// The password does not match the stored hash.
    #[error("password does not match")]
    Mismatch,
    /// Hashing failed.
    #[error("password hashing failed")]
    Hash,
}

/// Check a candidate password against the policy.
///
/// # Errors
///
/// Returns `PasswordError::TooShort` when shorter than [`MIN_PASSWORD_LENGTH`].
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

/// Hash a password using Argon2id with a random salt.
///
/// # Errors
///
/// Returns `PasswordError::Hash` if the hasher fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a stored hash.
///
/// A malformed stored hash is reported as a mismatch.
///
/// # Errors
///
/// Returns `PasswordError::Mismatch` when the password is wrong.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::Mismatch)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert_eq!(validate_password("short"), Err(PasswordError::TooShort));
        assert!(validate_password("longenough").is_ok());
        // Counted in characters, not bytes.
        assert_eq!(validate_password("нууцүг"), Err(PasswordError::TooShort));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert_eq!(
            verify_password("wrong horse battery", &hash),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert_eq!(
            verify_password("anything", "not-a-phc-string"),
            Err(PasswordError::Mismatch)
        );
    }
}
