//! Authentication error types.

use thiserror::Error;

use fuelstack_core::EmailError;
use fuelstack_core::password::PasswordError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong password, unknown email, or an account without a password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password doesn't meet the policy.
    #[error("{0}")]
    WeakPassword(PasswordError),

    /// Changing a password requires the current one.
    #[error("current password is required")]
    CurrentPasswordRequired,

    /// The current password given for a change is wrong.
    #[error("current password is incorrect")]
    IncorrectCurrentPassword,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort => Self::WeakPassword(e),
            PasswordError::Mismatch => Self::InvalidCredentials,
            PasswordError::Hash => Self::PasswordHash,
        }
    }
}
