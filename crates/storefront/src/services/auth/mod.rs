//! Authentication service.
//!
//! Email and password accounts. Google sign-in lives in
//! [`crate::services::google`] and shares the same user table.

mod error;

pub use error::AuthError;

use sqlx::PgPool;

use fuelstack_core::Email;
use fuelstack_core::UserId;
use fuelstack_core::models::User;
use fuelstack_core::password::{hash_password, validate_password, verify_password};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        self.users
            .create_with_password(&email, &password_hash, name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Log in with email and password.
    ///
    /// Accounts created through Google have no password and always fail here.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        Ok(user)
    }

    /// Change (or, for Google-only accounts, set) a user's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CurrentPasswordRequired` if the account has a
    /// password and none was given.
    /// Returns `AuthError::IncorrectCurrentPassword` if it doesn't match.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(hash) = user.password_hash.as_deref() {
            let current = current_password
                .filter(|p| !p.is_empty())
                .ok_or(AuthError::CurrentPasswordRequired)?;
            verify_password(current, hash).map_err(|_| AuthError::IncorrectCurrentPassword)?;
        }

        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;
        self.users.set_password_hash(user_id, &new_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
