//! Admin authentication service.
//!
//! Admins sign in with the same email and password as on the storefront;
//! only accounts with the admin role get in. Google-only accounts have no
//! password and can't use the back office.

mod error;

pub use error::AdminAuthError;

use sqlx::PgPool;

use fuelstack_core::Email;
use fuelstack_core::models::User;
use fuelstack_core::password::{PasswordError, verify_password};

use crate::db::UserRepository;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Log in with email and password.
    ///
    /// The role is checked only after the password, so a wrong password never
    /// reveals whether an account is an admin.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AdminAuthError::NotAdmin` if the account isn't an admin.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AdminAuthError::InvalidCredentials)?;
        verify_password(password, hash).map_err(|e| match e {
            PasswordError::Hash => AdminAuthError::PasswordHash,
            PasswordError::Mismatch | PasswordError::TooShort => {
                AdminAuthError::InvalidCredentials
            }
        })?;

        if !user.role.is_admin() {
            tracing::warn!(user_id = %user.id, "Non-admin attempted back-office login");
            return Err(AdminAuthError::NotAdmin);
        }

        Ok(user)
    }
}
