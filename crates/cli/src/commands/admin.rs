//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account with a password
//! fs-cli admin create -e owner@fuelstack.mn -n "Store Owner" -p 'a-long-password'
//!
//! # Promote an existing customer account
//! fs-cli admin promote -e manager@fuelstack.mn
//! ```

use thiserror::Error;

use fuelstack_admin::db::{RepositoryError, UserRepository};
use fuelstack_core::password::{PasswordError, hash_password, validate_password};
use fuelstack_core::{Email, UserId, UserRole};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password rejected by the policy, or hashing failed.
    #[error("Invalid password: {0}")]
    Password(#[from] PasswordError),

    /// Name is blank.
    #[error("Name is required")]
    MissingName,

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// No user has the email.
    #[error("No user with email: {0}")]
    UserNotFound(String),
}

/// Check the inputs of `admin create` before touching the database.
fn validate_new_admin(email: &str, name: &str, password: &str) -> Result<Email, AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    if name.trim().is_empty() {
        return Err(AdminError::MissingName);
    }
    validate_password(password)?;
    Ok(email)
}

/// Create a new admin account.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let email = validate_new_admin(email, name, password)?;
    let password_hash = hash_password(password).map_err(AdminError::from)?;

    let pool = super::connect().await?;

    if UserRepository::new(&pool)
        .get_by_email(&email)
        .await
        .map_err(AdminError::from)?
        .is_some()
    {
        return Err(AdminError::UserExists(email.to_string()).into());
    }

    tracing::info!("Creating admin user: {}", email);

    let user_id: UserId = sqlx::query_scalar(
        r"
        INSERT INTO shop.user (email, password_hash, role, name)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(UserRole::Admin)
    .bind(name.trim())
    .fetch_one(&pool)
    .await
    .map_err(AdminError::from)?;

    tracing::info!("Admin user created successfully! ID: {}, Email: {}", user_id, email);
    Ok(user_id)
}

/// Give an existing account the admin role.
///
/// # Errors
///
/// Returns an error if no account has the email or the database is
/// unreachable.
pub async fn promote_user(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&parsed)
        .await
        .map_err(AdminError::from)?
        .ok_or_else(|| AdminError::UserNotFound(parsed.to_string()))?;

    if user.role.is_admin() {
        tracing::info!("{} is already an admin", user.email);
        return Ok(());
    }

    users
        .set_role(user.id, UserRole::Admin)
        .await
        .map_err(AdminError::from)?;
    tracing::info!("Promoted {} (ID {}) to admin", user.email, user.id);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_admin() {
        let email = validate_new_admin("Owner@FuelStack.mn", "Owner", "long-enough-1").unwrap();
        assert_eq!(email.as_str(), "owner@fuelstack.mn");
    }

    #[test]
    fn test_validate_new_admin_rejects_bad_input() {
        assert!(matches!(
            validate_new_admin("not-an-email", "Owner", "long-enough-1"),
            Err(AdminError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_new_admin("owner@fuelstack.mn", "  ", "long-enough-1"),
            Err(AdminError::MissingName)
        ));
        assert!(matches!(
            validate_new_admin("owner@fuelstack.mn", "Owner", "short"),
            Err(AdminError::Password(PasswordError::TooShort))
        ));
    }
}
