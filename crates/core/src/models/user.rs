//! User accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Email, UserId, UserRole};

/// A registered user.
///
/// Customers and admins share one table; `role` decides admin API access.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    /// Argon2 PHC string. `None` for accounts created through Google sign-in
    /// that never set a password.
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account can log in with a password.
    #[must_use]
    pub const fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the account may use the admin API.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(password_hash: Option<&str>, role: UserRole) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("bat@example.mn").unwrap(),
            password_hash: password_hash.map(str::to_owned),
            role,
            name: Some("Bat".to_owned()),
            phone: None,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(user(Some("$argon2id$secret"), UserRole::Customer)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "customer");
        assert_eq!(json["email"], "bat@example.mn");
    }

    #[test]
    fn test_has_password_and_admin() {
        assert!(!user(None, UserRole::Customer).has_password());
        assert!(user(Some("x"), UserRole::Admin).is_admin());
    }
}
