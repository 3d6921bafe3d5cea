//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use fuelstack_core::models::User;
use fuelstack_core::{Email, UserId, UserRole};

/// Session-stored admin identity.
///
/// Admins are ordinary users with the admin role; the role is re-checked
/// against the database on every protected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: Option<String>,
    /// Role at login time.
    pub role: UserRole,
}

impl From<&User> for CurrentAdmin {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
