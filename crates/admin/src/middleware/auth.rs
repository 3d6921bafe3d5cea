//! Authentication extractors for admin.
//!
//! Every `/api/admin/*` handler takes [`RequireAdmin`]. The session only
//! identifies the user; the admin role is confirmed against the database on
//! each request so a demoted or deleted account loses access immediately.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use fuelstack_core::models::User;

use crate::db::UserRepository;
use crate::error::set_sentry_user;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when admin authentication is required.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// No session layer is installed on this route.
    MissingSession,
    /// No user in the session, or the user no longer exists.
    Unauthorized,
    /// Logged in, but not as an admin.
    Forbidden,
    /// The user lookup failed.
    Unavailable,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingSession | Self::Unavailable => {
                if self == Self::MissingSession {
                    tracing::error!("RequireAdmin used on a route without a session layer");
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Admin access required" })),
            )
                .into_response(),
        }
    }
}

/// Decide access from the session identity alone.
///
/// # Errors
///
/// `Unauthorized` without an identity, `Forbidden` for a non-admin one.
pub fn authorize(admin: Option<CurrentAdmin>) -> Result<CurrentAdmin, AdminAuthRejection> {
    let admin = admin.ok_or(AdminAuthRejection::Unauthorized)?;
    if !admin.role.is_admin() {
        return Err(AdminAuthRejection::Forbidden);
    }
    Ok(admin)
}

/// Re-check the session identity against the stored user.
///
/// # Errors
///
/// `Unauthorized` if the user is gone, `Forbidden` if they lost the role.
pub fn confirm(stored: Option<&User>) -> Result<CurrentAdmin, AdminAuthRejection> {
    let user = stored.ok_or(AdminAuthRejection::Unauthorized)?;
    if !user.role.is_admin() {
        return Err(AdminAuthRejection::Forbidden);
    }
    Ok(CurrentAdmin::from(user))
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::MissingSession)?;

        let admin = authorize(
            session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
        )?;

        let stored = UserRepository::new(state.pool())
            .get(admin.id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %admin.id, "Admin lookup failed");
                AdminAuthRejection::Unavailable
            })?;

        let admin = confirm(stored.as_ref())?;
        set_sentry_user(&admin.id, Some(admin.email.as_str()));

        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the session admin, without a database check.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Store the logged-in admin in the session.
///
/// The session ID is cycled first so a pre-login cookie can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// End the admin session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::Utc;
    use fuelstack_core::{Email, UserId, UserRole};

    fn admin(role: UserRole) -> CurrentAdmin {
        CurrentAdmin {
            id: UserId::new(1),
            email: Email::parse("owner@fuelstack.mn").unwrap(),
            name: Some("Owner".to_string()),
            role,
        }
    }

    fn user(role: UserRole, name: Option<&str>) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("owner@fuelstack.mn").unwrap(),
            password_hash: None,
            role,
            name: name.map(String::from),
            phone: None,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_authorize_without_session_is_unauthorized() {
        assert_eq!(authorize(None), Err(AdminAuthRejection::Unauthorized));
    }

    #[test]
    fn test_authorize_customer_is_forbidden() {
        assert_eq!(
            authorize(Some(admin(UserRole::Customer))),
            Err(AdminAuthRejection::Forbidden)
        );
    }

    #[test]
    fn test_authorize_admin() {
        assert_eq!(
            authorize(Some(admin(UserRole::Admin))),
            Ok(admin(UserRole::Admin))
        );
    }

    #[test]
    fn test_confirm_demoted_admin_is_forbidden() {
        let stored = user(UserRole::Customer, Some("Owner"));
        assert_eq!(
            confirm(Some(&stored)),
            Err(AdminAuthRejection::Forbidden)
        );
    }

    #[test]
    fn test_confirm_deleted_admin_is_unauthorized() {
        assert_eq!(
            confirm(None),
            Err(AdminAuthRejection::Unauthorized)
        );
    }

    #[test]
    fn test_confirm_uses_stored_profile() {
        let stored = user(UserRole::Admin, Some("Store Owner"));
        let confirmed = confirm(Some(&stored)).unwrap();
        assert_eq!(confirmed.name.as_deref(), Some("Store Owner"));
    }

    #[tokio::test]
    async fn test_rejection_bodies() {
        let response = AdminAuthRejection::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = AdminAuthRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
