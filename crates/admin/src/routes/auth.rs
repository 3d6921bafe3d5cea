//! Back-office login.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use fuelstack_core::models::User;

use crate::db::UserRepository;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::Json;
use crate::middleware::{OptionalAdmin, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Log in as an admin.
///
/// # Route
///
/// `POST /api/auth/login`
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AdminAuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    set_current_admin(&session, &CurrentAdmin::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Admin logged in");

    Ok(Json(user))
}

/// End the admin session.
///
/// # Route
///
/// `POST /api/auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in admin, or `null` when there is none or the account has
/// since lost the admin role.
///
/// # Route
///
/// `GET /api/auth/session`
#[instrument(skip(state, session, current))]
pub async fn current_session(
    State(state): State<AppState>,
    session: Session,
    OptionalAdmin(current): OptionalAdmin,
) -> Result<Json<Option<User>>> {
    let Some(current) = current else {
        return Ok(Json(None));
    };

    let user = UserRepository::new(state.pool())
        .get(current.id)
        .await?
        .filter(|user| user.role.is_admin());
    if user.is_none() {
        clear_current_admin(&session).await?;
    }

    Ok(Json(user))
}
