//! Authentication route handlers.
//!
//! Email/password accounts under `/api/auth` and Google sign-in under
//! `/auth/google`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use fuelstack_core::models::User;

use crate::db::users::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::{Json, Query};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::AuthService;
use crate::services::google::{find_or_create_user, generate_state};
use crate::state::AppState;

/// Path Google redirects back to.
pub(crate) const GOOGLE_CALLBACK_PATH: &str = "/auth/google/callback";

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Query parameters from the Google OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and log in.
///
/// # Route
///
/// `POST /api/auth/register`
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.password, body.name.as_deref())
        .await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Customer registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
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
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    start_session(&session, &user).await?;

    Ok(Json(user))
}

/// Log out. The cart stays in the session.
///
/// # Route
///
/// `POST /api/auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in user, or `null`.
///
/// # Route
///
/// `GET /api/auth/session`
#[instrument(skip(state, session, current))]
pub async fn current_session(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current): OptionalAuth,
) -> Result<Json<Option<User>>> {
    let Some(current) = current else {
        return Ok(Json(None));
    };

    let user = UserRepository::new(state.pool()).get_by_id(current.id).await?;
    if user.is_none() {
        // Account was deleted while logged in.
        clear_current_user(&session).await?;
    }

    Ok(Json(user))
}

/// Start Google sign-in.
///
/// # Route
///
/// `GET /auth/google/login`
#[instrument(skip(state, session))]
pub async fn google_login(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let google = state
        .google()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not enabled".to_string()))?;

    let oauth_state = generate_state();
    session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await?;

    let redirect_uri = state.config().url_for(GOOGLE_CALLBACK_PATH);
    Ok(Redirect::to(
        &google.authorization_url(&redirect_uri, &oauth_state),
    ))
}

/// Finish Google sign-in.
///
/// Every outcome redirects the browser back to the client: `/account` on
/// success, `/login?error=...` otherwise.
///
/// # Route
///
/// `GET /auth/google/callback`
#[instrument(skip(state, session, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let config = state.config();
    let fail = |reason: &str| {
        Redirect::to(&config.client_url_for(&format!("/login?error={reason}"))).into_response()
    };

    let Some(google) = state.google() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google sign-in denied");
        return fail("google_denied");
    }

    let stored_state: Option<String> = session
        .remove(session_keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();
    if stored_state.is_none() || stored_state != query.state {
        tracing::warn!("Google OAuth state mismatch");
        return fail("invalid_state");
    }

    let Some(code) = query.code else {
        tracing::warn!("Google OAuth callback missing code");
        return fail("missing_code");
    };

    let redirect_uri = config.url_for(GOOGLE_CALLBACK_PATH);
    let profile = match google.fetch_profile(&code, &redirect_uri).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(error = %e, "Google token exchange failed");
            return fail("token_exchange");
        }
    };

    let user = match find_or_create_user(state.pool(), &profile).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Google sign-in rejected");
            return fail("account");
        }
    };

    if let Err(e) = start_session(&session, &user).await {
        tracing::error!(error = %e, "Failed to store session after Google sign-in");
        return fail("session");
    }

    tracing::info!(user_id = %user.id, "Customer signed in with Google");
    Redirect::to(&config.client_url_for("/account")).into_response()
}
