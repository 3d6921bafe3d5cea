//! Customer and admin account handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use fuelstack_core::models::User;
use fuelstack_core::{UserId, UserRole};

use crate::db::{Page, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::CurrentAdmin;
use crate::routes::Paginated;
use crate::state::AppState;

/// Query parameters for the user list.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub q: Option<String>,
    pub role: Option<UserRole>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Body of `PUT /api/admin/users/{id}/role`.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

/// Admins can't lock themselves out.
fn guard_self(admin: &CurrentAdmin, target: UserId, action: &str) -> Result<()> {
    if admin.id == target {
        return Err(AppError::BadRequest(format!("You cannot {action} your own account")));
    }
    Ok(())
}

/// Users, newest first.
///
/// # Route
///
/// `GET /api/admin/users`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Paginated<User>>> {
    let page = Page::new(query.page, query.per_page);
    let (users, total) = UserRepository::new(state.pool())
        .list(query.q.as_deref(), query.role, page)
        .await?;

    Ok(Json(Paginated::new(users, total, page)))
}

/// # Route
///
/// `GET /api/admin/users/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    UserRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Change a user's role. Admins can't demote themselves.
///
/// # Route
///
/// `PUT /api/admin/users/{id}/role`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, role = %body.role))]
pub async fn update_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<RoleRequest>,
) -> Result<Json<User>> {
    if !body.role.is_admin() {
        guard_self(&admin, id, "demote")?;
    }

    let user = UserRepository::new(state.pool())
        .set_role(id, body.role)
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User role changed");
    Ok(Json(user))
}

/// Delete a user. Admins can't delete themselves.
///
/// # Route
///
/// `DELETE /api/admin/users/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    guard_self(&admin, id, "delete")?;

    UserRepository::new(state.pool()).delete(id).await?;
    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fuelstack_core::Email;

    fn admin() -> CurrentAdmin {
        CurrentAdmin {
            id: UserId::new(7),
            email: Email::parse("owner@fuelstack.mn").unwrap(),
            name: None,
            role: UserRole::Admin,
        }
    }

    #[test]
    fn test_guard_self_blocks_own_account() {
        let err = guard_self(&admin(), UserId::new(7), "delete").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("delete")));
    }

    #[test]
    fn test_guard_self_allows_others() {
        assert!(guard_self(&admin(), UserId::new(8), "demote").is_ok());
    }

    #[test]
    fn test_role_request_parses() {
        let request: RoleRequest = serde_json::from_str(r#"{"role":"admin"}"#).unwrap();
        assert_eq!(request.role, UserRole::Admin);
        assert!(serde_json::from_str::<RoleRequest>(r#"{"role":"owner"}"#).is_err());
    }
}
