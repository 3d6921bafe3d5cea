//! Store settings handlers.

use axum::extract::State;
use tracing::instrument;

use fuelstack_core::Email;
use fuelstack_core::models::{StoreSettings, StoreSettingsUpdate};

use crate::db::settings::{load_store_settings, save_store_settings};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const MAX_STORE_NAME: usize = 120;

/// Check an updated settings value before it is saved.
fn validate(settings: &StoreSettings) -> Result<()> {
    let name = settings.store_name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("store_name is required".to_string()));
    }
    if name.chars().count() > MAX_STORE_NAME {
        return Err(AppError::BadRequest(format!(
            "store_name must be at most {MAX_STORE_NAME} characters"
        )));
    }
    if let Some(email) = &settings.contact_email {
        Email::parse(email)
            .map_err(|e| AppError::BadRequest(format!("contact_email: {e}")))?;
    }
    Ok(())
}

/// Current store settings.
///
/// # Route
///
/// `GET /api/admin/settings`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<StoreSettings>> {
    Ok(Json(load_store_settings(state.pool()).await?))
}

/// Partially update store settings. Omitted fields keep their value.
///
/// # Route
///
/// `PUT /api/admin/settings`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<StoreSettingsUpdate>,
) -> Result<Json<StoreSettings>> {
    let mut settings = load_store_settings(state.pool()).await?;
    settings.apply(body);
    settings.store_name = settings.store_name.trim().to_owned();
    validate(&settings)?;

    save_store_settings(state.pool(), &settings).await?;
    tracing::info!("Store settings updated");

    Ok(Json(settings))
}
