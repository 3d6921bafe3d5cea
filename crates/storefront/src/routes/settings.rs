//! Public store settings.

use axum::extract::State;
use tracing::instrument;

use fuelstack_core::models::StoreSettings;

use crate::error::Result;
use crate::extract::Json;
use crate::state::AppState;

/// Store name, contact details and shipping rules.
///
/// # Route
///
/// `GET /api/settings`
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<StoreSettings>> {
    let settings = state.settings().await?;
    Ok(Json(StoreSettings::clone(&settings)))
}
