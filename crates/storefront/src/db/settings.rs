//! Store settings reads.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use fuelstack_core::models::StoreSettings;

use super::RepositoryError;

/// Load store settings, falling back to defaults for missing keys.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn load_store_settings(pool: &PgPool) -> Result<StoreSettings, RepositoryError> {
    let entries: Vec<(String, JsonValue)> = sqlx::query_as("SELECT key, value FROM shop.setting")
        .fetch_all(pool)
        .await?;

    Ok(StoreSettings::from_entries(entries))
}
