//! Store settings storage.
//!
//! One JSON value per key in `shop.setting`. The storefront caches these for
//! up to a minute, so saved changes reach it within that window.

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

/// Write every setting key in one transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a write fails; nothing is saved.
pub async fn save_store_settings(
    pool: &PgPool,
    settings: &StoreSettings,
) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await?;

    for (key, value) in settings.to_entries() {
        sqlx::query(
            r"
            INSERT INTO shop.setting (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(&value)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
