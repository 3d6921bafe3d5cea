//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use fuelstack_core::env;
use sqlx::PgPool;

/// Connect to the shop database named by `STOREFRONT_DATABASE_URL` (or
/// `DATABASE_URL`).
///
/// # Errors
///
/// Returns an error if the URL is missing or the connection fails.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let url = env::database_url("STOREFRONT_DATABASE_URL")?;
    tracing::info!("Connecting to database...");
    Ok(fuelstack_admin::db::create_pool(&url).await?)
}
