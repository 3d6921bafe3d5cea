//! Database migration command.
//!
//! Storefront and admin share one schema (`shop`); its migrations live in
//! `crates/storefront/migrations/` and are embedded at compile time.
//!
//! ```bash
//! fs-cli migrate
//! ```

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
