//! Database operations for the shop `PostgreSQL` schema.
//!
//! # Schema: `shop`
//!
//! The storefront owns the schema; the admin binary reads and writes the same
//! tables.
//!
//! ## Tables
//!
//! - `user`, `address` - Accounts and saved addresses
//! - `category`, `brand`, `product`, `product_image` - Catalog
//! - `order`, `order_item` - Placed orders (snapshots)
//! - `review`, `comment`, `wishlist` - Customer interaction
//! - `blog_post`, `blog_category`, `blog_tag`, `blog_post_tag` - CMS
//! - `setting` - Store settings
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p fuelstack-cli -- migrate
//! ```

pub mod addresses;
pub mod blog;
pub mod catalog;
pub mod comments;
pub mod orders;
pub mod reviews;
pub mod settings;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// `ILIKE` pattern matching `q` anywhere, with `%`, `_` and `\` taken
/// literally. Blank search strings mean "no filter".
pub(crate) fn search_pattern(q: Option<&str>) -> Option<String> {
    let q = q.map(str::trim).filter(|q| !q.is_empty())?;
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

/// Page number and size for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    /// Highest page number; keeps `offset` far from overflow.
    pub const MAX_NUMBER: i64 = i32::MAX as i64;

    /// Clamp client-supplied paging to `1..=MAX_NUMBER` and `1..=max_size`.
    #[must_use]
    pub fn new(number: Option<i64>, size: Option<i64>, default_size: i64, max_size: i64) -> Self {
        Self {
            number: number.unwrap_or(1).clamp(1, Self::MAX_NUMBER),
            size: size.unwrap_or(default_size).clamp(1, max_size),
        }
    }

    /// Row offset for `OFFSET`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        assert_eq!(search_pattern(Some(" casein ")).as_deref(), Some("%casein%"));
        assert_eq!(search_pattern(Some("")), None);
        assert_eq!(search_pattern(Some("50%")).as_deref(), Some("%50\\%%"));
        assert_eq!(search_pattern(Some("bcaa_2")).as_deref(), Some("%bcaa\\_2%"));
    }

    #[test]
    fn test_page_clamps() {
        let page = Page::new(Some(0), Some(500), 24, 48);
        assert_eq!(page, Page { number: 1, size: 48 });
        assert_eq!(page.offset(), 0);

        let page = Page::new(Some(3), None, 24, 48);
        assert_eq!(page.size, 24);
        assert_eq!(page.offset(), 48);

        let page = Page::new(Some(i64::MAX), Some(48), 24, 48);
        assert_eq!(page.number, Page::MAX_NUMBER);
        assert_eq!(page.offset(), (Page::MAX_NUMBER - 1) * 48);
    }
}
