//! Database operations for the back office.
//!
//! # Schema: `shop`
//!
//! The admin binary shares the storefront's schema and migrations
//! (`crates/storefront/migrations/`). Every write the shop owner makes goes
//! through the repositories here:
//!
//! - `users` - Accounts, roles and admin login lookups
//! - `products` - Products and their images
//! - `categories` - Product categories and brands
//! - `orders` - Order management and dashboard figures
//! - `blog` - Posts, blog categories and tags
//! - `reviews` - Review and comment moderation
//! - `settings` - Store settings

pub mod blog;
pub mod categories;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use blog::BlogRepository;
pub use categories::{BrandRepository, CategoryRepository};
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ModerationRepository;
pub use users::UserRepository;

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

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The row is still referenced and can't be deleted.
    #[error("cannot delete {entity} while it is in use")]
    InUse {
        entity: &'static str,
        /// JSON key the count is reported under, e.g. `products_count`.
        count_key: &'static str,
        count: i64,
    },
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

/// Map unique and foreign-key violations from a write to `Conflict`.
pub(crate) fn write_conflict(e: sqlx::Error, unique: &str, reference: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(reference.to_owned());
    }
    conflict_on_unique(e, unique)
}

/// Page number and size for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    /// Admin lists default to 20 rows and never return more than 100.
    pub const DEFAULT_SIZE: i64 = 20;
    pub const MAX_SIZE: i64 = 100;
    pub const MAX_NUMBER: i64 = i32::MAX as i64;

    /// Clamp client-supplied paging to `1..=MAX_NUMBER` and `1..=MAX_SIZE`.
    #[must_use]
    pub fn new(number: Option<i64>, size: Option<i64>) -> Self {
        Self {
            number: number.unwrap_or(1).clamp(1, Self::MAX_NUMBER),
            size: size.unwrap_or(Self::DEFAULT_SIZE).clamp(1, Self::MAX_SIZE),
        }
    }

    /// Row offset for `OFFSET`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }
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

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps() {
        assert_eq!(Page::new(None, None), Page { number: 1, size: 20 });
        assert_eq!(Page::new(Some(-4), Some(1_000)), Page { number: 1, size: 100 });
        assert_eq!(Page::new(Some(3), Some(10)).offset(), 20);

        let last = Page::new(Some(i64::MAX), Some(100));
        assert_eq!(last.number, Page::MAX_NUMBER);
        assert!(last.offset() > 0);
    }

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(Some("  whey ")).as_deref(), Some("%whey%"));
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("100%_pure")).as_deref(), Some("%100\\%\\_pure%"));
        assert_eq!(search_pattern(Some(r"a\b")).as_deref(), Some(r"%a\\b%"));
    }

    #[test]
    fn test_in_use_message() {
        let err = RepositoryError::InUse {
            entity: "category",
            count_key: "products_count",
            count: 3,
        };
        assert_eq!(err.to_string(), "cannot delete category while it is in use");
    }
}
