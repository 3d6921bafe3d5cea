//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use fuelstack_core::models::StoreSettings;

use crate::config::StorefrontConfig;
use crate::db::{RepositoryError, settings::load_store_settings};
use crate::services::google::GoogleOAuthClient;

/// How long store settings are served from memory before re-reading.
const SETTINGS_TTL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    settings: Cache<(), Arc<StoreSettings>>,
    google: Option<GoogleOAuthClient>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let settings = Cache::builder()
            .max_capacity(1)
            .time_to_live(SETTINGS_TTL)
            .build();
        let google = config.google.as_ref().map(GoogleOAuthClient::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                settings,
                google,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Google sign-in client, if configured.
    #[must_use]
    pub fn google(&self) -> Option<&GoogleOAuthClient> {
        self.inner.google.as_ref()
    }

    /// Current store settings.
    ///
    /// Admin edits become visible here within [`SETTINGS_TTL`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the settings can't be loaded.
    pub async fn settings(&self) -> Result<Arc<StoreSettings>, RepositoryError> {
        self.inner
            .settings
            .try_get_with((), async {
                load_store_settings(&self.inner.pool).await.map(Arc::new)
            })
            .await
            .map_err(|e| match Arc::try_unwrap(e) {
                Ok(err) => err,
                // Another caller is still holding the shared error.
                Err(shared) => RepositoryError::Database(sqlx::Error::Protocol(shared.to_string())),
            })
    }
}
