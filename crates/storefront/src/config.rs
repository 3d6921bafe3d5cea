//! Storefront configuration from the environment.
//!
//! | variable | |
//! |----------|---|
//! | `STOREFRONT_DATABASE_URL` | required, falls back to `DATABASE_URL` |
//! | `STOREFRONT_BASE_URL` | required, public URL of this API |
//! | `STOREFRONT_SESSION_SECRET` | required, 32+ random characters |
//! | `STOREFRONT_HOST` / `STOREFRONT_PORT` | default `127.0.0.1:3000` |
//! | `STOREFRONT_CORS_ORIGIN` | browser client origin, when served elsewhere |
//! | `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` | Google sign-in, both or neither |
//! | `SENTRY_*` | see [`SentrySettings::from_env`] |

use std::net::{IpAddr, SocketAddr};

use fuelstack_core::env::{self, EnvError, SentrySettings};
use secrecy::SecretString;

/// Storefront settings. `Debug` output never shows the secrets.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL; `https` turns on secure cookies.
    pub base_url: String,
    pub session_secret: SecretString,
    /// Browser client origin allowed by CORS
    pub cors_origin: Option<String>,
    /// Google sign-in, disabled when absent
    pub google: Option<GoogleOAuthConfig>,
    pub sentry: SentrySettings,
}

/// Google OAuth client credentials.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Read the configuration, honouring a `.env` file when present.
    ///
    /// # Errors
    ///
    /// Returns `EnvError` for missing or malformed variables, a weak session
    /// secret, or only half of the Google credentials.
    pub fn from_env() -> Result<Self, EnvError> {
        dotenvy::dotenv().ok();

        let base_url = env::required("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| EnvError::Invalid {
            key: "STOREFRONT_BASE_URL".to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            database_url: env::database_url("STOREFRONT_DATABASE_URL")?,
            host: env::parse_or("STOREFRONT_HOST", "127.0.0.1")?,
            port: env::parse_or("STOREFRONT_PORT", "3000")?,
            base_url,
            session_secret: env::session_secret("STOREFRONT_SESSION_SECRET")?,
            cors_origin: env::optional("STOREFRONT_CORS_ORIGIN"),
            google: GoogleOAuthConfig::from_parts(
                env::optional("GOOGLE_CLIENT_ID"),
                env::optional("GOOGLE_CLIENT_SECRET"),
            )?,
            sentry: SentrySettings::from_env(),
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute URL for a path on this API.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Absolute URL for a page of the browser client.
    ///
    /// The client is served from the CORS origin when one is configured,
    /// otherwise from the API's own base URL.
    #[must_use]
    pub fn client_url_for(&self, path: &str) -> String {
        let origin = self.cors_origin.as_deref().unwrap_or(&self.base_url);
        format!("{}{path}", origin.trim_end_matches('/'))
    }
}

impl GoogleOAuthConfig {
    /// Both values enable Google sign-in; neither disables it.
    fn from_parts(
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Result<Option<Self>, EnvError> {
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Some(Self {
                client_id,
                client_secret: SecretString::from(client_secret),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(EnvError::Missing("GOOGLE_CLIENT_SECRET".to_owned())),
            (None, Some(_)) => Err(EnvError::Missing("GOOGLE_CLIENT_ID".to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration for router tests.
    pub(crate) fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/fuelstack_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            cors_origin: None,
            google: Some(GoogleOAuthConfig {
                client_id: "google-client-id".to_string(),
                client_secret: SecretString::from("google-client-secret-value"),
            }),
            sentry: SentrySettings::default(),
        }
    }

    #[test]
    fn test_google_credentials_come_in_pairs() {
        assert!(GoogleOAuthConfig::from_parts(None, None).unwrap().is_none());
        assert!(
            GoogleOAuthConfig::from_parts(Some("id".into()), Some("shh".into()))
                .unwrap()
                .is_some()
        );
        assert!(matches!(
            GoogleOAuthConfig::from_parts(Some("id".into()), None),
            Err(EnvError::Missing(key)) if key == "GOOGLE_CLIENT_SECRET"
        ));
        assert!(matches!(
            GoogleOAuthConfig::from_parts(None, Some("shh".into())),
            Err(EnvError::Missing(key)) if key == "GOOGLE_CLIENT_ID"
        ));
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_url_for_and_https() {
        let mut config = test_config();
        config.base_url = "https://fuelstack.mn/".to_string();
        assert!(config.is_https());
        assert_eq!(
            config.url_for("/auth/google/callback"),
            "https://fuelstack.mn/auth/google/callback"
        );
    }

    #[test]
    fn test_client_url_prefers_cors_origin() {
        let mut config = test_config();
        assert_eq!(
            config.client_url_for("/account"),
            "http://localhost:3000/account"
        );
        config.cors_origin = Some("https://shop.fuelstack.mn".to_string());
        assert_eq!(
            config.client_url_for("/account"),
            "https://shop.fuelstack.mn/account"
        );
    }

    #[test]
    fn test_google_config_debug_redacts_secret() {
        let config = GoogleOAuthConfig {
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
    }
}
