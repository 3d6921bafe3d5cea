//! Back-office configuration from the environment.
//!
//! | variable | |
//! |----------|---|
//! | `ADMIN_DATABASE_URL` | required, falls back to `DATABASE_URL` |
//! | `ADMIN_BASE_URL` | required, public URL of this API |
//! | `ADMIN_SESSION_SECRET` | required, 32+ random characters |
//! | `ADMIN_HOST` / `ADMIN_PORT` | default `127.0.0.1:3001` |
//! | `SENTRY_*` | see [`SentrySettings::from_env`] |

use std::net::{IpAddr, SocketAddr};

use fuelstack_core::env::{self, EnvError, SentrySettings};
use secrecy::SecretString;

/// Back-office settings. `Debug` output never shows the secrets.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL; `https` turns on secure cookies.
    pub base_url: String,
    pub session_secret: SecretString,
    pub sentry: SentrySettings,
}

impl AdminConfig {
    /// Read the configuration, honouring a `.env` file when present.
    ///
    /// # Errors
    ///
    /// Returns `EnvError` for missing or malformed variables and for a weak
    /// session secret.
    pub fn from_env() -> Result<Self, EnvError> {
        dotenvy::dotenv().ok();

        let base_url = env::required("ADMIN_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| EnvError::Invalid {
            key: "ADMIN_BASE_URL".to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            database_url: env::database_url("ADMIN_DATABASE_URL")?,
            host: env::parse_or("ADMIN_HOST", "127.0.0.1")?,
            port: env::parse_or("ADMIN_PORT", "3001")?,
            base_url,
            session_secret: env::session_secret("ADMIN_SESSION_SECRET")?,
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
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration for router tests.
    pub(crate) fn test_config() -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/fuelstack_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            sentry: SentrySettings::default(),
        }
    }

    #[test]
    fn test_socket_addr_and_https() {
        let mut config = test_config();
        assert_eq!(config.socket_addr().port(), 3001);
        assert!(!config.is_https());
        config.base_url = "https://admin.fuelstack.mn".to_string();
        assert!(config.is_https());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", test_config());
        assert!(!debug.contains("fuelstack_test"));
        assert!(!debug.contains(&"x".repeat(32)));
    }
}
