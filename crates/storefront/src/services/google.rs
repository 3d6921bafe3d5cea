//! Google sign-in (OAuth 2.0 authorization code flow).
//!
//! The login route stores a random `state` in the session and redirects to
//! Google; the callback checks it, exchanges the code for an access token and
//! reads the OpenID userinfo to find or create the local account.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use fuelstack_core::Email;
use fuelstack_core::models::User;

use crate::config::GoogleOAuthConfig;
use crate::db::RepositoryError;
use crate::db::users::UserRepository;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Length of the CSRF `state` parameter.
const STATE_LENGTH: usize = 32;

/// Errors from the Google sign-in flow.
#[derive(Debug, Error)]
pub enum GoogleError {
    /// HTTP request to Google failed.
    #[error("request to Google failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Google answered with a non-success status.
    #[error("Google returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The Google account has no usable email.
    #[error("Google account email is missing or unverified")]
    UnverifiedEmail,

    /// The email Google returned doesn't parse.
    #[error("invalid email from Google: {0}")]
    InvalidEmail(#[from] fuelstack_core::EmailError),

    /// Local account lookup or creation failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Profile returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Client for Google's OAuth endpoints.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
}

impl GoogleOAuthClient {
    /// Create a client from configured credentials.
    #[must_use]
    pub fn new(config: &GoogleOAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// URL to send the browser to.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state)
            .append_pair("prompt", "select_account")
            .finish();
        format!("{AUTHORIZE_URL}?{query}")
    }

    /// Exchange an authorization code and fetch the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `GoogleError::Http` or `GoogleError::Api` if either call fails.
    pub async fn fetch_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleUserInfo, GoogleError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        let token: TokenResponse = json_or_api_error(response).await?;

        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        json_or_api_error(response).await
    }
}

async fn json_or_api_error<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GoogleError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GoogleError::Api { status, body });
    }
    Ok(response.json().await?)
}

/// Generate a random `state` value for CSRF protection.
#[must_use]
pub fn generate_state() -> String {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Find the local account for a Google profile, creating one if needed.
///
/// Existing accounts (including password accounts with the same email) are
/// reused; missing name and avatar are filled in from Google. New accounts
/// are customers without a password.
///
/// # Errors
///
/// Returns `GoogleError::UnverifiedEmail` if Google didn't vouch for the email.
pub async fn find_or_create_user(
    pool: &PgPool,
    profile: &GoogleUserInfo,
) -> Result<User, GoogleError> {
    let raw_email = profile
        .email
        .as_deref()
        .filter(|_| profile.email_verified)
        .ok_or(GoogleError::UnverifiedEmail)?;
    let email = Email::parse(raw_email)?;
    let name = profile.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let avatar = profile.picture.as_deref();

    let users = UserRepository::new(pool);

    if let Some(user) = users.get_by_email(&email).await? {
        return Ok(users.fill_missing_profile(user.id, name, avatar).await?);
    }

    match users.create_from_google(&email, name, avatar).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Created account from Google sign-in");
            Ok(user)
        }
        // Lost a race with a concurrent sign-in for the same email.
        Err(RepositoryError::Conflict(_)) => users
            .get_by_email(&email)
            .await?
            .ok_or(GoogleError::Repository(RepositoryError::NotFound)),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(&GoogleOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: SecretString::from("shh"),
        })
    }

    #[test]
    fn test_authorization_url_carries_state_and_redirect() {
        let url = client().authorization_url("http://localhost:3000/auth/google/callback", "abc");
        let parsed = url::Url::parse(&url).unwrap();
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["state"], "abc");
        assert_eq!(
            pairs["redirect_uri"],
            "http://localhost:3000/auth/google/callback"
        );
        assert_eq!(pairs["scope"], "openid email profile");
        assert!(!url.contains("shh"));
    }

    #[test]
    fn test_generate_state() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_userinfo_defaults_unverified() {
        let info: GoogleUserInfo =
            serde_json::from_str(r#"{"sub":"1","email":"a@b.mn"}"#).unwrap();
        assert!(!info.email_verified);
    }
}
