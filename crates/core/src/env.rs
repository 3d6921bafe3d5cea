//! Environment variable readers shared by the servers and `fs-cli`.
//!
//! Each binary owns its variable names; this module owns the rules: empty
//! values count as unset, database URLs fall back to `DATABASE_URL`, and
//! session secrets must be long, random-looking and not a placeholder.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use secrecy::SecretString;

/// Shortest accepted session secret.
pub const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Shannon entropy floor for session secrets.
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Fragments of copy-pasted sample values (matched case-insensitively).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Fallback for `*_DATABASE_URL`, as set by `PostgreSQL` attach tooling.
pub const DATABASE_URL: &str = "DATABASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Missing environment variable: {0}")]
    Missing(String),
    #[error("Invalid environment variable {key}: {reason}")]
    Invalid { key: String, reason: String },
    #[error("Insecure secret in {key}: {reason}")]
    InsecureSecret { key: String, reason: String },
}

/// A variable that must be set and non-empty.
///
/// # Errors
///
/// Returns `EnvError::Missing` when unset or blank.
pub fn required(key: &str) -> Result<String, EnvError> {
    optional(key).ok_or_else(|| EnvError::Missing(key.to_owned()))
}

/// A variable that may be unset; blank counts as unset.
#[must_use]
pub fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a variable, using `default` when unset.
///
/// # Errors
///
/// Returns `EnvError::Invalid` when the value (or default) doesn't parse.
pub fn parse_or<T>(key: &str, default: &str) -> Result<T, EnvError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| default.to_owned());
    raw.trim().parse().map_err(|e: T::Err| EnvError::Invalid {
        key: key.to_owned(),
        reason: e.to_string(),
    })
}

/// The database URL from `primary`, falling back to [`DATABASE_URL`].
///
/// # Errors
///
/// Returns `EnvError::Missing` naming `primary` when neither is set.
pub fn database_url(primary: &str) -> Result<SecretString, EnvError> {
    optional(primary)
        .or_else(|| optional(DATABASE_URL))
        .map(SecretString::from)
        .ok_or_else(|| EnvError::Missing(primary.to_owned()))
}

/// A session signing secret that passes [`check_session_secret`].
///
/// # Errors
///
/// Returns `EnvError::Missing` when unset and `EnvError::InsecureSecret`
/// when too short, a placeholder, or too predictable.
pub fn session_secret(key: &str) -> Result<SecretString, EnvError> {
    let value = required(key)?;
    check_session_secret(&value).map_err(|reason| EnvError::InsecureSecret {
        key: key.to_owned(),
        reason,
    })?;
    Ok(SecretString::from(value))
}

/// Why a session secret is unacceptable, if it is.
///
/// # Errors
///
/// Returns a human-readable reason.
pub fn check_session_secret(value: &str) -> Result<(), String> {
    let length = value.chars().count();
    if length < MIN_SESSION_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
        ));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
#[must_use]
pub fn shannon_entropy(s: &str) -> f64 {
    let mut freq: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_default() += 1;
    }
    let total: u32 = freq.values().sum();
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    freq.values()
        .map(|&count| {
            let p = f64::from(count) / total;
            -p * p.log2()
        })
        .sum()
}

/// Sentry client settings, identical for both servers.
#[derive(Debug, Clone, PartialEq)]
pub struct SentrySettings {
    /// Tracking is off without a DSN.
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl Default for SentrySettings {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 1.0,
        }
    }
}

impl SentrySettings {
    /// Read `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE` and
    /// `SENTRY_TRACES_SAMPLE_RATE`. Unparseable rates fall back to 1.0.
    #[must_use]
    pub fn from_env() -> Self {
        let rate = |key: &str| {
            optional(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1.0)
        };
        Self {
            dsn: optional("SENTRY_DSN"),
            environment: optional("SENTRY_ENVIRONMENT"),
            sample_rate: rate("SENTRY_SAMPLE_RATE"),
            traces_sample_rate: rate("SENTRY_TRACES_SAMPLE_RATE"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("aaaaaaa").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_session_secret_rules() {
        assert!(check_session_secret("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q").is_ok());

        let short = check_session_secret("aB3$xY9!").unwrap_err();
        assert!(short.contains("at least 32"), "{short}");

        let placeholder = check_session_secret("changeme-changeme-changeme-changeme").unwrap_err();
        assert!(placeholder.contains("changeme"), "{placeholder}");

        let repetitive = check_session_secret(&"ab".repeat(20)).unwrap_err();
        assert!(repetitive.contains("entropy"), "{repetitive}");
    }

    #[test]
    fn test_length_counts_characters() {
        // 16 two-byte characters are not 32 characters
        assert!(check_session_secret(&"ж".repeat(16)).is_err());
    }

    #[test]
    fn test_missing_variables() {
        let key = "FUELSTACK_TEST_SURELY_UNSET_VARIABLE";
        assert!(optional(key).is_none());
        assert!(matches!(required(key), Err(EnvError::Missing(k)) if k == key));
        assert_eq!(parse_or::<u16>(key, "3000").unwrap(), 3000);
        assert!(matches!(
            parse_or::<u16>(key, "not-a-port"),
            Err(EnvError::Invalid { .. })
        ));
    }

    #[test]
    fn test_sentry_defaults() {
        let settings = SentrySettings::default();
        assert!(settings.dsn.is_none());
        assert!((settings.sample_rate - 1.0).abs() < f32::EPSILON);
    }
}
