//! URL slugs.
//!
//! Products, categories, brands and blog content are addressed by slug rather
//! than by a separate SKU. Slugs are unique per table (enforced by the
//! database) and restricted to `[a-z0-9-]`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9-]`.
    #[error("slug contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// The input starts or ends with a hyphen, or contains `--`.
    #[error("slug has misplaced hyphens")]
    MisplacedHyphen,
}

/// A validated URL slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length.
    pub const MAX_LENGTH: usize = 120;

    /// Parse a slug.
    ///
    /// # Errors
    ///
    /// Returns a [`SlugError`] if the input is empty, too long, contains
    /// characters outside `[a-z0-9-]`, or has leading, trailing or doubled
    /// hyphens.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SlugError::InvalidCharacter(c));
        }
        if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::MisplacedHyphen);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive a slug from free text.
///
/// ASCII letters and digits are kept (lowercased), every other run of
/// characters collapses into a single hyphen. Returns `None` when nothing
/// usable remains (e.g. a name written only in Cyrillic), in which case the
/// caller must supply an explicit slug.
#[must_use]
pub fn slugify(text: &str) -> Option<Slug> {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if out.len() >= Slug::MAX_LENGTH {
            break;
        }
    }

    let trimmed = out.trim_end_matches('-');
    let truncated: String = trimmed.chars().take(Slug::MAX_LENGTH).collect();
    Slug::parse(truncated.trim_end_matches('-')).ok()
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Slug::parse("whey-protein-2kg").is_ok());
        assert!(Slug::parse("bcaa").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(
            Slug::parse("Whey"),
            Err(SlugError::InvalidCharacter('W'))
        );
        assert_eq!(Slug::parse("-whey"), Err(SlugError::MisplacedHyphen));
        assert_eq!(Slug::parse("whey--gold"), Err(SlugError::MisplacedHyphen));
        assert!(matches!(
            Slug::parse(&"a".repeat(121)),
            Err(SlugError::TooLong { .. })
        ));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Gold Standard 100% Whey (2.27kg)").unwrap().as_str(),
            "gold-standard-100-whey-2-27kg"
        );
        assert_eq!(slugify("  Pre-Workout!! ").unwrap().as_str(), "pre-workout");
    }

    #[test]
    fn test_slugify_non_ascii_only() {
        assert!(slugify("Уураг").is_none());
        assert_eq!(slugify("Уураг Whey").unwrap().as_str(), "whey");
    }

    #[test]
    fn test_serde_validates() {
        assert!(serde_json::from_str::<Slug>("\"Bad Slug\"").is_err());
        let slug: Slug = serde_json::from_str("\"creatine\"").unwrap();
        assert_eq!(slug.as_str(), "creatine");
    }
}
