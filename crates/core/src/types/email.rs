//! Customer and admin email addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string isn't an acceptable email address.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    #[error("email must contain a single @ symbol")]
    MultipleAtSymbols,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain cannot be empty")]
    EmptyDomain,
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A normalised email address: trimmed, lowercased, `local@domain`.
///
/// Accounts are looked up by email and `shop.user` has a unique index on
/// `LOWER(email)`, so two spellings of one address always compare equal.
///
/// ```
/// use fuelstack_core::Email;
///
/// let email = Email::parse(" Bat@FuelStack.MN ").unwrap();
/// assert_eq!(email.as_str(), "bat@fuelstack.mn");
/// assert!(Email::parse("bat@fuelstack@mn").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate and normalise an address.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first rule the input breaks.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = trimmed.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::MultipleAtSymbols);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
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
    fn test_accepts_common_shapes() {
        for raw in [
            "bat@fuelstack.mn",
            "bat.erdene+orders@gmail.com",
            "a@b.c",
            "coach@mail.sub.example.mn",
        ] {
            assert!(Email::parse(raw).is_ok(), "{raw}");
        }
    }

    #[test]
    fn test_normalises_case_and_whitespace() {
        let email = Email::parse("  Athlete@FuelStack.MN ").unwrap();
        assert_eq!(email.as_str(), "athlete@fuelstack.mn");
        assert_eq!(email.domain(), "fuelstack.mn");
        assert_eq!(email, "ATHLETE@fuelstack.mn".parse().unwrap());
    }

    #[test]
    fn test_rejections() {
        let cases = [
            ("", EmailError::Empty),
            ("   ", EmailError::Empty),
            ("no-at-symbol", EmailError::MissingAtSymbol),
            ("a@b@c.mn", EmailError::MultipleAtSymbols),
            ("@fuelstack.mn", EmailError::EmptyLocalPart),
            ("bat@", EmailError::EmptyDomain),
            ("bat erdene@fuelstack.mn", EmailError::Whitespace),
        ];
        for (raw, expected) in cases {
            assert_eq!(Email::parse(raw).unwrap_err(), expected, "{raw:?}");
        }

        let long = format!("{}@fuelstack.mn", "a".repeat(250));
        assert_eq!(
            Email::parse(&long).unwrap_err(),
            EmailError::TooLong { max: 254 }
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let email: Email = serde_json::from_str("\"Owner@FuelStack.mn\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"owner@fuelstack.mn\"");
        assert!(serde_json::from_str::<Email>("\"owner\"").is_err());
    }
}
