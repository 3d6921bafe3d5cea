//! Multilingual text.
//!
//! Product names and descriptions are stored as a JSONB object keyed by
//! locale code (`{"mn": "...", "en": "..."}`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Locales supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Mongolian (default).
    #[default]
    Mn,
    /// English.
    En,
}

impl Locale {
    /// The locale code used as the JSON key.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Mn => "mn",
            Self::En => "en",
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mn" => Ok(Self::Mn),
            "en" => Ok(Self::En),
            _ => Err(format!("unsupported locale: {s}")),
        }
    }
}

/// Text with one value per locale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    /// Create text with a single locale value.
    #[must_use]
    pub fn new(locale: Locale, text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(locale.code().to_owned(), text.into());
        Self(map)
    }

    /// Builder-style insert of another locale value.
    #[must_use]
    pub fn with(mut self, locale: Locale, text: impl Into<String>) -> Self {
        self.0.insert(locale.code().to_owned(), text.into());
        self
    }

    /// Get the text for `locale`, falling back to the default locale and then
    /// to any non-empty value.
    #[must_use]
    pub fn get(&self, locale: Locale) -> Option<&str> {
        self.non_empty(locale.code())
            .or_else(|| self.non_empty(Locale::default().code()))
            .or_else(|| {
                self.0
                    .values()
                    .find(|v| !v.trim().is_empty())
                    .map(String::as_str)
            })
    }

    /// Whether every locale value is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }

    fn non_empty(&self, code: &str) -> Option<&str> {
        self.0
            .get(code)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for LocalizedText {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <sqlx::types::Json<BTreeMap<String, String>> as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <sqlx::types::Json<BTreeMap<String, String>> as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for LocalizedText {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let sqlx::types::Json(map) =
            <sqlx::types::Json<BTreeMap<String, String>> as sqlx::Decode<sqlx::Postgres>>::decode(
                value,
            )?;
        Ok(Self(map))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for LocalizedText {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <sqlx::types::Json<&BTreeMap<String, String>> as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(
            &sqlx::types::Json(&self.0),
            buf,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_prefers_requested_locale() {
        let text = LocalizedText::new(Locale::Mn, "Уураг").with(Locale::En, "Protein");
        assert_eq!(text.get(Locale::En), Some("Protein"));
        assert_eq!(text.get(Locale::Mn), Some("Уураг"));
    }

    #[test]
    fn test_get_falls_back_to_default_locale() {
        let text = LocalizedText::new(Locale::Mn, "Уураг").with(Locale::En, "  ");
        assert_eq!(text.get(Locale::En), Some("Уураг"));
    }

    #[test]
    fn test_get_falls_back_to_any_value() {
        let text = LocalizedText::new(Locale::En, "Creatine");
        assert_eq!(text.get(Locale::Mn), Some("Creatine"));
        assert_eq!(LocalizedText::default().get(Locale::Mn), None);
    }

    #[test]
    fn test_json_shape() {
        let text = LocalizedText::new(Locale::En, "Whey");
        assert_eq!(serde_json::to_string(&text).unwrap(), r#"{"en":"Whey"}"#);
    }

    #[test]
    fn test_is_blank() {
        assert!(LocalizedText::default().is_blank());
        assert!(LocalizedText::new(Locale::Mn, " ").is_blank());
        assert!(!LocalizedText::new(Locale::Mn, "BCAA").is_blank());
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }
}
