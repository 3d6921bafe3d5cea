//! Request body checks shared by the admin handlers.
//!
//! Each helper turns bad input into `AppError::BadRequest` naming the field.

use fuelstack_core::{Locale, LocalizedText, Slug, slugify};

use crate::error::{AppError, Result};

/// A trimmed, non-empty string of at most `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_owned())
}

/// A trimmed string of at most `max` characters; blank means absent.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    if value.is_some_and(|v| v.chars().count() > max) {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.map(str::to_owned))
}

/// Use the given slug, or derive one from the display name.
///
/// Names with no Latin letters or digits can't produce a slug, so those need
/// an explicit one.
pub fn resolve_slug(explicit: Option<&str>, name: &str) -> Result<Slug> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => Slug::parse(slug).map_err(|e| AppError::BadRequest(format!("slug: {e}"))),
        None => slugify(name).ok_or_else(|| {
            AppError::BadRequest("slug is required when the name has no Latin characters".into())
        }),
    }
}

/// Like [`resolve_slug`], deriving from the English name first, then Mongolian.
pub fn resolve_localized_slug(explicit: Option<&str>, name: &LocalizedText) -> Result<Slug> {
    if explicit.is_some_and(|s| !s.trim().is_empty()) {
        return resolve_slug(explicit, "");
    }
    [Locale::En, Locale::Mn]
        .into_iter()
        .filter_map(|locale| name.get(locale))
        .find_map(slugify)
        .ok_or_else(|| {
            AppError::BadRequest("slug is required when the name has no Latin characters".into())
        })
}

/// Localized text with at least one non-blank value.
pub fn required_localized(field: &str, value: LocalizedText) -> Result<LocalizedText> {
    if value.is_blank() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value)
}

/// An absolute `http(s)` URL.
pub fn http_url(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(value.to_owned()),
        _ => Err(AppError::BadRequest(format!("{field} must be an http(s) URL"))),
    }
}

/// An optional absolute `http(s)` URL; blank means absent.
pub fn optional_url(field: &str, value: Option<&str>) -> Result<Option<String>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| http_url(field, v))
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims_and_limits() {
        assert_eq!(required_text("name", "  Whey  ", 10).unwrap(), "Whey");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        assert_eq!(optional_text("excerpt", Some("  "), 10).unwrap(), None);
        assert_eq!(
            optional_text("excerpt", Some(" hi "), 10).unwrap().as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn test_resolve_slug_prefers_explicit() {
        assert_eq!(
            resolve_slug(Some("whey-gold"), "Anything").unwrap().as_str(),
            "whey-gold"
        );
        assert!(resolve_slug(Some("Whey Gold"), "Anything").is_err());
        assert_eq!(
            resolve_slug(None, "Optimum Nutrition").unwrap().as_str(),
            "optimum-nutrition"
        );
    }

    #[test]
    fn test_resolve_slug_cyrillic_needs_explicit() {
        let err = resolve_slug(None, "Уураг").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_resolve_localized_slug_uses_english_first() {
        let name = LocalizedText::new(Locale::Mn, "Креатин 300г").with(Locale::En, "Creatine 300g");
        assert_eq!(
            resolve_localized_slug(None, &name).unwrap().as_str(),
            "creatine-300g"
        );

        let mn_only = LocalizedText::new(Locale::Mn, "Уураг");
        assert!(resolve_localized_slug(None, &mn_only).is_err());
        assert_eq!(
            resolve_localized_slug(Some("uurag"), &mn_only).unwrap().as_str(),
            "uurag"
        );
    }

    #[test]
    fn test_http_url() {
        assert!(http_url("url", "https://cdn.fuelstack.mn/a.jpg").is_ok());
        assert!(http_url("url", "javascript:alert(1)").is_err());
        assert!(http_url("url", "/relative.jpg").is_err());
        assert_eq!(optional_url("logo_url", Some(" ")).unwrap(), None);
    }
}
