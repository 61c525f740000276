use std::collections::HashMap;

use serde::Deserialize;

/// Locale pair used to pick a translation out of a `LocalizedText`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale<'a> {
    pub preferred: &'a str,
    pub fallback: &'a str,
}

/// Text as sent by the API: either a `{locale: text}` map or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Translations(HashMap<String, String>),
}

impl LocalizedText {
    /// Preferred translation, else the fallback one.
    pub fn resolve(&self, locale: Locale<'_>) -> Option<String> {
        match self {
            LocalizedText::Plain(text) => Some(text.clone()),
            LocalizedText::Translations(map) => map
                .get(locale.preferred)
                .or_else(|| map.get(locale.fallback))
                .cloned(),
        }
    }
}

pub(crate) fn resolve(text: Option<LocalizedText>, locale: Locale<'_>) -> Option<String> {
    text.and_then(|t| t.resolve(locale))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FR: Locale<'static> = Locale {
        preferred: "fr",
        fallback: "en",
    };

    #[test]
    fn preferred_translation_wins() {
        let text: LocalizedText =
            serde_json::from_str(r#"{"en":"Sedan","fr":"Berline"}"#).unwrap();
        assert_eq!(text.resolve(FR).as_deref(), Some("Berline"));
    }

    #[test]
    fn falls_back_when_preferred_is_missing() {
        let text: LocalizedText = serde_json::from_str(r#"{"en":"Sedan"}"#).unwrap();
        assert_eq!(text.resolve(FR).as_deref(), Some("Sedan"));
    }

    #[test]
    fn unknown_locales_resolve_to_none() {
        let text: LocalizedText = serde_json::from_str(r#"{"de":"Limousine"}"#).unwrap();
        assert!(text.resolve(FR).is_none());
    }

    #[test]
    fn bare_strings_are_accepted() {
        let text: LocalizedText = serde_json::from_str(r#""Van""#).unwrap();
        assert_eq!(text.resolve(FR).as_deref(), Some("Van"));
    }
}
