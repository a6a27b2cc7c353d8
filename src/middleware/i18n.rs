// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

// Idiomas com catálogo de mensagens; qualquer outro cai no padrão
const SUPPORTED: [&str; 2] = ["en", "pt"];
const DEFAULT_LANG: &str = "en";

// Extrator de idioma (a partir do Accept-Language)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    /// "pt-BR,en;q=0.8" -> "pt". Pega o primeiro idioma suportado na ordem de preferência.
    pub fn from_header(header_str: &str) -> Self {
        accept_language::parse(header_str)
            .iter()
            .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            .find(|lang| SUPPORTED.contains(&lang.as_str()))
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_first_supported_language() {
        assert_eq!(Locale::from_header("pt-BR,en;q=0.8").0, "pt");
        assert_eq!(Locale::from_header("de-DE,pt;q=0.5").0, "pt");
        assert_eq!(Locale::from_header("en-US").0, "en");
    }

    #[test]
    fn falls_back_to_english() {
        assert_eq!(Locale::from_header("fr-FR").0, "en");
        assert_eq!(Locale::from_header("").0, "en");
    }
}
