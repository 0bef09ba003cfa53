//! Translation/OCR boundary.
//!
//! The actual pipeline (OCR + LLM translation) is an external collaborator;
//! the core only depends on this contract and must keep working when no
//! backend is configured, degrading to a clearly marked placeholder.

use crate::error::SourceResult;
use async_trait::async_trait;

/// Prompting domain for text translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDomain {
    Novel,
    FanFiction,
}

/// Result of translating a page image: OCR output plus its translation.
#[derive(Debug, Clone)]
pub struct ImageTranslation {
    pub extracted_text: String,
    pub translated_text: String,
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_text(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        domain: TextDomain,
    ) -> SourceResult<String>;

    async fn translate_image(
        &self,
        image: &[u8],
        source_lang: &str,
        target_lang: &str,
    ) -> SourceResult<ImageTranslation>;
}

/// Stand-in used when no translation backend is configured. Returns a
/// marked placeholder so the reader stays functional.
pub struct PlaceholderTranslator;

impl PlaceholderTranslator {
    fn placeholder(text: &str, target_lang: &str) -> String {
        let head: String = text.chars().take(100).collect();
        format!(
            "[Mock Translation ({})] {}... (Configure a translation backend for full translation)",
            target_lang, head
        )
    }
}

#[async_trait]
impl Translator for PlaceholderTranslator {
    async fn translate_text(
        &self,
        text: &str,
        _source_lang: &str,
        target_lang: &str,
        _domain: TextDomain,
    ) -> SourceResult<String> {
        log::warn!("no translation backend configured; returning placeholder");
        Ok(Self::placeholder(text, target_lang))
    }

    async fn translate_image(
        &self,
        _image: &[u8],
        _source_lang: &str,
        target_lang: &str,
    ) -> SourceResult<ImageTranslation> {
        log::warn!("no translation backend configured; returning placeholder");
        Ok(ImageTranslation {
            extracted_text: String::new(),
            translated_text: Self::placeholder("", target_lang),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_translator_never_fails() {
        let translator = PlaceholderTranslator;
        let out = translator
            .translate_text("こんにちは", "ja", "en", TextDomain::Novel)
            .await
            .unwrap();
        assert!(out.starts_with("[Mock Translation (en)]"));
        assert!(out.contains("こんにちは"));

        let image = translator.translate_image(&[0u8; 4], "ja", "en").await.unwrap();
        assert!(image.translated_text.starts_with("[Mock Translation (en)]"));
        assert!(image.extracted_text.is_empty());
    }

    #[tokio::test]
    async fn placeholder_truncates_long_input() {
        let translator = PlaceholderTranslator;
        let long = "a".repeat(500);
        let out = translator
            .translate_text(&long, "auto", "en", TextDomain::FanFiction)
            .await
            .unwrap();
        assert!(out.len() < 300);
    }
}
