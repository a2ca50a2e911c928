pub mod extract;
pub mod translate;

pub use extract::HtmlArticleExtractor;
pub use translate::GoogleTranslator;

use crate::traits::{ArticleExtractor, ExtractedArticle, Translator};
use crate::types::Enriched;
use tracing::{debug, warn};

/// Best-effort enrichment of feed entries. Nothing here ever returns an
/// error: failures come back as the unenriched value plus a warning.
pub struct ContentEnricher {
    translator: Option<Box<dyn Translator>>,
    extractor: Option<Box<dyn ArticleExtractor>>,
    target_language: String,
}

impl ContentEnricher {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            translator: None,
            extractor: None,
            target_language: target_language.into(),
        }
    }

    pub fn with_translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ArticleExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn extracts_full_text(&self) -> bool {
        self.extractor.is_some()
    }

    /// Returns `"<translated> (<original>)"`, or the original title when no
    /// translator is configured or translation fails.
    pub async fn translate_title(&self, title: &str) -> Enriched<String> {
        let Some(translator) = &self.translator else {
            return Enriched::degraded(title.to_string(), "no translator configured");
        };

        match translator.translate(title, &self.target_language).await {
            Ok(translated) => {
                let translated = translated.trim();
                if translated.is_empty() || translated == title.trim() {
                    debug!("Translation of {:?} was a no-op", title);
                    Enriched::ok(title.to_string())
                } else {
                    Enriched::ok(format!("{} ({})", translated, title))
                }
            }
            Err(e) => {
                warn!("Title translation failed for {:?}: {}", title, e);
                Enriched::degraded(title.to_string(), e.to_string())
            }
        }
    }

    /// Downloads the linked article. Empty body and no image on failure.
    pub async fn extract_article(&self, link: &str) -> Enriched<ExtractedArticle> {
        let Some(extractor) = &self.extractor else {
            return Enriched::ok(ExtractedArticle::empty());
        };

        match extractor.extract(link).await {
            Ok(article) => Enriched::ok(article),
            Err(e) => {
                warn!("Full-text extraction failed for {}: {}", link, e);
                Enriched::degraded(ExtractedArticle::empty(), e.to_string())
            }
        }
    }
}
