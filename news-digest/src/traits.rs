use crate::types::{FeedEntry, FeedSourceConfig, Result};
use async_trait::async_trait;

/// Trait for pulling raw entries from one configured source.
#[async_trait]
pub trait FeedReader: Send + Sync {
    /// Human-readable name for this reader, used in logs
    fn reader_name(&self) -> String;

    /// Fetch and parse the source, returning at most `source.max_items`
    /// entries from the start of the feed in their original order.
    async fn read(&self, source: &FeedSourceConfig) -> Result<Vec<FeedEntry>>;
}

/// Translates short strings such as titles.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Body text and lead image pulled from an article page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub text: String,
    pub image: Option<String>,
}

impl ExtractedArticle {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Downloads a linked page and extracts its readable body.
#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle>;
}
