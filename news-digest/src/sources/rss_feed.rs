use crate::parser::FeedParser;
use crate::traits::FeedReader;
use crate::types::{DigestError, FeedEntry, FeedSourceConfig, Result};
use crate::Fetcher;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Generic RSS/Atom reader backed by HTTP fetch + feed-rs parsing.
pub struct RssFeedReader {
    fetcher: Arc<Fetcher>,
}

impl RssFeedReader {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl FeedReader for RssFeedReader {
    fn reader_name(&self) -> String {
        "rss".to_string()
    }

    async fn read(&self, source: &FeedSourceConfig) -> Result<Vec<FeedEntry>> {
        info!("Pulling feed {}: {}", source.name, source.url);

        let content = self.fetcher.fetch_feed(&source.url).await?;

        let parsed = FeedParser::parse_feed(&content).map_err(|e| {
            let text = String::from_utf8_lossy(&content);
            if FeedParser::is_valid_feed_content(&text) {
                e
            } else {
                DigestError::Parse(format!("{} does not look like an RSS/Atom document", source.url))
            }
        })?;

        debug!(
            "Feed {} ({}) has {} entries",
            source.name,
            parsed.title.as_deref().unwrap_or("untitled"),
            parsed.entries.len()
        );

        Ok(parsed.entries.into_iter().take(source.max_items).collect())
    }
}
