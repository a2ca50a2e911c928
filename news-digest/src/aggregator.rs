use crate::enrich::ContentEnricher;
use crate::traits::FeedReader;
use crate::types::{FeedEntry, FeedSourceConfig, NewsItem};
use tracing::{info, warn};

/// Outcome of reading and enriching one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub items: usize,
    pub error: Option<String>,
    pub enrichment_warnings: usize,
}

impl SourceReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    pub items: Vec<NewsItem>,
    pub sources: Vec<SourceReport>,
}

impl AggregationReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.succeeded())
    }
}

pub struct NewsAggregator {
    sources: Vec<FeedSourceConfig>,
    reader: Box<dyn FeedReader>,
    enricher: ContentEnricher,
}

impl NewsAggregator {
    pub fn new(sources: Vec<FeedSourceConfig>, reader: Box<dyn FeedReader>, enricher: ContentEnricher) -> Self {
        Self {
            sources,
            reader,
            enricher,
        }
    }

    /// Reads every configured source in order. A failing source contributes
    /// nothing and never stops the ones after it.
    pub async fn aggregate(&self) -> AggregationReport {
        let mut report = AggregationReport::default();

        info!(
            "Fetching {} feeds with reader {}",
            self.sources.len(),
            self.reader.reader_name()
        );

        for source in &self.sources {
            let entries = match self.reader.read(source).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Failed to fetch {}: {}", source.name, e);
                    report.sources.push(SourceReport {
                        name: source.name.clone(),
                        items: 0,
                        error: Some(e.to_string()),
                        enrichment_warnings: 0,
                    });
                    continue;
                }
            };

            if entries.is_empty() {
                warn!("{} returned no entries", source.name);
            }

            let mut enrichment_warnings = 0;
            let mut kept = 0;
            for entry in entries.into_iter().take(source.max_items) {
                let (item, warnings) = self.enrich_entry(source, entry).await;
                enrichment_warnings += warnings;
                kept += 1;
                report.items.push(item);
            }

            info!("{}: kept {} items ({} enrichment warnings)", source.name, kept, enrichment_warnings);
            report.sources.push(SourceReport {
                name: source.name.clone(),
                items: kept,
                error: None,
                enrichment_warnings,
            });
        }

        info!(
            "Aggregated {} items from {}/{} sources",
            report.items.len(),
            report.sources.iter().filter(|s| s.succeeded()).count(),
            self.sources.len()
        );

        report
    }

    async fn enrich_entry(&self, source: &FeedSourceConfig, entry: FeedEntry) -> (NewsItem, usize) {
        let mut warnings = 0;

        let title = if source.translate {
            let translated = self.enricher.translate_title(&entry.title).await;
            if translated.is_degraded() {
                warnings += 1;
            }
            translated.value
        } else {
            entry.title.clone()
        };

        let article = self.enricher.extract_article(&entry.link).await;
        if article.is_degraded() {
            warnings += 1;
        }
        let article = article.value;

        let item = NewsItem {
            source: source.name.clone(),
            title,
            link: entry.link,
            summary: entry.summary.unwrap_or_default(),
            full_content: article.text,
            image: article.image.or(entry.image),
            published_at: entry.published_at,
        };

        (item, warnings)
    }
}
