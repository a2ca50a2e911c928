use async_trait::async_trait;
use news_digest::enrich::ContentEnricher;
use news_digest::traits::{ArticleExtractor, ExtractedArticle, FeedReader, Translator};
use news_digest::types::*;
use news_digest::NewsAggregator;
use std::collections::HashMap;
use tracing::info;

/// Serves canned entries per source URL; unknown URLs fail.
struct StaticReader {
    feeds: HashMap<String, Vec<FeedEntry>>,
}

impl StaticReader {
    fn new() -> Self {
        Self { feeds: HashMap::new() }
    }

    fn with_feed(mut self, url: &str, count: usize) -> Self {
        let entries = (1..=count)
            .map(|n| FeedEntry::new(format!("{} story {}", url, n), format!("{}/story/{}", url, n)).with_summary("summary"))
            .collect();
        self.feeds.insert(url.to_string(), entries);
        self
    }
}

#[async_trait]
impl FeedReader for StaticReader {
    fn reader_name(&self) -> String {
        "static".to_string()
    }

    async fn read(&self, source: &FeedSourceConfig) -> Result<Vec<FeedEntry>> {
        self.feeds
            .get(&source.url)
            .cloned()
            .ok_or_else(|| DigestError::Parse(format!("no such feed {}", source.url)))
    }
}

struct UppercaseTranslator;

#[async_trait]
impl Translator for UppercaseTranslator {
    async fn translate(&self, text: &str, _target_language: &str) -> Result<String> {
        Ok(text.to_uppercase())
    }
}

struct BrokenTranslator;

#[async_trait]
impl Translator for BrokenTranslator {
    async fn translate(&self, _text: &str, _target_language: &str) -> Result<String> {
        Err(DigestError::Translation("service unavailable".to_string()))
    }
}

struct FixedExtractor;

#[async_trait]
impl ArticleExtractor for FixedExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle> {
        if url.contains("/story/2") {
            return Err(DigestError::Extraction("paywall".to_string()));
        }
        Ok(ExtractedArticle {
            text: format!("Full body of {}", url),
            image: Some("https://img.example.com/cover.png".to_string()),
        })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

#[tokio::test]
async fn test_output_never_exceeds_source_caps() -> Result<()> {
    init_tracing();

    let reader = StaticReader::new()
        .with_feed("https://a.example.com/rss", 10)
        .with_feed("https://b.example.com/rss", 1);
    let sources = vec![
        FeedSourceConfig::new("A", "https://a.example.com/rss", 3),
        FeedSourceConfig::new("B", "https://b.example.com/rss", 3),
        FeedSourceConfig::new("C", "https://c.example.com/rss", 0),
    ];
    let cap: usize = sources.iter().map(|s| s.max_items).sum();

    let aggregator = NewsAggregator::new(sources, Box::new(reader), ContentEnricher::new("zh-CN"));
    let report = aggregator.aggregate().await;

    info!("Aggregated {} items", report.items.len());
    assert!(report.items.len() <= cap);
    assert_eq!(report.items.len(), 4);

    // Source order, then feed order.
    let links: Vec<&str> = report.items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://a.example.com/rss/story/1",
            "https://a.example.com/rss/story/2",
            "https://a.example.com/rss/story/3",
            "https://b.example.com/rss/story/1",
        ]
    );
    assert!(report.items.iter().all(|i| i.full_content.is_empty()));

    Ok(())
}

#[tokio::test]
async fn test_failing_source_is_isolated() -> Result<()> {
    init_tracing();

    let reader = StaticReader::new()
        .with_feed("https://a.example.com/rss", 2)
        .with_feed("https://c.example.com/rss", 2);
    let sources = vec![
        FeedSourceConfig::new("A", "https://a.example.com/rss", 5),
        FeedSourceConfig::new("Broken", "https://broken.example.com/rss", 5),
        FeedSourceConfig::new("C", "https://c.example.com/rss", 5),
    ];

    let aggregator = NewsAggregator::new(sources, Box::new(reader), ContentEnricher::new("zh-CN"));
    let report = aggregator.aggregate().await;

    assert_eq!(report.items.len(), 4);
    assert!(report.items.iter().all(|i| i.source != "Broken"));

    let failed: Vec<&str> = report.failed_sources().map(|s| s.name.as_str()).collect();
    assert_eq!(failed, vec!["Broken"]);
    assert_eq!(report.sources.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_translated_title_keeps_original() -> Result<()> {
    init_tracing();

    let reader = StaticReader::new()
        .with_feed("https://hn.example.com/rss", 1)
        .with_feed("https://local.example.com/rss", 1);
    let sources = vec![
        FeedSourceConfig::new("HN", "https://hn.example.com/rss", 3).with_translation(),
        FeedSourceConfig::new("Local", "https://local.example.com/rss", 3),
    ];
    let enricher = ContentEnricher::new("zh-CN").with_translator(Box::new(UppercaseTranslator));

    let aggregator = NewsAggregator::new(sources, Box::new(reader), enricher);
    let report = aggregator.aggregate().await;

    assert_eq!(
        report.items[0].title,
        "HTTPS://HN.EXAMPLE.COM/RSS STORY 1 (https://hn.example.com/rss story 1)"
    );
    // Sources without the flag are left alone.
    assert_eq!(report.items[1].title, "https://local.example.com/rss story 1");

    Ok(())
}

#[tokio::test]
async fn test_translation_failure_keeps_title() -> Result<()> {
    let enricher = ContentEnricher::new("zh-CN").with_translator(Box::new(BrokenTranslator));

    let translated = enricher.translate_title("Rust 2.0 released").await;
    assert_eq!(translated.value, "Rust 2.0 released");
    assert!(translated.is_degraded());

    let identity = ContentEnricher::new("zh-CN")
        .with_translator(Box::new(UppercaseTranslator))
        .translate_title("ABC")
        .await;
    assert_eq!(identity.value, "ABC");
    assert!(!identity.is_degraded());

    Ok(())
}

#[tokio::test]
async fn test_extraction_fills_content_and_image() -> Result<()> {
    init_tracing();

    let reader = StaticReader::new().with_feed("https://a.example.com/rss", 3);
    let sources = vec![FeedSourceConfig::new("A", "https://a.example.com/rss", 3)];
    let enricher = ContentEnricher::new("zh-CN").with_extractor(Box::new(FixedExtractor));
    assert!(enricher.extracts_full_text());

    let aggregator = NewsAggregator::new(sources, Box::new(reader), enricher);
    let report = aggregator.aggregate().await;

    assert_eq!(report.items.len(), 3);
    assert_eq!(report.items[0].full_content, "Full body of https://a.example.com/rss/story/1");
    assert_eq!(report.items[0].image.as_deref(), Some("https://img.example.com/cover.png"));

    // A failed extraction leaves the item in place with empty content.
    assert_eq!(report.items[1].full_content, "");
    assert_eq!(report.items[1].image, None);
    assert_eq!(report.items[1].summary, "summary");

    assert_eq!(report.sources[0].enrichment_warnings, 1);
    assert!(report.sources[0].succeeded());

    Ok(())
}
