use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured RSS/Atom endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default)]
    pub translate: bool,
}

fn default_max_items() -> usize {
    3
}

impl FeedSourceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>, max_items: usize) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            max_items,
            translate: false,
        }
    }

    pub fn with_translation(mut self) -> Self {
        self.translate = true;
        self
    }
}

/// A raw entry as read from a feed, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

impl FeedEntry {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            summary: None,
            published_at: None,
            image: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// A normalized, enriched entry ready for composition.
///
/// `summary` and `full_content` are empty strings when absent; they are
/// never filled in lazily later on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub full_content: String,
    pub image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    pub fn new(source: impl Into<String>, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            link: link.into(),
            summary: String::new(),
            full_content: String::new(),
            image: None,
            published_at: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_full_content(mut self, full_content: impl Into<String>) -> Self {
        self.full_content = full_content.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Title with line breaks turned into spaces and the ends trimmed, for
    /// single-line listings. Other spacing is kept as published.
    pub fn display_title(&self) -> String {
        self.title.replace(['\r', '\n'], " ").trim().to_string()
    }
}

/// Final message handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMessage {
    pub title: String,
    pub text: String,
    pub image_url: Option<String>,
    pub action_url: Option<String>,
}

impl DigestMessage {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            image_url: None,
            action_url: None,
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_action(mut self, action_url: impl Into<String>) -> Self {
        self.action_url = Some(action_url.into());
        self
    }
}

/// A best-effort value together with the reason it was degraded, if it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enriched<T> {
    pub value: T,
    pub warning: Option<String>,
}

impl<T> Enriched<T> {
    pub fn ok(value: T) -> Self {
        Self { value, warning: None }
    }

    pub fn degraded(value: T, warning: impl Into<String>) -> Self {
        Self {
            value,
            warning: Some(warning.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub article_timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-digest/0.1 (+https://github.com/)".to_string(),
            timeout_seconds: 30,
            article_timeout_seconds: 20,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Unsupported content type: {0}")]
    UnsupportedContent(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("Webhook rejected message: {0}")]
    Webhook(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
