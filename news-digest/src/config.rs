use crate::digest::DigestConfig;
use crate::llm_adapter::OpenAiConfig;
use crate::notifier::{parse_destinations, Destination};
use crate::types::{DigestError, FeedSourceConfig, FetchConfig, Result};
use crate::utils::url::is_valid_feed_url;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_FEEDS_CONFIG: &str = "FEEDS_CONFIG";

/// Everything one run needs, resolved up front and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feeds: Vec<FeedSourceConfig>,
    pub digest: DigestConfig,
    pub fetch: FetchConfig,
    /// `None` when no summarizer credential is configured.
    pub openai: Option<OpenAiConfig>,
    pub translate_target: String,
    pub translate_timeout_seconds: u64,
    pub full_text: bool,
    pub destinations: Vec<Destination>,
    pub action_url: Option<String>,
    pub notify_when_empty: bool,
}

/// On-disk feed list, e.g. `feeds.toml`:
///
/// ```toml
/// [[feeds]]
/// name = "Hacker News"
/// url = "https://news.ycombinator.com/rss"
/// max_items = 3
/// translate = true
///
/// [digest]
/// batch_size = 5
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FeedFile {
    #[serde(default)]
    pub feeds: Vec<FeedSourceConfig>,
    pub digest: Option<DigestConfig>,
}

pub fn default_feeds() -> Vec<FeedSourceConfig> {
    vec![
        FeedSourceConfig::new("Hacker News (Tech)", "https://news.ycombinator.com/rss", 3).with_translation(),
        FeedSourceConfig::new("少数派 (效率/生活)", "https://sspai.com/feed", 3),
        FeedSourceConfig::new("36氪 (科技/创投)", "https://36kr.com/feed", 3),
    ]
}

pub fn parse_feed_file(content: &str) -> Result<FeedFile> {
    let file: FeedFile = toml::from_str(content)?;
    validate_feeds(&file.feeds)?;
    Ok(file)
}

pub fn load_feed_file(path: &Path) -> Result<FeedFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| DigestError::Config(format!("reading feed list from {}: {}", path.display(), e)))?;
    parse_feed_file(&content)
}

fn validate_feeds(feeds: &[FeedSourceConfig]) -> Result<()> {
    if feeds.is_empty() {
        return Err(DigestError::Config("feed list contains no [[feeds]] entries".to_string()));
    }
    for feed in feeds {
        if feed.name.trim().is_empty() {
            return Err(DigestError::Config(format!("feed {} has an empty name", feed.url)));
        }
        if !is_valid_feed_url(&feed.url) {
            return Err(DigestError::Config(format!("feed {} has invalid url {:?}", feed.name, feed.url)));
        }
        if feed.max_items == 0 {
            warn!("Feed {} has max_items = 0 and will contribute nothing", feed.name);
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool> {
    match non_empty(value) {
        None => Ok(default),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(DigestError::Config(format!("{} must be a boolean, got {:?}", key, v))),
        },
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match non_empty(value) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| DigestError::Config(format!("{} must be a number, got {:?}", key, v))),
    }
}

impl AppConfig {
    /// Builds the configuration from process environment variables.
    pub fn from_env(feeds_path: Option<&Path>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), feeds_path)
    }

    /// Builds the configuration through `lookup`, so callers decide where
    /// values come from. An explicit `feeds_path` wins over `FEEDS_CONFIG`;
    /// without either the built-in feed list is used.
    pub fn from_lookup<F>(lookup: F, feeds_path: Option<&Path>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let feeds_path: Option<PathBuf> = feeds_path
            .map(Path::to_path_buf)
            .or_else(|| get(ENV_FEEDS_CONFIG).map(PathBuf::from));

        let (feeds, mut digest) = match feeds_path {
            Some(path) => {
                debug!("Loading feed list from {}", path.display());
                let file = load_feed_file(&path)?;
                (file.feeds, file.digest.unwrap_or_default())
            }
            None => (default_feeds(), DigestConfig::default()),
        };

        if let Some(language) = get("DIGEST_LANGUAGE") {
            digest.language = language;
        }
        if let Some(title) = get("DIGEST_TITLE") {
            digest.title = title;
        }
        digest.batch_size = parse_number("DIGEST_BATCH_SIZE", get("DIGEST_BATCH_SIZE"), digest.batch_size)?;

        let openai = get("OPENAI_API_KEY")
            .or_else(|| get("AI_API_KEY"))
            .map(|api_key| -> Result<OpenAiConfig> {
                let defaults = OpenAiConfig::default();
                Ok(OpenAiConfig {
                    base_url: get("OPENAI_BASE_URL")
                        .or_else(|| get("AI_BASE_URL"))
                        .unwrap_or(defaults.base_url),
                    model: get("AI_MODEL").unwrap_or(defaults.model),
                    api_key,
                    timeout_seconds: parse_number("AI_TIMEOUT_SECS", get("AI_TIMEOUT_SECS"), defaults.timeout_seconds)?,
                })
            })
            .transpose()?;

        let destinations = get("NOTIFIER_URL")
            .or_else(|| get("WEBHOOK_URL"))
            .map(|raw| parse_destinations(&raw))
            .unwrap_or_default();

        Ok(Self {
            feeds,
            digest,
            fetch: FetchConfig::default(),
            openai,
            translate_target: get("TRANSLATE_TARGET").unwrap_or_else(|| "zh-CN".to_string()),
            translate_timeout_seconds: parse_number("TRANSLATE_TIMEOUT_SECS", get("TRANSLATE_TIMEOUT_SECS"), 10)?,
            full_text: parse_bool("DIGEST_FULL_TEXT", get("DIGEST_FULL_TEXT"), true)?,
            destinations,
            action_url: get("DIGEST_ACTION_URL"),
            notify_when_empty: parse_bool("NOTIFY_WHEN_EMPTY", get("NOTIFY_WHEN_EMPTY"), false)?,
        })
    }

    pub fn max_items_total(&self) -> usize {
        self.feeds.iter().map(|f| f.max_items).sum()
    }
}
