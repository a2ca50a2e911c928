use news_digest::config::{default_feeds, parse_feed_file, AppConfig, ENV_FEEDS_CONFIG};
use news_digest::notifier::EndpointKind;
use news_digest::types::*;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

const FEED_FILE: &str = r#"
[[feeds]]
name = "Hacker News"
url = "https://news.ycombinator.com/rss"
max_items = 5
translate = true

[[feeds]]
name = "Lobsters"
url = "https://lobste.rs/rss"

[digest]
batch_size = 4
language = "English"
"#;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key: &str| map.get(key).cloned()
}

fn feed_file() -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(FEED_FILE.as_bytes())?;
    Ok(file)
}

#[test]
fn test_defaults_without_environment() -> Result<()> {
    let config = AppConfig::from_lookup(lookup(&[]), None)?;

    assert_eq!(config.feeds, default_feeds());
    assert_eq!(config.feeds.len(), 3);
    assert!(config.feeds.iter().all(|f| f.max_items == 3));
    assert!(config.feeds[0].translate);
    assert_eq!(config.max_items_total(), 9);

    assert!(config.openai.is_none());
    assert!(config.destinations.is_empty());
    assert_eq!(config.translate_target, "zh-CN");
    assert!(config.full_text);
    assert!(!config.notify_when_empty);
    assert_eq!(config.digest.batch_size, 5);
    assert_eq!(config.digest.content_char_budget, 1000);
    assert_eq!(config.digest.min_full_content_chars, 100);

    Ok(())
}

#[test]
fn test_feed_file_from_path() -> Result<()> {
    let file = feed_file()?;
    let config = AppConfig::from_lookup(lookup(&[]), Some(file.path()))?;

    assert_eq!(config.feeds.len(), 2);
    assert_eq!(config.feeds[0].max_items, 5);
    assert!(config.feeds[0].translate);
    assert_eq!(config.feeds[1].max_items, 3);
    assert!(!config.feeds[1].translate);
    assert_eq!(config.digest.batch_size, 4);
    assert_eq!(config.digest.language, "English");
    assert_eq!(config.digest.title, "Daily News Digest");

    Ok(())
}

#[test]
fn test_feed_file_from_environment() -> Result<()> {
    let file = feed_file()?;
    let path = file.path().to_string_lossy().to_string();
    let config = AppConfig::from_lookup(lookup(&[(ENV_FEEDS_CONFIG, path.as_str())]), None)?;

    assert_eq!(config.feeds[1].name, "Lobsters");

    Ok(())
}

#[test]
fn test_environment_overrides() -> Result<()> {
    let file = feed_file()?;
    let config = AppConfig::from_lookup(
        lookup(&[
            ("AI_API_KEY", "sk-test"),
            ("AI_BASE_URL", "https://llm.example.com/v1"),
            ("AI_MODEL", "local-model"),
            ("DIGEST_BATCH_SIZE", "2"),
            ("DIGEST_TITLE", "Morning Brief"),
            ("DIGEST_FULL_TEXT", "off"),
            ("DIGEST_ACTION_URL", "https://example.com/all"),
            ("NOTIFY_WHEN_EMPTY", "yes"),
            ("TRANSLATE_TARGET", "ja"),
            ("WEBHOOK_URL", "dingtalk://token1, https://hooks.example.com/x"),
        ]),
        Some(file.path()),
    )?;

    let openai = config.openai.as_ref().expect("credential configured");
    assert_eq!(openai.api_key, "sk-test");
    assert_eq!(openai.base_url, "https://llm.example.com/v1");
    assert_eq!(openai.model, "local-model");
    assert_eq!(openai.timeout_seconds, 300);

    // Environment beats the [digest] table.
    assert_eq!(config.digest.batch_size, 2);
    assert_eq!(config.digest.title, "Morning Brief");
    assert!(!config.full_text);
    assert!(config.notify_when_empty);
    assert_eq!(config.action_url.as_deref(), Some("https://example.com/all"));
    assert_eq!(config.translate_target, "ja");

    assert_eq!(config.destinations.len(), 2);
    assert_eq!(config.destinations[0].kind, EndpointKind::DingTalk);
    assert_eq!(config.destinations[1].kind, EndpointKind::Generic);

    Ok(())
}

#[test]
fn test_primary_names_win_over_aliases() -> Result<()> {
    let config = AppConfig::from_lookup(
        lookup(&[
            ("OPENAI_API_KEY", "sk-primary"),
            ("AI_API_KEY", "sk-alias"),
            ("NOTIFIER_URL", "https://hooks.example.com/primary"),
            ("WEBHOOK_URL", "https://hooks.example.com/alias"),
        ]),
        None,
    )?;

    assert_eq!(config.openai.map(|o| o.api_key).as_deref(), Some("sk-primary"));
    assert_eq!(config.destinations[0].url, "https://hooks.example.com/primary");

    // Blank values count as unset.
    let blank = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")]), None)?;
    assert!(blank.openai.is_none());

    Ok(())
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(AppConfig::from_lookup(lookup(&[("DIGEST_BATCH_SIZE", "five")]), None).is_err());
    assert!(AppConfig::from_lookup(lookup(&[("DIGEST_FULL_TEXT", "maybe")]), None).is_err());

    assert!(parse_feed_file("feeds = []").is_err());
    assert!(parse_feed_file("[[feeds]]\nname = \"x\"\nurl = \"ftp://example.com/rss\"").is_err());
    assert!(parse_feed_file("[[feeds]]\nname = \"\"\nurl = \"https://example.com/rss\"").is_err());
    assert!(parse_feed_file("[[feeds]]\nname = \"x\"").is_err());

    let missing = std::path::Path::new("/nonexistent/feeds.toml");
    assert!(matches!(
        AppConfig::from_lookup(lookup(&[]), Some(missing)),
        Err(DigestError::Config(_))
    ));
}
