use crate::llm_adapter::LlmAdapter;
use crate::types::NewsItem;
use crate::utils::text::{char_len, html_to_text, truncate_chars};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

/// Literal used by the plain composer when there is nothing to report.
pub const NO_ITEMS_MESSAGE: &str = "No notable news today.";

pub const BATCH_SEPARATOR: &str = "\n\n---\n\n";

const NO_CONTENT: &str = "No content available.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub batch_size: usize,
    /// Characters of `full_content` sent per item.
    pub content_char_budget: usize,
    /// Below this, `full_content` is considered a failed extraction.
    pub min_full_content_chars: usize,
    /// Language the summarizer is told to answer in.
    pub language: String,
    pub title: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            content_char_budget: 1000,
            min_full_content_chars: 100,
            language: "Simplified Chinese".to_string(),
            title: "Daily News Digest".to_string(),
        }
    }
}

/// A contiguous run of items together with the global (1-based) index of
/// its first element.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    pub start_index: usize,
    pub items: &'a [NewsItem],
}

impl<'a> Batch<'a> {
    /// Items paired with their global position in the digest.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &'a NewsItem)> {
        let start = self.start_index;
        let items: &'a [NewsItem] = self.items;
        items.iter().enumerate().map(move |(i, item)| (start + i, item))
    }
}

/// Splits items into order-preserving batches of at most `batch_size`.
pub fn partition(items: &[NewsItem], batch_size: usize) -> Vec<Batch<'_>> {
    let batch_size = batch_size.max(1);
    items
        .chunks(batch_size)
        .enumerate()
        .map(|(n, chunk)| Batch {
            start_index: n * batch_size + 1,
            items: chunk,
        })
        .collect()
}

/// Picks the text describing an item inside a summarization prompt.
pub fn content_for_prompt(item: &NewsItem, config: &DigestConfig) -> String {
    let full = item.full_content.trim();
    if char_len(full) >= config.min_full_content_chars {
        return truncate_chars(full, config.content_char_budget);
    }

    let summary = html_to_text(&item.summary);
    if !summary.is_empty() {
        return truncate_chars(&summary, config.content_char_budget);
    }

    if !full.is_empty() {
        return truncate_chars(full, config.content_char_budget);
    }

    NO_CONTENT.to_string()
}

pub fn system_prompt(config: &DigestConfig) -> String {
    format!(
        "You are a professional news editor who writes concise daily briefings. \
         Always answer in {}.",
        config.language
    )
}

pub fn build_batch_prompt(batch: &Batch<'_>, config: &DigestConfig, date: NaiveDate) -> String {
    let mut prompt = format!(
        "Today is {}. Summarize each of the following news items in 2-3 sentences. \
         Keep the original numbering, start each entry with its number and a short headline, \
         and end it with the original link.\n\n",
        date.format("%Y-%m-%d")
    );

    for (index, item) in batch.numbered() {
        prompt.push_str(&format!("[{}] Source: {}\nTitle: {}\n", index, item.source, item.display_title()));
        if let Some(published) = item.published_at {
            prompt.push_str(&format!("Published: {}\n", published.format("%Y-%m-%d %H:%M UTC")));
        }
        prompt.push_str(&format!(
            "Content: {}\nLink: {}\n\n",
            content_for_prompt(item, config),
            item.link
        ));
    }

    prompt.trim_end().to_string()
}

/// Line emitted for an item whose batch could not be summarized.
pub fn placeholder_line(index: usize, item: &NewsItem) -> String {
    format!(
        "{}. [{}] {} (summary unavailable)\n   🔗 {}",
        index,
        item.source,
        item.display_title(),
        item.link
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiDigest {
    /// No credential configured; the AI path never ran.
    Unavailable,
    /// Nothing to summarize.
    Empty,
    Composed {
        text: String,
        batches: usize,
        failed_batches: usize,
    },
}

impl AiDigest {
    /// True when at least one batch produced real model output.
    pub fn has_model_output(&self) -> bool {
        matches!(self, AiDigest::Composed { batches, failed_batches, .. } if failed_batches < batches)
    }
}

pub struct AiDigestComposer {
    adapter: Option<Box<dyn LlmAdapter>>,
    config: DigestConfig,
}

impl AiDigestComposer {
    /// `adapter` is `None` when no API credential is configured.
    pub fn new(adapter: Option<Box<dyn LlmAdapter>>, config: DigestConfig) -> Self {
        Self { adapter, config }
    }

    pub fn is_configured(&self) -> bool {
        self.adapter.is_some()
    }

    /// Summarizes items batch by batch. A failing batch is replaced by one
    /// placeholder line per item so nothing silently disappears.
    pub async fn compose(&self, items: &[NewsItem], date: NaiveDate) -> AiDigest {
        let Some(adapter) = &self.adapter else {
            info!("No summarizer credential configured, skipping AI digest");
            return AiDigest::Unavailable;
        };

        if items.is_empty() {
            return AiDigest::Empty;
        }

        let system = system_prompt(&self.config);
        let batches = partition(items, self.config.batch_size);
        let total = batches.len();
        let mut failed_batches = 0;
        let mut sections: Vec<String> = Vec::with_capacity(total);

        info!(
            "Summarizing {} items in {} batches with {}",
            items.len(),
            total,
            adapter.adapter_name()
        );

        for (n, batch) in batches.iter().enumerate() {
            let prompt = build_batch_prompt(batch, &self.config, date);

            match adapter.complete(&system, &prompt).await {
                Ok(summary) => {
                    info!("Batch {}/{} summarized", n + 1, total);
                    sections.push(summary.trim().to_string());
                }
                Err(e) => {
                    warn!("Batch {}/{} failed, using placeholders: {}", n + 1, total, e);
                    failed_batches += 1;
                    let lines: Vec<String> = batch
                        .numbered()
                        .map(|(index, item)| placeholder_line(index, item))
                        .collect();
                    sections.push(lines.join("\n"));
                }
            }
        }

        AiDigest::Composed {
            text: sections.join(BATCH_SEPARATOR),
            batches: total,
            failed_batches,
        }
    }
}

/// Deterministic numbered list used when the AI path is unavailable.
pub fn compose_plain_digest(items: &[NewsItem], date: NaiveDate) -> String {
    if items.is_empty() {
        return NO_ITEMS_MESSAGE.to_string();
    }

    let mut lines = vec![format!("📅 {} Daily News Digest\n", date.format("%Y-%m-%d"))];
    for (idx, item) in items.iter().enumerate() {
        lines.push(format!("{}. [{}] {}", idx + 1, item.source, item.display_title()));
        lines.push(format!("   🔗 {}\n", item.link));
    }

    lines.join("\n").trim_end().to_string()
}
