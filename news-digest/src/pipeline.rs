use crate::aggregator::NewsAggregator;
use crate::config::AppConfig;
use crate::digest::{compose_plain_digest, AiDigest, AiDigestComposer, NO_ITEMS_MESSAGE};
use crate::enrich::{ContentEnricher, GoogleTranslator, HtmlArticleExtractor};
use crate::llm_adapter::{LlmAdapter, OpenAiCompatibleAdapter};
use crate::notifier::{DeliveryReport, Dispatcher, ReqwestTransport};
use crate::sources::RssFeedReader;
use crate::types::{DigestMessage, NewsItem, Result};
use crate::Fetcher;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-run switches, usually from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub disable_ai: bool,
}

#[derive(Debug, Clone)]
pub struct MessageSettings {
    pub title: String,
    pub action_url: Option<String>,
    pub notify_when_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Ai,
    Plain,
    NoItems,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub items: usize,
    pub failed_sources: usize,
    pub digest: DigestKind,
    pub message: DigestMessage,
    /// `None` when delivery was skipped.
    pub delivery: Option<DeliveryReport>,
}

/// Cover image and button link come from the first item that has an image.
pub fn build_message(
    settings: &MessageSettings,
    date: NaiveDate,
    text: String,
    items: &[NewsItem],
) -> DigestMessage {
    let title = format!("{} {}", settings.title, date.format("%Y-%m-%d"));
    let mut message = DigestMessage::new(title, text);

    let cover = items.iter().find(|item| item.image.is_some());
    if let Some(image) = cover.and_then(|item| item.image.clone()) {
        message = message.with_image(image);
    }

    let action = settings
        .action_url
        .clone()
        .or_else(|| cover.map(|item| item.link.clone()));
    if let Some(action) = action {
        message = message.with_action(action);
    }

    message
}

pub struct DigestPipeline {
    aggregator: NewsAggregator,
    composer: AiDigestComposer,
    dispatcher: Dispatcher,
    settings: MessageSettings,
}

impl DigestPipeline {
    pub fn new(
        aggregator: NewsAggregator,
        composer: AiDigestComposer,
        dispatcher: Dispatcher,
        settings: MessageSettings,
    ) -> Self {
        Self {
            aggregator,
            composer,
            dispatcher,
            settings,
        }
    }

    /// Wires the production collaborators from configuration.
    pub fn from_config(config: &AppConfig, options: &RunOptions) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);

        let mut enricher = ContentEnricher::new(config.translate_target.clone());
        if config.feeds.iter().any(|f| f.translate) {
            enricher = enricher.with_translator(Box::new(GoogleTranslator::new(config.translate_timeout_seconds)?));
        }
        if config.full_text {
            enricher = enricher.with_extractor(Box::new(HtmlArticleExtractor::new(fetcher.clone())));
        }

        let aggregator = NewsAggregator::new(
            config.feeds.clone(),
            Box::new(RssFeedReader::new(fetcher)),
            enricher,
        );

        let adapter: Option<Box<dyn LlmAdapter>> = match (&config.openai, options.disable_ai) {
            (Some(openai), false) => Some(Box::new(OpenAiCompatibleAdapter::new(openai.clone())?)),
            _ => None,
        };
        let composer = AiDigestComposer::new(adapter, config.digest.clone());

        let destinations = if options.dry_run {
            Vec::new()
        } else {
            config.destinations.clone()
        };
        let dispatcher = Dispatcher::new(destinations, Box::new(ReqwestTransport::new(30)?));

        let settings = MessageSettings {
            title: config.digest.title.clone(),
            action_url: config.action_url.clone(),
            notify_when_empty: config.notify_when_empty,
        };

        Ok(Self::new(aggregator, composer, dispatcher, settings))
    }

    pub async fn run(&self, date: NaiveDate) -> RunSummary {
        let report = self.aggregator.aggregate().await;
        let failed_sources = report.failed_sources().count();
        let items = report.items;

        if items.is_empty() {
            info!("{}", NO_ITEMS_MESSAGE);
            let message = build_message(&self.settings, date, NO_ITEMS_MESSAGE.to_string(), &items);
            let delivery = if self.settings.notify_when_empty {
                Some(self.dispatcher.send(&message).await)
            } else {
                info!("Nothing aggregated, skipping delivery");
                None
            };
            return RunSummary {
                items: 0,
                failed_sources,
                digest: DigestKind::NoItems,
                message,
                delivery,
            };
        }

        let (digest, text) = match self.composer.compose(&items, date).await {
            AiDigest::Composed {
                text,
                batches,
                failed_batches,
            } if failed_batches < batches => {
                info!("AI digest ready ({} batches, {} failed)", batches, failed_batches);
                (DigestKind::Ai, text)
            }
            AiDigest::Composed { batches, .. } => {
                warn!("All {} summarization batches failed, using plain list", batches);
                (DigestKind::Plain, compose_plain_digest(&items, date))
            }
            AiDigest::Unavailable | AiDigest::Empty => (DigestKind::Plain, compose_plain_digest(&items, date)),
        };

        let message = build_message(&self.settings, date, text, &items);
        let delivery = self.dispatcher.send(&message).await;
        info!(
            "Delivery finished: {} delivered, {} failed",
            delivery.delivered(),
            delivery.failed()
        );

        RunSummary {
            items: items.len(),
            failed_sources,
            digest,
            message,
            delivery: Some(delivery),
        }
    }
}
