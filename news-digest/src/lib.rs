pub mod types;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod utils;
pub mod traits;
pub mod sources;
pub mod enrich;
pub mod aggregator;
pub mod llm_adapter;
pub mod digest;
pub mod notifier;
pub mod pipeline;

pub use types::*;
pub use config::AppConfig;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use aggregator::{AggregationReport, NewsAggregator};
pub use digest::{compose_plain_digest, AiDigest, AiDigestComposer, DigestConfig};
pub use notifier::{Destination, Dispatcher};
pub use pipeline::{DigestKind, DigestPipeline, RunOptions, RunSummary};
