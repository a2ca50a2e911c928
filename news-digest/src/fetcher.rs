use crate::types::{DigestError, FetchConfig, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::debug;

/// A downloaded page body with the content type the server reported.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(content_type) => {
                let content_type = content_type.to_ascii_lowercase();
                content_type.contains("text/html") || content_type.contains("application/xhtml")
            }
            // Servers that omit the header are given the benefit of the doubt.
            None => true,
        }
    }
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Downloads a feed document. One attempt, no retries.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let response = self.send(url, self.config.timeout_seconds).await?;

        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(DigestError::FeedTooLarge { size_mb });
            }
        }

        let bytes = response.bytes().await?;
        debug!(
            "Fetched feed {} ({} bytes in {}ms)",
            url,
            bytes.len(),
            start_time.elapsed().as_millis()
        );
        Ok(bytes.to_vec())
    }

    /// Downloads an article page for full-text extraction.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        debug!("Fetching full content from: {}", url);

        let response = self.send(url, self.config.article_timeout_seconds).await?;
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await?;

        Ok(FetchedPage {
            url: final_url,
            content_type,
            body,
        })
    }

    async fn send(&self, url: &str, timeout_seconds: u64) -> Result<Response> {
        let url = url::Url::parse(url)?;
        let response = self
            .client
            .get(url.clone())
            .timeout(Duration::from_secs(timeout_seconds))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }
}
