use crate::fetcher::Fetcher;
use crate::traits::{ArticleExtractor, ExtractedArticle};
use crate::types::{DigestError, Result};
use crate::utils::{text::element_text, url::resolve};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::debug;

/// Paragraphs shorter than this are usually bylines, captions or buttons.
const MIN_PARAGRAPH_CHARS: usize = 25;

/// Extracts article text from HTML pages using CSS selectors.
pub struct HtmlArticleExtractor {
    fetcher: Arc<Fetcher>,
}

impl HtmlArticleExtractor {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Extracts body text and a lead image from an already downloaded page.
    pub fn extract_from_html(html: &str, page_url: &str) -> Result<ExtractedArticle> {
        let document = Html::parse_document(html);

        let text = article_paragraphs(&document)?;
        let image = lead_image(&document, page_url)?;

        Ok(ExtractedArticle { text, image })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DigestError::Extraction(format!("bad selector {}: {:?}", css, e)))
}

fn article_paragraphs(document: &Html) -> Result<String> {
    let scoped = selector("article p, main p, [itemprop=articleBody] p")?;
    let all = selector("p")?;

    let collect = |sel: &Selector| -> Vec<String> {
        document
            .select(sel)
            .map(element_text)
            .filter(|p| p.chars().count() >= MIN_PARAGRAPH_CHARS)
            .collect()
    };

    let mut paragraphs = collect(&scoped);
    if paragraphs.is_empty() {
        paragraphs = collect(&all);
    }
    paragraphs.dedup();

    Ok(paragraphs.join("\n\n"))
}

fn lead_image(document: &Html, page_url: &str) -> Result<Option<String>> {
    let meta = selector(
        r#"meta[property="og:image"], meta[name="og:image"], meta[name="twitter:image"], meta[property="twitter:image"]"#,
    )?;
    let from_meta = document
        .select(&meta)
        .filter_map(|m| m.value().attr("content"))
        .find_map(|href| resolve(page_url, href));
    if from_meta.is_some() {
        return Ok(from_meta);
    }

    let inline = selector("article img[src], main img[src]")?;
    Ok(document
        .select(&inline)
        .filter_map(|img| img.value().attr("src"))
        .find_map(|src| resolve(page_url, src)))
}

#[async_trait]
impl ArticleExtractor for HtmlArticleExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle> {
        let page = self.fetcher.fetch_page(url).await?;
        if !page.is_html() {
            return Err(DigestError::UnsupportedContent(
                page.content_type.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        let article = Self::extract_from_html(&page.body, &page.url)?;
        debug!(
            "Extracted {} chars from {} (image: {})",
            article.text.chars().count(),
            url,
            article.image.is_some()
        );
        Ok(article)
    }
}
