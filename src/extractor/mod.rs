pub mod cleaner;
pub mod language;
pub mod metadata;
pub mod model;
pub mod nlp;
pub mod reader;

#[cfg(test)]
mod tests;

pub use model::ArticleResult;

use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::fetcher::{FetchError, PageResponse, fetch};

/// Pause between a download and its parse step.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("download failed: {0}")]
    Download(#[from] FetchError),

    #[error("no article could be parsed from {url}")]
    Parse { url: String },
}

/// Downloads a url and turns it into structured article fields.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn download_and_parse(&self, url: &str) -> Result<ArticleResult, ExtractError>;
}

/// Production extractor: HTTP download, settling delay, readability parse.
///
/// The delay follows every download attempt, successful or not, so
/// consecutive attempts against origin and archive are always spaced out.
#[derive(Debug, Clone)]
pub struct ReadabilityExtractor {
    settle_delay: Duration,
}

impl ReadabilityExtractor {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }
}

impl Default for ReadabilityExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

#[async_trait]
impl ContentExtractor for ReadabilityExtractor {
    #[instrument(skip_all, fields(url = %url))]
    async fn download_and_parse(&self, url: &str) -> Result<ArticleResult, ExtractError> {
        let downloaded = fetch(url).await;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        parse_article(&downloaded?)
    }
}

/// Build a complete [`ArticleResult`] from a downloaded page.
///
/// The page counts as parsed when either a title or body text comes out of
/// it; thin pages are still returned so the caller can decide what to keep.
pub fn parse_article(page: &PageResponse) -> Result<ArticleResult, ExtractError> {
    let base = &page.url_final;
    let parse_failure = || ExtractError::Parse {
        url: base.to_string(),
    };

    let readable = reader::extract(&page.body_utf8, base).ok_or_else(parse_failure)?;
    let text = cleaner::normalize_whitespace(&readable.text);
    let title = readable.title.trim().to_string();
    if title.is_empty() && text.is_empty() {
        return Err(parse_failure());
    }

    let document = Html::parse_document(&page.body_utf8);
    let meta_data = metadata::meta_data(&document);
    let images = metadata::images(&document, base);
    let top_image = metadata::top_image(&document, &meta_data, &images, base);
    let declared = metadata::declared_language(&document, &meta_data);

    let article = ArticleResult {
        source_url: base.to_string(),
        authors: metadata::authors(&document, &meta_data),
        keywords: nlp::keywords(&text),
        summary: nlp::summarize(&title, &text),
        canonical_link: metadata::canonical_link(&document, &meta_data, base),
        movies: metadata::movies(&document, base),
        publish_date: metadata::publish_date(&document, &meta_data, base),
        source: cleaner::site_root(base),
        language: language::resolve_language(declared.as_deref(), &text),
        top_image,
        images,
        meta_data,
        title,
        text,
    };

    debug!(
        url = %article.source_url,
        chars = article.text.len(),
        authors = article.authors.len(),
        has_date = article.publish_date.is_some(),
        "parsed article"
    );
    Ok(article)
}
