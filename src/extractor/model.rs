use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured article fields produced by a successful extraction.
///
/// Fields the page does not provide are left empty or `None`; an
/// `ArticleResult` only exists when the page was parsed as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleResult {
    /// The url that was actually fetched (after redirects).
    pub source_url: String,
    pub text: String,
    pub title: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub images: Vec<String>,
    pub top_image: Option<String>,
    pub canonical_link: Option<String>,
    pub meta_data: BTreeMap<String, String>,
    pub movies: Vec<String>,
    /// Seconds since the Unix epoch. `None` when the page carries no date.
    pub publish_date: Option<i64>,
    /// Site root (`scheme://host`) of the article.
    pub source: String,
    pub summary: String,
    pub language: Option<String>,
}

#[derive(Debug)]
pub struct ReadabilityResult {
    pub title: String,
    pub text: String,
}
