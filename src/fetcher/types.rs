use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use reqwest::StatusCode;
use url::Url;

/// A downloaded HTML page, decoded to UTF-8 and ready for article parsing.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub content_type: String,
    pub body_utf8: String,
    pub encoding: &'static Encoding,
    pub fetched_at: DateTime<Utc>,
}

impl PageResponse {
    /// Build a page from already-decoded HTML. Used by tests and the fuzz target.
    pub fn from_html(url_final: Url, html: impl Into<String>) -> Self {
        Self {
            url_final,
            status: StatusCode::OK,
            content_type: "text/html; charset=utf-8".to_string(),
            body_utf8: html.into(),
            encoding: encoding_rs::UTF_8,
            fetched_at: Utc::now(),
        }
    }

    pub fn charset(&self) -> &'static str {
        self.encoding.name()
    }
}
