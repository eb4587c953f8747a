use crate::fetcher::{errors::FetchError, pipeline::process_response, types::PageResponse};
use once_cell::sync::Lazy;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, instrument};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = "Mozilla/5.0 (compatible; newsgather/0.1; research dataset collection)";

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(headers)
        .build()
        .expect("Failed to build HTTP client")
});

/// Shared client, also used by the archive resolver.
pub fn get_client() -> &'static Client {
    &HTTP_CLIENT
}

#[instrument(skip_all, fields(url = %url))]
pub async fn fetch(url: &str) -> Result<PageResponse, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let final_url = response.url().clone();
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return Err(FetchError::UnsupportedContentType(content_type));
    }

    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Io(e.to_string()))?;

    // Content-Length may be missing or wrong
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
    }

    debug!(final_url = %final_url, bytes = body_bytes.len(), "downloaded page");
    Ok(process_response(final_url, status, body_bytes, &content_type))
}
