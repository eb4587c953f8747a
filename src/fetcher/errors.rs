use std::error::Error as _;
use thiserror::Error;

/// Everything that can go wrong while downloading a page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("dns failure: {0}")]
    Dns(String),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("too many redirects")]
    RedirectLoop,

    #[error("http error {0}")]
    Http(reqwest::StatusCode),

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Short stable tag for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::Dns(_) => "dns",
            Self::Tls(_) => "tls",
            Self::Connect(_) => "connect",
            Self::ConnectTimeout => "connect_timeout",
            Self::RequestTimeout => "request_timeout",
            Self::RedirectLoop => "redirect_loop",
            Self::Http(_) => "http",
            Self::BodyTooLarge(_) => "body_too_large",
            Self::UnsupportedContentType(_) => "content_type",
            Self::Io(_) => "io",
            Self::Unknown(_) => "unknown",
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::Http(status)
        } else if err.is_connect() {
            let message = error_chain(&err);
            // classify on the causes only; the top-level message carries the url
            let lowered = err
                .source()
                .map(error_chain)
                .unwrap_or_default()
                .to_ascii_lowercase();
            if lowered.contains("certificate") || lowered.contains("tls") {
                Self::Tls(message)
            } else if lowered.contains("dns") || lowered.contains("lookup") {
                Self::Dns(message)
            } else {
                Self::Connect(message)
            }
        } else if err.is_request() {
            Self::Io(error_chain(&err))
        } else if err.is_body() || err.is_decode() {
            Self::Io(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

/// The error and every source under it, joined; reqwest keeps the useful
/// detail (refused, dns, certificate) in the sources.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
