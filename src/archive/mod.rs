//! Web-archive lookups used as the last fallback when an article's origin
//! is unreachable.
//!
//! The resolver asks the Wayback Machine CDX index for captures of a url and
//! turns the first listed capture into a replayable snapshot url. Every
//! failure mode collapses to "no snapshot" for callers; the reason is logged.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::fetcher::get_client;

pub const DEFAULT_INDEX_URL: &str = "http://web.archive.org/cdx/search/cdx";
pub const DEFAULT_SNAPSHOT_BASE: &str = "https://web.archive.org/web";

/// Column positions inside a CDX data row.
const TIMESTAMP_COLUMN: usize = 1;
const ORIGINAL_COLUMN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSnapshot {
    pub timestamp: String,
    pub archived_url: String,
}

/// Reasons the archive could not supply a snapshot.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("archive index returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("archive index response was malformed: {0}")]
    Malformed(String),

    #[error("no snapshot listed")]
    NoSnapshot,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotResolver: Send + Sync {
    /// Locate a snapshot for `url`, or `None` when the archive has nothing usable.
    async fn resolve(&self, url: &str) -> Option<ArchiveSnapshot>;
}

#[derive(Debug, Clone)]
pub struct WaybackResolver {
    client: Client,
    index_url: String,
    snapshot_base: String,
}

impl WaybackResolver {
    pub fn new(index_url: impl Into<String>, snapshot_base: impl Into<String>) -> Self {
        Self {
            client: get_client().clone(),
            index_url: index_url.into(),
            snapshot_base: snapshot_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Query the index and build the snapshot, surfacing why it failed.
    pub async fn lookup(&self, url: &str) -> Result<ArchiveSnapshot, ArchiveError> {
        let response = self
            .client
            .get(&self.index_url)
            .query(&[("url", url), ("output", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status(status));
        }

        let body = response.bytes().await?;
        let (timestamp, original) = first_capture(&body)?;
        Ok(ArchiveSnapshot {
            archived_url: format!("{}/{}/{}", self.snapshot_base, timestamp, original),
            timestamp,
        })
    }
}

impl Default for WaybackResolver {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_URL, DEFAULT_SNAPSHOT_BASE)
    }
}

#[async_trait]
impl SnapshotResolver for WaybackResolver {
    #[instrument(skip_all, fields(url = %url))]
    async fn resolve(&self, url: &str) -> Option<ArchiveSnapshot> {
        match self.lookup(url).await {
            Ok(snapshot) => {
                debug!(archived_url = %snapshot.archived_url, "found archive snapshot");
                Some(snapshot)
            }
            Err(ArchiveError::NoSnapshot) => {
                debug!("archive has no snapshot");
                None
            }
            Err(e) => {
                warn!(error = %e, "archive lookup failed");
                None
            }
        }
    }
}

/// Row 0 of a CDX JSON response is the header; row 1 is the first capture.
fn first_capture(body: &[u8]) -> Result<(String, String), ArchiveError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ArchiveError::NoSnapshot);
    }

    let rows: Vec<Vec<serde_json::Value>> =
        serde_json::from_slice(body).map_err(|e| ArchiveError::Malformed(e.to_string()))?;
    let row = rows.get(1).ok_or(ArchiveError::NoSnapshot)?;

    let column = |index: usize| -> Result<String, ArchiveError> {
        row.get(index)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ArchiveError::Malformed(format!("capture row lacks column {index}")))
    };
    Ok((column(TIMESTAMP_COLUMN)?, column(ORIGINAL_COLUMN)?))
}
