//! Labeled news tables: `{dataset_dir}/{news_source}_{label}.csv`.

use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::DataChoice;

/// Columns a news table must carry; `label` may be omitted.
pub const REQUIRED_COLUMNS: [&str; 4] = ["id", "news_url", "title", "tweet_ids"];

/// Value written in place of article text when nothing could be retrieved.
pub const CONTENT_SENTINEL: &str = "none/not available";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsRecord {
    pub id: String,
    pub news_url: String,
    pub title: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tweet_ids: String,
    #[serde(skip)]
    pub content_text: Option<String>,
}

impl NewsRecord {
    /// Use the article text when there is some, otherwise the sentinel.
    pub fn attach_content(&mut self, article_text: Option<String>) {
        let text = article_text
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| CONTENT_SENTINEL.to_string());
        self.content_text = Some(text);
    }

    pub fn content(&self) -> &str {
        self.content_text.as_deref().unwrap_or(CONTENT_SENTINEL)
    }

    pub fn has_content(&self) -> bool {
        self.content_text
            .as_deref()
            .is_some_and(|text| text != CONTENT_SENTINEL)
    }
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("input file missing: {}", path.display())]
    InputFileMissing { path: PathBuf },

    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} lacks required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("row {row} of {} has a {size}-byte field, limit is {limit}", path.display())]
    FieldTooLarge {
        path: PathBuf,
        row: u64,
        size: usize,
        limit: usize,
    },

    #[error("malformed csv in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Largest field size the platform can hold, found by halving from the
/// widest integer until it fits in a single allocation.
pub fn platform_field_limit() -> usize {
    let mut limit = usize::MAX;
    while isize::try_from(limit).is_err() {
        limit /= 2;
    }
    limit
}

#[derive(Debug, Clone)]
pub struct DatasetLoader {
    dataset_dir: PathBuf,
    max_field_bytes: usize,
}

impl DatasetLoader {
    pub fn new(dataset_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            max_field_bytes: platform_field_limit(),
        }
    }

    pub fn with_max_field_bytes(mut self, max_field_bytes: usize) -> Self {
        self.max_field_bytes = max_field_bytes;
        self
    }

    pub fn path_for(&self, choice: &DataChoice) -> PathBuf {
        self.dataset_dir.join(choice.file_name())
    }

    #[instrument(skip(self), fields(source = %choice.news_source, label = %choice.label))]
    pub fn load(&self, choice: &DataChoice) -> Result<Vec<NewsRecord>, DatasetError> {
        let path = self.path_for(choice);
        let file = File::open(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => DatasetError::InputFileMissing { path: path.clone() },
            _ => DatasetError::Io {
                path: path.clone(),
                source,
            },
        })?;

        let records = self.read_records(file, &path, &choice.label)?;
        info!(path = %path.display(), count = records.len(), "loaded news records");
        Ok(records)
    }

    fn read_records<R: io::Read>(
        &self,
        reader: R,
        path: &Path,
        label: &str,
    ) -> Result<Vec<NewsRecord>, DatasetError> {
        let csv_error = |source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let headers = reader.headers().map_err(csv_error)?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DatasetError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                });
            }
        }

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let raw = result.map_err(csv_error)?;
            if let Some(size) = raw.iter().map(str::len).max()
                && size > self.max_field_bytes
            {
                return Err(DatasetError::FieldTooLarge {
                    path: path.to_path_buf(),
                    row: row as u64 + 1,
                    size,
                    limit: self.max_field_bytes,
                });
            }

            let mut record: NewsRecord = raw.deserialize(Some(&headers)).map_err(csv_error)?;
            if record.label.trim().is_empty() {
                record.label = label.to_string();
            }
            records.push(record);
        }
        debug!(rows = records.len(), "parsed csv rows");
        Ok(records)
    }
}
