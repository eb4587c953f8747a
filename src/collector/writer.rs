use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::dataset::NewsRecord;

use super::CollectError;

/// Header of every output table; `H` holds the article text or the sentinel.
pub const OUTPUT_HEADER: [&str; 5] = ["id", "news_url", "title", "H", "tweet_ids"];

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    id: &'a str,
    news_url: &'a str,
    title: &'a str,
    #[serde(rename = "H")]
    content: &'a str,
    tweet_ids: &'a str,
}

impl<'a> From<&'a NewsRecord> for OutputRow<'a> {
    fn from(record: &'a NewsRecord) -> Self {
        Self {
            id: &record.id,
            news_url: &record.news_url,
            title: &record.title,
            content: record.content(),
            tweet_ids: &record.tweet_ids,
        }
    }
}

/// Appends one fully formed row at a time and flushes after each, so a run
/// that dies midway leaves every finished row on disk.
pub struct RowWriter<W: Write> {
    inner: csv::Writer<W>,
    path: PathBuf,
    rows: u64,
}

impl RowWriter<File> {
    /// Truncate or create `path` and write the header row.
    pub fn create(path: &Path) -> Result<Self, CollectError> {
        let file = File::create(path).map_err(|source| CollectError::Output {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(file, path)
    }
}

impl<W: Write> RowWriter<W> {
    pub fn new(writer: W, path: &Path) -> Result<Self, CollectError> {
        let inner = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        let mut this = Self {
            inner,
            path: path.to_path_buf(),
            rows: 0,
        };
        this.inner.write_record(OUTPUT_HEADER)?;
        this.flush()?;
        Ok(this)
    }

    pub fn append(&mut self, record: &NewsRecord) -> Result<(), CollectError> {
        self.inner.serialize(OutputRow::from(record))?;
        self.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far, header excluded.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, CollectError> {
        let path = self.path;
        self.inner.into_inner().map_err(|e| CollectError::Output {
            path,
            source: e.into_error(),
        })
    }

    fn flush(&mut self) -> Result<(), CollectError> {
        self.inner.flush().map_err(|source| CollectError::Output {
            path: self.path.clone(),
            source,
        })
    }
}
