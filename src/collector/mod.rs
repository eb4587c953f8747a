//! Drives retrieval over a dataset and streams the enriched rows to disk.
//!
//! Records are retrieved through an ordered, bounded pipeline: up to
//! `concurrency` retrievals run at once, but results come back in input
//! order, so a single writer appends each row as soon as it is ready.

pub mod writer;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span};

use crate::config::DataChoice;
use crate::dataset::{DatasetError, DatasetLoader, NewsRecord};
use crate::retriever::ArticleRetriever;

pub use writer::{OUTPUT_HEADER, RowWriter};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode output row: {0}")]
    Csv(#[from] csv::Error),
}

/// What one (source, label) run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub output_path: PathBuf,
    pub rows: u64,
    pub with_content: u64,
    pub sentinel: u64,
}

pub struct Collector {
    retriever: Arc<ArticleRetriever>,
    loader: DatasetLoader,
    output_dir: PathBuf,
    concurrency: usize,
    show_progress: bool,
}

impl Collector {
    pub fn new(
        retriever: Arc<ArticleRetriever>,
        loader: DatasetLoader,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            retriever,
            loader,
            output_dir: output_dir.into(),
            concurrency: 1,
            show_progress: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn output_path(&self, choice: &DataChoice) -> PathBuf {
        self.output_dir.join(choice.file_name())
    }

    /// Retrieve content for every record and write `{source}_{label}.csv`.
    ///
    /// Every input record yields exactly one output row, in input order.
    pub async fn collect(
        &self,
        records: Vec<NewsRecord>,
        source: &str,
        label: &str,
    ) -> Result<CollectSummary, CollectError> {
        let span = info_span!("collect", source = %source, label = %label);
        self.collect_inner(records, &DataChoice::new(source, label))
            .instrument(span)
            .await
    }

    async fn collect_inner(
        &self,
        records: Vec<NewsRecord>,
        choice: &DataChoice,
    ) -> Result<CollectSummary, CollectError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| CollectError::Output {
            path: self.output_dir.clone(),
            source,
        })?;
        let output_path = self.output_path(choice);
        let mut writer = RowWriter::create(&output_path)?;
        let progress = self.progress_bar(records.len() as u64, choice);

        info!(path = %output_path.display(), records = records.len(), concurrency = self.concurrency, "collecting");

        let retriever = &self.retriever;
        let enriched = stream::iter(records)
            .map(|mut record| async move {
                let article = retriever.retrieve(&record.news_url).await;
                record.attach_content(article.map(|a| a.text));
                record
            })
            .buffered(self.concurrency);
        let mut enriched = std::pin::pin!(enriched);

        let mut summary = CollectSummary {
            output_path,
            ..Default::default()
        };
        while let Some(record) = enriched.next().await {
            writer.append(&record)?;
            if record.has_content() {
                summary.with_content += 1;
            } else {
                summary.sentinel += 1;
            }
            progress.inc(1);
        }
        summary.rows = writer.rows();
        progress.finish_and_clear();

        info!(
            rows = summary.rows,
            with_content = summary.with_content,
            sentinel = summary.sentinel,
            "collection finished"
        );
        Ok(summary)
    }

    /// Load one pair from the dataset directory and collect it.
    pub async fn collect_choice(&self, choice: &DataChoice) -> Result<CollectSummary, CollectError> {
        let records = self.loader.load(choice)?;
        self.collect(records, &choice.news_source, &choice.label).await
    }

    /// Collect every pair in turn. A failed pair is logged and does not
    /// stop the others.
    pub async fn collect_all(
        &self,
        choices: &[DataChoice],
    ) -> Vec<(DataChoice, Result<CollectSummary, CollectError>)> {
        let mut results = Vec::with_capacity(choices.len());
        for choice in choices {
            let result = self.collect_choice(choice).await;
            if let Err(e) = &result {
                error!(source = %choice.news_source, label = %choice.label, error = %e, "collection failed for pair");
            }
            results.push((choice.clone(), result));
        }
        results
    }

    fn progress_bar(&self, len: u64, choice: &DataChoice) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        bar.set_message(format!("{}_{}", choice.news_source, choice.label));
        bar
    }
}
