//! Configuration handling for the collector.
//!
//! Everything is read from environment variables with defaults that match a
//! checkout of the dataset next to the binary. `Config::from_env` validates
//! the numeric and boolean values and reports the first bad one.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::archive::{DEFAULT_INDEX_URL, DEFAULT_SNAPSHOT_BASE};
use crate::dataset::platform_field_limit;
use crate::extractor::DEFAULT_SETTLE_DELAY;

/// Environment variable names. Public so the binary and tests can refer to them.
pub const ENV_DATASET_DIR: &str = "DATASET_DIR";
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIR";
pub const ENV_DATA_CHOICES: &str = "DATA_CHOICES";
pub const ENV_COLLECT_CONCURRENCY: &str = "COLLECT_CONCURRENCY";
pub const ENV_SETTLE_DELAY_MS: &str = "SETTLE_DELAY_MS";
pub const ENV_ARCHIVE_INDEX_URL: &str = "ARCHIVE_INDEX_URL";
pub const ENV_ARCHIVE_SNAPSHOT_BASE: &str = "ARCHIVE_SNAPSHOT_BASE";
pub const ENV_ARCHIVE_SCHEMED_URLS: &str = "ARCHIVE_SCHEMED_URLS";
pub const ENV_MAX_FIELD_BYTES: &str = "MAX_FIELD_BYTES";
pub const ENV_SHOW_PROGRESS: &str = "SHOW_PROGRESS";

const DEFAULT_DATASET_DIR: &str = "./dataset";
const DEFAULT_OUTPUT_DIR: &str = "./out";
const DEFAULT_DATA_CHOICES: &str =
    "politifact:fake,politifact:real,gossipcop:fake,gossipcop:real";
const DEFAULT_COLLECT_CONCURRENCY: usize = 1;

/// One (news source, label) pair selecting an input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChoice {
    pub news_source: String,
    pub label: String,
}

impl DataChoice {
    pub fn new(news_source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            news_source: news_source.into(),
            label: label.into(),
        }
    }

    /// `{news_source}_{label}.csv`, shared by the input and output tables.
    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.news_source, self.label)
    }

    /// Parse a comma separated list of `source:label` entries.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ConfigError> {
        let mut choices = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (source, label) = entry
                .split_once(':')
                .map(|(s, l)| (s.trim(), l.trim()))
                .filter(|(s, l)| !s.is_empty() && !l.is_empty())
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: ENV_DATA_CHOICES,
                    reason: format!("'{entry}' is not of the form source:label"),
                })?;
            choices.push(Self::new(source, label));
        }
        if choices.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: ENV_DATA_CHOICES,
                reason: "at least one source:label pair is required".to_string(),
            });
        }
        Ok(choices)
    }
}

/// Collector runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    dataset_dir: PathBuf,
    output_dir: PathBuf,
    data_choices: Vec<DataChoice>,
    concurrency: usize,
    settle_delay: Duration,
    archive_index_url: String,
    archive_snapshot_base: String,
    archive_schemed_urls: bool,
    max_field_bytes: usize,
    show_progress: bool,
}

impl Config {
    /// Create a config with default tuning for the given directories and pairs.
    pub fn new(
        dataset_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        data_choices: Vec<DataChoice>,
    ) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            output_dir: output_dir.into(),
            data_choices,
            concurrency: DEFAULT_COLLECT_CONCURRENCY,
            settle_delay: DEFAULT_SETTLE_DELAY,
            archive_index_url: DEFAULT_INDEX_URL.to_string(),
            archive_snapshot_base: DEFAULT_SNAPSHOT_BASE.to_string(),
            archive_schemed_urls: false,
            max_field_bytes: platform_field_limit(),
            show_progress: true,
        }
    }

    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let dataset_dir = env::var(ENV_DATASET_DIR).unwrap_or_else(|_| DEFAULT_DATASET_DIR.into());
        let output_dir = env::var(ENV_OUTPUT_DIR).unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.into());
        let choices = env::var(ENV_DATA_CHOICES).unwrap_or_else(|_| DEFAULT_DATA_CHOICES.into());

        let mut cfg = Self::new(dataset_dir, output_dir, DataChoice::parse_list(&choices)?);

        if let Some(concurrency) = parse_var::<usize>(ENV_COLLECT_CONCURRENCY)? {
            if concurrency == 0 {
                return Err(ConfigError::InvalidValue {
                    field: ENV_COLLECT_CONCURRENCY,
                    reason: "must be at least 1".to_string(),
                });
            }
            cfg.concurrency = concurrency;
        }
        if let Some(ms) = parse_var::<u64>(ENV_SETTLE_DELAY_MS)? {
            cfg.settle_delay = Duration::from_millis(ms);
        }
        if let Ok(url) = env::var(ENV_ARCHIVE_INDEX_URL) {
            cfg.archive_index_url = url;
        }
        if let Ok(base) = env::var(ENV_ARCHIVE_SNAPSHOT_BASE) {
            cfg.archive_snapshot_base = base;
        }
        if let Some(flag) = parse_bool(ENV_ARCHIVE_SCHEMED_URLS)? {
            cfg.archive_schemed_urls = flag;
        }
        if let Some(limit) = parse_var::<usize>(ENV_MAX_FIELD_BYTES)? {
            cfg.max_field_bytes = limit;
        }
        if let Some(flag) = parse_bool(ENV_SHOW_PROGRESS)? {
            cfg.show_progress = flag;
        }
        Ok(cfg)
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
    pub fn data_choices(&self) -> &[DataChoice] {
        &self.data_choices
    }
    /// Number of records retrieved at once within a pair.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
    /// Pause between downloading a page and parsing it.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
    pub fn archive_index_url(&self) -> &str {
        &self.archive_index_url
    }
    pub fn archive_snapshot_base(&self) -> &str {
        &self.archive_snapshot_base
    }
    pub fn archive_schemed_urls(&self) -> bool {
        self.archive_schemed_urls
    }
    pub fn max_field_bytes(&self) -> usize {
        self.max_field_bytes
    }
    pub fn show_progress(&self) -> bool {
        self.show_progress
    }
}

fn parse_var<T: std::str::FromStr>(field: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    match env::var(field) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field,
                reason: format!("'{raw}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(field: &'static str) -> Result<Option<bool>, ConfigError> {
    let Ok(raw) = env::var(field) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            field,
            reason: format!("'{raw}' is not a boolean"),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
