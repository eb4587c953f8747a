//! Multi-stage article retrieval.
//!
//! A url is tried at its origin first. Schemeless urls get two origin
//! attempts (`http://` then `https://`) and, if both fail, one attempt
//! against the first snapshot the web archive lists. Urls that already carry a
//! scheme get a single origin attempt; whether they may also use the archive
//! is governed by [`FallbackPolicy`].
//!
//! Failures at any stage are logged and move the retrieval to its next
//! stage. Running out of stages is a normal outcome, reported as `None`.

use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

use crate::archive::SnapshotResolver;
use crate::extractor::{ArticleResult, ContentExtractor, ExtractError};

/// Whether a url that already has a scheme may fall back to the archive.
///
/// Off by default: only schemeless urls reach the archive stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub archive_schemed_urls: bool,
}

/// A url as it appears in the dataset, classified by whether it carries a scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetUrl {
    Schemed(String),
    Schemeless {
        /// Exactly as given; this is what the archive is asked about.
        original: String,
        /// Leading path separator removed; protocol prefixes are added to this.
        normalized: String,
    },
    Blank,
}

impl TargetUrl {
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }
        let has_scheme = Url::parse(trimmed).map(|u| u.has_host()).unwrap_or(false);
        if has_scheme {
            return Self::Schemed(trimmed.to_string());
        }
        let normalized = trimmed.strip_prefix('/').unwrap_or(trimmed).to_string();
        if normalized.is_empty() {
            return Self::Blank;
        }
        Self::Schemeless {
            original: trimmed.to_string(),
            normalized,
        }
    }

    fn archive_key(&self) -> Option<&str> {
        match self {
            Self::Schemed(url) => Some(url),
            Self::Schemeless { original, .. } => Some(original),
            Self::Blank => None,
        }
    }
}

/// One step of the fallback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AsGiven,
    PlainHttp,
    SecureHttp,
    Archive,
    Exhausted,
}

impl Stage {
    pub fn first(target: &TargetUrl) -> Self {
        match target {
            TargetUrl::Schemed(_) => Self::AsGiven,
            TargetUrl::Schemeless { .. } => Self::PlainHttp,
            TargetUrl::Blank => Self::Exhausted,
        }
    }

    /// Successor after this stage failed.
    pub fn next(self, policy: FallbackPolicy) -> Self {
        match self {
            Self::PlainHttp => Self::SecureHttp,
            Self::SecureHttp => Self::Archive,
            Self::AsGiven if policy.archive_schemed_urls => Self::Archive,
            Self::AsGiven | Self::Archive | Self::Exhausted => Self::Exhausted,
        }
    }

    /// The origin url this stage downloads, if it is an origin stage.
    fn origin_url(self, target: &TargetUrl) -> Option<String> {
        match (self, target) {
            (Self::AsGiven, TargetUrl::Schemed(url)) => Some(url.clone()),
            (Self::PlainHttp, TargetUrl::Schemeless { normalized, .. }) => {
                Some(format!("http://{normalized}"))
            }
            (Self::SecureHttp, TargetUrl::Schemeless { normalized, .. }) => {
                Some(format!("https://{normalized}"))
            }
            _ => None,
        }
    }
}

pub struct ArticleRetriever {
    extractor: Arc<dyn ContentExtractor>,
    archive: Arc<dyn SnapshotResolver>,
    policy: FallbackPolicy,
}

impl ArticleRetriever {
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        archive: Arc<dyn SnapshotResolver>,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            extractor,
            archive,
            policy,
        }
    }

    /// Walk the fallback stages until one yields an article.
    pub async fn retrieve(&self, url: &str) -> Option<ArticleResult> {
        let span = info_span!("retrieve", url = %url);
        self.run_stages(url).instrument(span).await
    }

    async fn run_stages(&self, url: &str) -> Option<ArticleResult> {
        let target = TargetUrl::classify(url);
        let mut stage = Stage::first(&target);

        loop {
            let outcome = match stage {
                Stage::Exhausted => {
                    info!("no content obtainable from origin or archive");
                    return None;
                }
                Stage::Archive => self.attempt_archive(&target).await,
                origin => match origin.origin_url(&target) {
                    Some(candidate) => self.attempt(origin, &candidate).await,
                    None => None,
                },
            };

            if let Some(article) = outcome {
                debug!(?stage, source_url = %article.source_url, "retrieved article");
                return Some(article);
            }
            stage = stage.next(self.policy);
        }
    }

    async fn attempt(&self, stage: Stage, candidate: &str) -> Option<ArticleResult> {
        match self.extractor.download_and_parse(candidate).await {
            Ok(article) => Some(article),
            Err(ExtractError::Download(e)) => {
                warn!(?stage, url = %candidate, kind = e.kind(), error = %e, "download failed");
                None
            }
            Err(e @ ExtractError::Parse { .. }) => {
                warn!(?stage, url = %candidate, error = %e, "parse failed");
                None
            }
        }
    }

    async fn attempt_archive(&self, target: &TargetUrl) -> Option<ArticleResult> {
        let key = target.archive_key()?;
        let Some(snapshot) = self.archive.resolve(key).await else {
            debug!(url = %key, "archive unavailable");
            return None;
        };
        debug!(url = %key, archived_url = %snapshot.archived_url, timestamp = %snapshot.timestamp, "trying archive snapshot");
        self.attempt(Stage::Archive, &snapshot.archived_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveSnapshot, MockSnapshotResolver};
    use crate::fetcher::FetchError;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    fn article(url: &str, text: &str) -> ArticleResult {
        ArticleResult {
            source_url: url.to_string(),
            text: text.to_string(),
            title: "Title".to_string(),
            authors: vec![],
            keywords: vec![],
            images: vec![],
            top_image: None,
            canonical_link: None,
            meta_data: BTreeMap::new(),
            movies: vec![],
            publish_date: None,
            source: String::new(),
            summary: String::new(),
            language: None,
        }
    }

    /// Succeeds only for the urls it was given; records every call.
    #[derive(Default)]
    struct ScriptedExtractor {
        pages: HashMap<String, ArticleResult>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedExtractor {
        fn with(urls: &[&str]) -> Self {
            Self {
                pages: urls
                    .iter()
                    .map(|u| (u.to_string(), article(u, &format!("text from {u}"))))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentExtractor for ScriptedExtractor {
        async fn download_and_parse(&self, url: &str) -> Result<ArticleResult, ExtractError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(article) => Ok(article.clone()),
                None if url.contains("unparseable") => Err(ExtractError::Parse {
                    url: url.to_string(),
                }),
                None => Err(ExtractError::Download(FetchError::Dns(format!(
                    "cannot resolve {url}"
                )))),
            }
        }
    }

    fn no_archive() -> MockSnapshotResolver {
        let mut archive = MockSnapshotResolver::new();
        archive.expect_resolve().times(0);
        archive
    }

    fn archive_returning(expected: &'static str, snapshot: Option<ArchiveSnapshot>) -> MockSnapshotResolver {
        let mut archive = MockSnapshotResolver::new();
        archive
            .expect_resolve()
            .withf(move |url| url.to_string() == expected)
            .times(1)
            .return_const(snapshot);
        archive
    }

    fn retriever(
        extractor: Arc<ScriptedExtractor>,
        archive: MockSnapshotResolver,
        policy: FallbackPolicy,
    ) -> ArticleRetriever {
        ArticleRetriever::new(extractor, Arc::new(archive), policy)
    }

    #[test]
    fn classify_urls() {
        assert_eq!(
            TargetUrl::classify("https://example.com/a"),
            TargetUrl::Schemed("https://example.com/a".to_string())
        );
        assert_eq!(
            TargetUrl::classify("/example.com/a"),
            TargetUrl::Schemeless {
                original: "/example.com/a".to_string(),
                normalized: "example.com/a".to_string(),
            }
        );
        assert!(matches!(
            TargetUrl::classify("localhost:8080/a"),
            TargetUrl::Schemeless { .. }
        ));
        assert_eq!(TargetUrl::classify("   "), TargetUrl::Blank);
        assert_eq!(TargetUrl::classify("/"), TargetUrl::Blank);
    }

    #[test]
    fn stage_transitions() {
        let schemeless = TargetUrl::classify("example.com/a");
        let schemed = TargetUrl::classify("http://example.com/a");
        let default = FallbackPolicy::default();
        let permissive = FallbackPolicy {
            archive_schemed_urls: true,
        };

        assert_eq!(Stage::first(&schemeless), Stage::PlainHttp);
        assert_eq!(Stage::PlainHttp.next(default), Stage::SecureHttp);
        assert_eq!(Stage::SecureHttp.next(default), Stage::Archive);
        assert_eq!(Stage::Archive.next(default), Stage::Exhausted);

        assert_eq!(Stage::first(&schemed), Stage::AsGiven);
        assert_eq!(Stage::AsGiven.next(default), Stage::Exhausted);
        assert_eq!(Stage::AsGiven.next(permissive), Stage::Archive);
        assert_eq!(Stage::Exhausted.next(permissive), Stage::Exhausted);
    }

    #[tokio::test]
    async fn plain_http_success_stops_immediately() {
        let extractor = Arc::new(ScriptedExtractor::with(&["http://example.com/a"]));
        let r = retriever(extractor.clone(), no_archive(), FallbackPolicy::default());

        let result = r.retrieve("example.com/a").await.unwrap();
        assert_eq!(result.source_url, "http://example.com/a");
        assert_eq!(extractor.calls(), vec!["http://example.com/a"]);
    }

    #[tokio::test]
    async fn https_fallback_without_archive() {
        let extractor = Arc::new(ScriptedExtractor::with(&["https://example.com/a"]));
        let r = retriever(extractor.clone(), no_archive(), FallbackPolicy::default());

        let result = r.retrieve("example.com/a").await.unwrap();
        assert_eq!(result.source_url, "https://example.com/a");
        assert_eq!(
            extractor.calls(),
            vec!["http://example.com/a", "https://example.com/a"]
        );
    }

    #[tokio::test]
    async fn leading_slash_is_stripped_before_prefixing() {
        let extractor = Arc::new(ScriptedExtractor::with(&["http://example.com/a"]));
        let r = retriever(extractor.clone(), no_archive(), FallbackPolicy::default());

        assert!(r.retrieve("/example.com/a").await.is_some());
        assert_eq!(extractor.calls(), vec!["http://example.com/a"]);
    }

    #[tokio::test]
    async fn schemeless_falls_back_to_archive_with_original_url() {
        let archived = "https://web.archive.org/web/20170101000000/http://example.com/a";
        let extractor = Arc::new(ScriptedExtractor::with(&[archived]));
        let archive = archive_returning(
            "/example.com/a",
            Some(ArchiveSnapshot {
                timestamp: "20170101000000".to_string(),
                archived_url: archived.to_string(),
            }),
        );
        let r = retriever(extractor.clone(), archive, FallbackPolicy::default());

        let result = r.retrieve("/example.com/a").await.unwrap();
        assert_eq!(result.source_url, archived);
        assert_eq!(
            extractor.calls(),
            vec!["http://example.com/a", "https://example.com/a", archived]
        );
    }

    #[tokio::test]
    async fn archive_unavailable_is_absent() {
        let extractor = Arc::new(ScriptedExtractor::default());
        let archive = archive_returning("example.com/a", None);
        let r = retriever(extractor.clone(), archive, FallbackPolicy::default());

        assert!(r.retrieve("example.com/a").await.is_none());
        assert_eq!(extractor.calls().len(), 2);
    }

    #[tokio::test]
    async fn archive_snapshot_is_tried_once() {
        let extractor = Arc::new(ScriptedExtractor::default());
        let archive = archive_returning(
            "example.com/a",
            Some(ArchiveSnapshot {
                timestamp: "20170101000000".to_string(),
                archived_url: "https://web.archive.org/web/20170101000000/example.com/a".to_string(),
            }),
        );
        let r = retriever(extractor.clone(), archive, FallbackPolicy::default());

        assert!(r.retrieve("example.com/a").await.is_none());
        assert_eq!(extractor.calls().len(), 3);
    }

    #[tokio::test]
    async fn schemed_failure_skips_archive_by_default() {
        let extractor = Arc::new(ScriptedExtractor::default());
        let r = retriever(extractor.clone(), no_archive(), FallbackPolicy::default());

        assert!(r.retrieve("https://example.com/gone").await.is_none());
        assert_eq!(extractor.calls(), vec!["https://example.com/gone"]);
    }

    #[tokio::test]
    async fn schemed_failure_uses_archive_when_enabled() {
        let archived = "https://web.archive.org/web/2019/https://example.com/gone";
        let extractor = Arc::new(ScriptedExtractor::with(&[archived]));
        let archive = archive_returning(
            "https://example.com/gone",
            Some(ArchiveSnapshot {
                timestamp: "2019".to_string(),
                archived_url: archived.to_string(),
            }),
        );
        let policy = FallbackPolicy {
            archive_schemed_urls: true,
        };
        let r = retriever(extractor.clone(), archive, policy);

        assert!(r.retrieve("https://example.com/gone").await.is_some());
        assert_eq!(extractor.calls(), vec!["https://example.com/gone", archived]);
    }

    #[tokio::test]
    async fn parse_failure_counts_as_failed_attempt() {
        let extractor = Arc::new(ScriptedExtractor::with(&["https://unparseable.example.com/a"]));
        // the https page exists but the http one cannot be parsed
        let r = retriever(extractor.clone(), no_archive(), FallbackPolicy::default());

        let result = r.retrieve("unparseable.example.com/a").await.unwrap();
        assert_eq!(result.source_url, "https://unparseable.example.com/a");
    }

    #[tokio::test]
    async fn blank_url_makes_no_attempts() {
        let extractor = Arc::new(ScriptedExtractor::default());
        let r = retriever(extractor.clone(), no_archive(), FallbackPolicy::default());

        assert!(r.retrieve("  ").await.is_none());
        assert!(extractor.calls().is_empty());
    }
}
