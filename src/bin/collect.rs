use anyhow::Result;
use newsgather::{
    archive::WaybackResolver,
    collector::Collector,
    config::Config,
    dataset::DatasetLoader,
    extractor::ReadabilityExtractor,
    retriever::{ArticleRetriever, FallbackPolicy},
    telemetry,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = telemetry::init()?;

    let config = Config::from_env()?;
    info!(
        dataset_dir = %config.dataset_dir().display(),
        output_dir = %config.output_dir().display(),
        pairs = config.data_choices().len(),
        concurrency = config.concurrency(),
        "starting data collection"
    );

    let extractor = Arc::new(ReadabilityExtractor::new(config.settle_delay()));
    let archive = Arc::new(WaybackResolver::new(
        config.archive_index_url(),
        config.archive_snapshot_base(),
    ));
    let policy = FallbackPolicy {
        archive_schemed_urls: config.archive_schemed_urls(),
    };
    let retriever = Arc::new(ArticleRetriever::new(extractor, archive, policy));

    let loader =
        DatasetLoader::new(config.dataset_dir()).with_max_field_bytes(config.max_field_bytes());
    let collector = Collector::new(retriever, loader, config.output_dir())
        .with_concurrency(config.concurrency())
        .with_progress(config.show_progress());

    let started = std::time::Instant::now();
    let results = collector.collect_all(config.data_choices()).await;

    let mut failed = 0;
    for (choice, result) in &results {
        match result {
            Ok(summary) => info!(
                source = %choice.news_source,
                label = %choice.label,
                path = %summary.output_path.display(),
                rows = summary.rows,
                with_content = summary.with_content,
                sentinel = summary.sentinel,
                "pair complete"
            ),
            Err(_) => failed += 1,
        }
    }
    if failed > 0 {
        warn!(failed, total = results.len(), "some pairs could not be collected");
    }
    info!(elapsed_secs = started.elapsed().as_secs_f64(), "data collection finished");

    Ok(())
}
