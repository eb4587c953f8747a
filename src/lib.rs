pub mod archive;
pub mod collector;
pub mod config;
pub mod dataset;
pub mod extractor;
pub mod fetcher;
pub mod retriever;
pub mod telemetry;
