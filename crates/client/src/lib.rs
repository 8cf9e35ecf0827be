//! Network side of gleaner.
//!
//! This crate provides page discovery, the concurrent fetch pipeline, content
//! extraction, and the orchestrator shared by the server and CLI.

pub mod discovery;
pub mod extract;
pub mod fetch;
pub mod pipeline;

pub use discovery::{Discovery, DiscoveryConfig, SearchHit, WebDiscovery};
pub use extract::{ExtractConfig, Extractor, ReadableExtractor, normalize_text};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, FetchResult, PageFetcher, PageFetcherConfig};
pub use pipeline::{Orchestrator, PipelineConfig, SearchOutcome, consolidate, count_sections};
