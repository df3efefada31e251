//! CID Harvester Library
//!
//! Queries the ipfs-search API for files that look like secret material and
//! keeps a persistent, append-only record of every content identifier seen.

pub mod core;
pub mod scanner;
pub mod reporting;

pub use crate::core::config;
pub use crate::scanner::collector;
pub use crate::reporting::run_writer;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::core::config::{load_config, SearchConfig};
    pub use crate::core::error::FetchError;
    pub use crate::core::fetcher::{HttpPageSource, PageResult, PageSource};
    pub use crate::core::query::{build_search_url, QueryKind};
    pub use crate::scanner::collector::{
        persist_fresh_records, Collection, Collector, PatternOutcome, PatternReport, Persisted,
        RunSummary,
    };
    pub use crate::scanner::extractor::{extract_records, is_retained_mimetype};
    pub use crate::scanner::record_set::RecordSet;
    pub use crate::scanner::registry::SeenRegistry;
    pub use crate::reporting::run_writer::RunPaths;
    pub use crate::reporting::summary::write_summary;
}
