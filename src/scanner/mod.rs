//! Record extraction, accumulation and deduplication

pub mod collector;
pub mod extractor;
pub mod record_set;
pub mod registry;

pub use collector::{
    persist_fresh_records, Collection, Collector, PatternOutcome, PatternReport, Persisted,
    RunSummary,
};
pub use extractor::{extract_records, is_retained_mimetype};
pub use record_set::RecordSet;
pub use registry::SeenRegistry;
