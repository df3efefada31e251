//! Run output and summaries

pub mod run_writer;
pub mod summary;

pub use run_writer::{load_snapshot, write_cid_list, write_run_output, write_snapshot, RunPaths};
pub use summary::write_summary;
