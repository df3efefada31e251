//! End-of-run summary

use anyhow::Result;
use std::io::Write;

use crate::scanner::collector::{PatternOutcome, RunSummary};

/// Write a human-readable summary of a run
pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> Result<()> {
    let collection = &summary.collection;
    let persisted = &summary.persisted;

    writeln!(out, "==================================================")?;
    if collection.interrupted {
        writeln!(out, "COLLECTION INTERRUPTED")?;
    } else {
        writeln!(out, "COLLECTION COMPLETE")?;
    }
    writeln!(out, "==================================================")?;
    writeln!(out, "Patterns queried: {}", collection.patterns.len())?;
    writeln!(out, "Pages fetched: {}", collection.pages_fetched())?;
    writeln!(out, "Records collected: {}", collection.records.len())?;
    writeln!(out, "Fresh CIDs: {}", persisted.fresh.len())?;

    let failed: Vec<_> = collection.failed_patterns().collect();
    if !failed.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed patterns:")?;
        for report in failed {
            if let PatternOutcome::FetchFailed { page, reason } = &report.outcome {
                writeln!(out, "  {} (page {}): {}", report.pattern, page, reason)?;
            }
        }
    }

    writeln!(out)?;
    match &persisted.paths {
        Some(paths) => {
            writeln!(out, "Snapshot saved to: {}", paths.snapshot.display())?;
            writeln!(out, "Fresh CIDs saved to: {}", paths.cid_list.display())?;
        }
        None => writeln!(out, "Nothing new, no files written")?,
    }

    Ok(())
}
