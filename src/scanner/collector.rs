//! The collection loop
//!
//! Drives a [`PageSource`] over every configured pattern, accumulates the
//! records worth keeping, and persists whatever the registry has not seen
//! before.
//!
//! Per pattern, page 0 is fetched first; an empty page 0 skips the pattern.
//! Pages `1..=page_limit` follow until a page comes back without hits. The
//! limit is a hard cap whatever `page_count` the API reports, since the API
//! rejects deeper pagination.

use anyhow::Result;
use chrono::NaiveDateTime;
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::extractor::extract_records;
use super::record_set::RecordSet;
use super::registry::SeenRegistry;
use crate::core::config::SearchConfig;
use crate::core::error::FetchError;
use crate::core::fetcher::{PageResult, PageSource};
use crate::reporting::run_writer::{write_run_output, RunPaths};

/// How paging ended for one pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternOutcome {
    /// Page 0 had no hits
    EmptyFirstPage,
    /// Page `page` had no hits
    Exhausted { page: u32 },
    /// Every page up to the limit had hits
    PageLimit,
    /// Page `page` still failed after all retries
    FetchFailed { page: u32, reason: String },
    /// Shutdown was requested before page `page`
    Interrupted { page: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternReport {
    pub pattern: String,
    /// Pages requested, not counting retries
    pub pages_fetched: u32,
    /// Requests issued, retries included
    pub requests: u32,
    /// Records extracted across all pages, before cross-pattern merging
    pub records: usize,
    pub outcome: PatternOutcome,
}

impl PatternReport {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, PatternOutcome::FetchFailed { .. })
    }
}

/// Everything gathered by one pass over the patterns
#[derive(Debug, Default)]
pub struct Collection {
    pub records: RecordSet,
    pub patterns: Vec<PatternReport>,
    pub interrupted: bool,
}

impl Collection {
    pub fn pages_fetched(&self) -> u32 {
        self.patterns.iter().map(|p| p.pages_fetched).sum()
    }

    pub fn failed_patterns(&self) -> impl Iterator<Item = &PatternReport> {
        self.patterns.iter().filter(|p| p.failed())
    }
}

/// Result of persisting a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Persisted {
    /// CIDs that were not in the registry, in accumulation order
    pub fresh: Vec<String>,
    /// Files written, if anything was fresh
    pub paths: Option<RunPaths>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub collection: Collection,
    pub persisted: Persisted,
}

pub struct Collector<'a, S: PageSource> {
    source: &'a mut S,
    config: &'a SearchConfig,
    shutdown: Option<Arc<AtomicBool>>,
    progress: ProgressBar,
}

impl<'a, S: PageSource> Collector<'a, S> {
    pub fn new(source: &'a mut S, config: &'a SearchConfig) -> Self {
        Self {
            source,
            config,
            shutdown: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Stop fetching once this flag is raised
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    /// Advance this bar once per pattern
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Collect, then persist fresh CIDs under `root` using `now` for naming
    pub fn run(&mut self, root: &Path, now: NaiveDateTime) -> Result<RunSummary> {
        let collection = self.collect();
        let persisted = persist_fresh_records(root, now, &collection.records)?;
        Ok(RunSummary {
            collection,
            persisted,
        })
    }

    /// Query every pattern and accumulate the retained records
    pub fn collect(&mut self) -> Collection {
        let mut collection = Collection::default();
        let config = self.config;

        for pattern in &config.patterns {
            self.progress.set_message(pattern.clone());
            let report = self.collect_pattern(pattern, &mut collection.records);
            self.progress.inc(1);

            let interrupted = matches!(report.outcome, PatternOutcome::Interrupted { .. });
            collection.patterns.push(report);
            if interrupted {
                collection.interrupted = true;
                break;
            }
        }

        collection
    }

    fn collect_pattern(&mut self, pattern: &str, records: &mut RecordSet) -> PatternReport {
        let mut report = PatternReport {
            pattern: pattern.to_string(),
            pages_fetched: 0,
            requests: 0,
            records: 0,
            outcome: PatternOutcome::PageLimit,
        };

        for page in 0..=self.config.page_limit {
            if self.shutdown_requested() {
                report.outcome = PatternOutcome::Interrupted { page };
                break;
            }

            let fetched = self.fetch_with_retries(pattern, page, &mut report.requests);
            report.pages_fetched += 1;

            let page_result = match fetched {
                Ok(page_result) => page_result,
                Err(e) => {
                    report.outcome = PatternOutcome::FetchFailed {
                        page,
                        reason: e.to_string(),
                    };
                    break;
                }
            };

            match extract_records(&page_result) {
                None => {
                    report.outcome = if page == 0 {
                        info!(pattern, "initial page is empty");
                        PatternOutcome::EmptyFirstPage
                    } else {
                        debug!(pattern, page, "page is empty");
                        PatternOutcome::Exhausted { page }
                    };
                    break;
                }
                Some(found) => {
                    debug!(
                        pattern,
                        page,
                        hits = page_result.hits().len(),
                        kept = found.len(),
                        page_count = ?page_result.page_count,
                        "page extracted"
                    );
                    report.records += found.len();
                    records.merge(found);
                }
            }
        }

        info!(
            pattern,
            pages = report.pages_fetched,
            records = report.records,
            outcome = ?report.outcome,
            "pattern done"
        );
        report
    }

    fn fetch_with_retries(
        &mut self,
        pattern: &str,
        page: u32,
        requests: &mut u32,
    ) -> std::result::Result<PageResult, FetchError> {
        let mut attempt = 0;
        loop {
            *requests += 1;
            match self.source.fetch_page(pattern, page) {
                Ok(page_result) => return Ok(page_result),
                Err(e) if attempt < self.config.max_retries && !self.shutdown_requested() => {
                    attempt += 1;
                    info!(pattern, page, attempt, error = %e, "retrying page");
                }
                Err(e) => {
                    warn!(pattern, page, attempts = attempt + 1, error = %e, "giving up on page");
                    return Err(e);
                }
            }
        }
    }
}

/// Persist the part of `records` the registry has not seen
///
/// With nothing fresh, nothing on disk is touched. Otherwise the full record
/// set goes to the run snapshot, the fresh CIDs to the run CID list, and the
/// same CIDs are appended to the registry last.
pub fn persist_fresh_records(
    root: &Path,
    now: NaiveDateTime,
    records: &RecordSet,
) -> Result<Persisted> {
    let mut registry = SeenRegistry::load(root)?;
    let fresh = registry.fresh_ids(records.cids());

    if fresh.is_empty() {
        info!(
            collected = records.len(),
            registry = registry.len(),
            "no fresh CIDs"
        );
        return Ok(Persisted::default());
    }

    let paths = RunPaths::for_time(root, now);
    write_run_output(&paths, records, &fresh)?;
    registry.append(&fresh)?;

    info!(
        fresh = fresh.len(),
        snapshot = %paths.snapshot.display(),
        "recorded fresh CIDs"
    );

    Ok(Persisted {
        fresh,
        paths: Some(paths),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves fixed pages; anything unscripted is an empty page
    struct FixedSource {
        pages: HashMap<(String, u32), PageResult>,
        calls: Vec<(String, u32)>,
    }

    impl FixedSource {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                calls: Vec::new(),
            }
        }

        fn page(mut self, pattern: &str, page: u32, cids: &[&str]) -> Self {
            let hits: Vec<_> = cids
                .iter()
                .map(|cid| json!({"hash": cid, "mimetype": "text/plain"}))
                .collect();
            self.pages.insert(
                (pattern.to_string(), page),
                PageResult {
                    hits: Some(hits),
                    page_count: Some(500),
                },
            );
            self
        }
    }

    impl PageSource for FixedSource {
        fn fetch_page(&mut self, pattern: &str, page: u32) -> std::result::Result<PageResult, FetchError> {
            self.calls.push((pattern.to_string(), page));
            Ok(self
                .pages
                .get(&(pattern.to_string(), page))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn config(patterns: &[&str]) -> SearchConfig {
        SearchConfig {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_pem_example_stops_after_page_one() {
        let mut source = FixedSource::new().page(".pem", 0, &["cidX"]);
        let config = config(&[".pem"]);

        let collection = Collector::new(&mut source, &config).collect();

        assert_eq!(collection.records.cids().collect::<Vec<_>>(), vec!["cidX"]);
        assert_eq!(collection.patterns[0].outcome, PatternOutcome::Exhausted { page: 1 });
        assert_eq!(source.calls, vec![(".pem".to_string(), 0), (".pem".to_string(), 1)]);
    }

    #[test]
    fn test_empty_first_page_skips_pattern() {
        let mut source = FixedSource::new().page("ovpn", 0, &["a"]);
        let config = config(&[".p12", "ovpn"]);

        let collection = Collector::new(&mut source, &config).collect();

        assert_eq!(collection.patterns[0].outcome, PatternOutcome::EmptyFirstPage);
        assert_eq!(collection.patterns[0].pages_fetched, 1);
        assert_eq!(collection.records.len(), 1);
        assert_eq!(source.calls.len(), 3);
    }

    #[test]
    fn test_shutdown_before_first_fetch() {
        let mut source = FixedSource::new().page(".pem", 0, &["a"]);
        let config = config(&[".pem", ".key"]);
        let flag = Arc::new(AtomicBool::new(true));

        let collection = Collector::new(&mut source, &config)
            .with_shutdown_flag(flag)
            .collect();

        assert!(collection.interrupted);
        assert_eq!(collection.patterns.len(), 1);
        assert!(source.calls.is_empty());
    }
}
