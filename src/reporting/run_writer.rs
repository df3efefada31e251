//! Per-run output files

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::scanner::record_set::RecordSet;

/// Where one run's output lands, derived from its reference time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// `{root}/{YYYY-MM-DD}`
    pub day_dir: PathBuf,
    /// `{day_dir}/{YYYY-MM-DD-HH}.json`
    pub snapshot: PathBuf,
    /// `{day_dir}/{YYYY-MM-DD-HH}_cid.txt`
    pub cid_list: PathBuf,
}

impl RunPaths {
    pub fn for_time(root: &Path, at: NaiveDateTime) -> Self {
        let day = at.format("%Y-%m-%d").to_string();
        let hour = at.format("%Y-%m-%d-%H").to_string();
        let day_dir = root.join(&day);

        Self {
            snapshot: day_dir.join(format!("{}.json", hour)),
            cid_list: day_dir.join(format!("{}_cid.txt", hour)),
            day_dir,
        }
    }
}

/// Records already stored in a snapshot; a missing file holds none
pub fn load_snapshot(path: &Path) -> Result<RecordSet> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RecordSet::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read snapshot: {}", path.display()))
        }
    };

    let stored: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

    let mut records = RecordSet::new();
    for (cid, record) in stored {
        records.insert(cid, record);
    }
    Ok(records)
}

/// Write the record set as a compact JSON object
///
/// Records from an earlier run in the same hour are kept: they are loaded
/// first and this run's records are merged over them, so the snapshot only
/// ever grows like the CID list beside it.
pub fn write_snapshot(path: &Path, records: &RecordSet) -> Result<()> {
    let mut merged = load_snapshot(path)?;
    merged.merge(records.clone());

    let file = File::create(path)
        .with_context(|| format!("Failed to create snapshot: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &merged)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Append CIDs to a run's CID list, one per line
///
/// Two runs within the same hour share the list, so it is appended to
/// rather than truncated.
pub fn write_cid_list(path: &Path, cids: &[String]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open CID list: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for cid in cids {
        writeln!(writer, "{}", cid)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write both run files, creating the day directory on demand
pub fn write_run_output(paths: &RunPaths, records: &RecordSet, fresh: &[String]) -> Result<()> {
    fs::create_dir_all(&paths.day_dir)
        .with_context(|| format!("Failed to create {}", paths.day_dir.display()))?;
    write_snapshot(&paths.snapshot, records)?;
    write_cid_list(&paths.cid_list, fresh)?;
    Ok(())
}
