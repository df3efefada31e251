//! Persistent registry of every CID reported so far
//!
//! The registry is a plain text file with one CID per line. It is only ever
//! appended to. There is no file locking: a single process is assumed to own
//! the output root at any time, and two concurrent runs against the same
//! root can report the same CID twice.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const REGISTRY_FILE_NAME: &str = "all_files_cid.txt";

#[derive(Debug)]
pub struct SeenRegistry {
    path: PathBuf,
    seen: HashSet<String>,
    // last line on disk was left unterminated
    needs_newline: bool,
}

impl SeenRegistry {
    /// Location of the registry under an output root
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(REGISTRY_FILE_NAME)
    }

    /// Load the registry under `root`; a missing file is an empty registry
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_in(root);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read registry: {}", path.display()))
            }
        };

        let seen = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        let needs_newline = !content.is_empty() && !content.ends_with('\n');

        Ok(Self {
            path,
            seen,
            needs_newline,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, cid: &str) -> bool {
        self.seen.contains(cid)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// CIDs not yet in the registry, in the order given
    pub fn fresh_ids<'a, I>(&self, cids: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut emitted = HashSet::new();
        cids.into_iter()
            .filter(|cid| !self.seen.contains(*cid) && emitted.insert(*cid))
            .map(str::to_string)
            .collect()
    }

    /// Append CIDs to the registry file, creating it if needed
    pub fn append(&mut self, cids: &[String]) -> Result<()> {
        if cids.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open registry: {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        if self.needs_newline {
            writeln!(writer)?;
        }
        for cid in cids {
            writeln!(writer, "{}", cid)?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write registry: {}", self.path.display()))?;

        self.needs_newline = false;
        self.seen.extend(cids.iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_registry_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SeenRegistry::load(temp_dir.path()).unwrap();
        assert!(registry.is_empty());
        assert!(!registry.path().exists());
    }

    #[test]
    fn test_load_ignores_blank_lines_and_whitespace() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(SeenRegistry::path_in(temp_dir.path()), "cidA\n\n  cidB \r\n").unwrap();

        let registry = SeenRegistry::load(temp_dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("cidA"));
        assert!(registry.contains("cidB"));
    }

    #[test]
    fn test_fresh_ids_keep_input_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(SeenRegistry::path_in(temp_dir.path()), "A\nB\n").unwrap();
        let registry = SeenRegistry::load(temp_dir.path()).unwrap();

        let fresh = registry.fresh_ids(["A", "C", "D"]);
        assert_eq!(fresh, vec!["C", "D"]);
    }

    #[test]
    fn test_append_only_grows_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(SeenRegistry::path_in(temp_dir.path()), "A\n").unwrap();

        let mut registry = SeenRegistry::load(temp_dir.path()).unwrap();
        registry.append(&["B".to_string(), "C".to_string()]).unwrap();
        assert!(registry.contains("C"));

        let content = fs::read_to_string(registry.path()).unwrap();
        assert_eq!(content, "A\nB\nC\n");
    }

    #[test]
    fn test_append_after_unterminated_line() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(SeenRegistry::path_in(temp_dir.path()), "A").unwrap();

        let mut registry = SeenRegistry::load(temp_dir.path()).unwrap();
        registry.append(&["B".to_string()]).unwrap();

        let content = fs::read_to_string(registry.path()).unwrap();
        assert_eq!(content, "A\nB\n");
    }

    #[test]
    fn test_append_nothing_does_not_create_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = SeenRegistry::load(temp_dir.path()).unwrap();
        registry.append(&[]).unwrap();
        assert!(!registry.path().exists());
    }
}
