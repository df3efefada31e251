//! Insertion-ordered CID → record map

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// File records keyed by content identifier
///
/// Iteration follows first-insertion order. Inserting a CID that is already
/// present replaces its record in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cid: String, record: Value) {
        match self.index.get(&cid) {
            Some(&pos) => self.entries[pos].1 = record,
            None => {
                self.index.insert(cid.clone(), self.entries.len());
                self.entries.push((cid, record));
            }
        }
    }

    /// Merge another set into this one, later records winning
    pub fn merge(&mut self, other: RecordSet) {
        for (cid, record) in other.entries {
            self.insert(cid, record);
        }
    }

    pub fn get(&self, cid: &str) -> Option<&Value> {
        self.index.get(cid).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, cid: &str) -> bool {
        self.index.contains_key(cid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(cid, _)| cid.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(cid, record)| (cid.as_str(), record))
    }
}

impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (cid, record) in &self.entries {
            map.serialize_entry(cid, record)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reinsert_keeps_position() {
        let mut set = RecordSet::new();
        set.insert("b".into(), json!({"size": 1}));
        set.insert("a".into(), json!({"size": 2}));
        set.insert("b".into(), json!({"size": 3}));

        assert_eq!(set.len(), 2);
        assert_eq!(set.cids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(set.get("b").unwrap()["size"], 3);
    }

    #[test]
    fn test_merge_appends_new_and_overwrites_existing() {
        let mut acc = RecordSet::new();
        acc.insert("x".into(), json!(1));

        let mut page = RecordSet::new();
        page.insert("y".into(), json!(2));
        page.insert("x".into(), json!(3));
        acc.merge(page);

        assert_eq!(acc.cids().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(acc.get("x"), Some(&json!(3)));
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let mut set = RecordSet::new();
        set.insert("zeta".into(), json!({"mimetype": null}));
        set.insert("alpha".into(), json!({"mimetype": "text/plain"}));

        let text = serde_json::to_string(&set).unwrap();
        assert_eq!(
            text,
            r#"{"zeta":{"mimetype":null},"alpha":{"mimetype":"text/plain"}}"#
        );
    }
}
