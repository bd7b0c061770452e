//! Entity store: named, typed collections of string values extracted from
//! evidence and fed forward as context for later plan steps.
//!
//! Merge semantics are append-new-only: values already present for a type are
//! never re-added, so merging the same extraction twice is a no-op. After
//! every merge each type's list is truncated to a fixed cap to bound prompt
//! growth in later steps.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Mapping from entity-type name to an ordered, deduplicated list of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMap(HashMap<String, Vec<String>>);

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity_type: &str) -> Option<&Vec<String>> {
        self.0.get(entity_type)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entity types from `required` that are absent or empty in the store.
    pub fn missing_from(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|t| self.get(t).is_none_or(|v| v.is_empty()))
            .cloned()
            .collect()
    }

    /// Merge newly extracted values, appending only values not already
    /// present for their type (exact string equality, first-seen order),
    /// then truncate each touched type's list to `cap`.
    pub fn merge(&mut self, extracted: HashMap<String, Vec<String>>, cap: usize) {
        for (entity_type, values) in extracted {
            let existing = self.0.entry(entity_type).or_default();
            for value in values {
                if !existing.contains(&value) {
                    existing.push(value);
                }
            }
            existing.truncate(cap);
        }
    }

    /// Render the context block appended to a step goal during expansion:
    /// one numbered list per required entity type, list order preserved.
    ///
    /// The caller must have checked [`Self::missing_from`] first; unknown
    /// types render as empty blocks rather than panicking.
    pub fn context_block(&self, required: &[String]) -> String {
        let mut blocks = Vec::with_capacity(required.len());
        for entity_type in required {
            let mut block = format!("Context for entity type {entity_type}:\n");
            if let Some(values) = self.get(entity_type) {
                for (i, value) in values.iter().enumerate() {
                    block.push_str(&format!("{}. {}\n", i + 1, value));
                }
            }
            blocks.push(block);
        }
        blocks.join("\n\n")
    }
}

/// Deduplicate values per type by exact string equality, preserving
/// first-seen order. Applied to raw extraction output before merging.
pub fn dedupe_extracted(raw: HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
    raw.into_iter()
        .map(|(entity_type, values)| {
            let mut seen = Vec::with_capacity(values.len());
            for v in values {
                if !seen.contains(&v) {
                    seen.push(v);
                }
            }
            (entity_type, seen)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(t, vs)| {
                (
                    t.to_string(),
                    vs.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    #[test]
    fn merge_appends_only_new_values_in_order() {
        let mut map = EntityMap::new();
        map.merge(extraction(&[("trails", &["a", "b"])]), 10);
        map.merge(extraction(&[("trails", &["b", "c"])]), 10);

        assert_eq!(
            map.get("trails").unwrap(),
            &vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let mut map = EntityMap::new();
        let ex = extraction(&[("trails", &["a", "b"]), ("regions", &["x"])]);
        map.merge(ex.clone(), 10);
        let snapshot = map.clone();
        map.merge(ex, 10);
        assert_eq!(map, snapshot, "second merge of the same set must be a no-op");
    }

    #[test]
    fn merge_caps_each_type_after_merging() {
        let mut map = EntityMap::new();
        map.merge(
            extraction(&[("n", &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"])]),
            10,
        );
        assert_eq!(map.get("n").unwrap().len(), 10);
        assert_eq!(map.get("n").unwrap()[9], "10");
    }

    #[test]
    fn missing_from_reports_absent_and_empty_types() {
        let mut map = EntityMap::new();
        map.merge(extraction(&[("present", &["v"]), ("empty", &[])]), 10);

        let required = vec![
            "present".to_string(),
            "empty".to_string(),
            "absent".to_string(),
        ];
        assert_eq!(map.missing_from(&required), vec!["empty", "absent"]);
    }

    #[test]
    fn context_block_numbers_values_per_type() {
        let mut map = EntityMap::new();
        map.merge(extraction(&[("trails", &["Johnson Mountain", "Jungle Creek"])]), 10);

        let block = map.context_block(&["trails".to_string()]);
        assert!(block.contains("Context for entity type trails:"));
        assert!(block.contains("1. Johnson Mountain"));
        assert!(block.contains("2. Jungle Creek"));
    }

    #[test]
    fn dedupe_extracted_keeps_first_seen_order() {
        let deduped = dedupe_extracted(extraction(&[("t", &["b", "a", "b", "a", "c"])]));
        assert_eq!(
            deduped.get("t").unwrap(),
            &vec!["b".to_string(), "a".to_string(), "c".to_string()]
        );
    }
}
