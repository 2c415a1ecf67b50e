//! Column discovery
//!
//! The first pass of the CSV path. Every record is expanded once and the
//! dynamic keys of every row are collected into a [`KeyAccumulator`], which
//! is then frozen into a [`ColumnPlan`]: the header plus the key order used to
//! lay out every row.

use crate::flatten::layouts::RowLayout;
use crate::flatten::types::{ColumnGroup, FlattenConfig, Row, RowDraft};
use crate::source::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

static NON_WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Distinct dynamic keys seen so far, one sorted set per column group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyAccumulator {
    groups: Vec<BTreeSet<String>>,
}

impl KeyAccumulator {
    pub fn new(group_count: usize) -> Self {
        KeyAccumulator {
            groups: vec![BTreeSet::new(); group_count],
        }
    }

    pub fn insert(&mut self, group: usize, key: &str) {
        if group >= self.groups.len() {
            self.groups.resize_with(group + 1, BTreeSet::new);
        }
        if !self.groups[group].contains(key) {
            self.groups[group].insert(key.to_string());
        }
    }

    /// Collect the dynamic keys of one row
    pub fn observe(&mut self, draft: &RowDraft) {
        for (group, values) in draft.dynamic.iter().enumerate() {
            for key in values.keys() {
                self.insert(group, key);
            }
        }
    }

    /// Fold another partial accumulator into this one
    pub fn merge(&mut self, other: KeyAccumulator) {
        for (group, keys) in other.groups.into_iter().enumerate() {
            if group >= self.groups.len() {
                self.groups.resize_with(group + 1, BTreeSet::new);
            }
            self.groups[group].extend(keys);
        }
    }

    /// Keys of one group in ascending byte order
    pub fn keys(&self, group: usize) -> Vec<&str> {
        self.groups
            .get(group)
            .map(|keys| keys.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Freeze the accumulated keys into a column layout
    pub fn into_plan(
        self,
        fixed: &[&str],
        groups: &[ColumnGroup],
        sanitize_keys: bool,
    ) -> ColumnPlan {
        let mut namer = ColumnNamer::default();

        for name in fixed {
            namer.push((*name).to_string());
        }

        let mut sets = self.groups.into_iter();
        let mut keys = Vec::with_capacity(groups.len());
        for group in groups {
            let group_keys: Vec<String> = sets.next().unwrap_or_default().into_iter().collect();
            for key in &group_keys {
                let mut name = format!("{}{}", group.prefix, key);
                if sanitize_keys {
                    name = sanitize(&name);
                }
                namer.push(name);
            }
            keys.push(group_keys);
        }

        ColumnPlan {
            header: namer.header,
            fixed_len: fixed.len(),
            keys,
            collisions: namer.collisions,
        }
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`
pub fn sanitize(name: &str) -> String {
    NON_WORD_REGEX.replace_all(name, "_").into_owned()
}

/// A column whose name was already taken and had to be renamed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub original: String,
    pub renamed: String,
}

#[derive(Default)]
struct ColumnNamer {
    header: Vec<String>,
    seen: HashSet<String>,
    collisions: Vec<Collision>,
}

impl ColumnNamer {
    fn push(&mut self, name: String) {
        let name = if self.seen.contains(&name) {
            let mut n = 2;
            let renamed = loop {
                let candidate = format!("{}__{}", name, n);
                if !self.seen.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            };
            warn!(column = %name, renamed = %renamed, "Column name collision, keeping both columns");
            self.collisions.push(Collision {
                original: name,
                renamed: renamed.clone(),
            });
            renamed
        } else {
            name
        };

        self.seen.insert(name.clone());
        self.header.push(name);
    }
}

/// The frozen column layout of one CSV output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    header: Vec<String>,
    fixed_len: usize,
    keys: Vec<Vec<String>>,
    collisions: Vec<Collision>,
}

impl ColumnPlan {
    /// Discover the columns of a record sequence under a layout
    ///
    /// Records that fail to expand contribute no keys; they are reported
    /// again when rows are projected.
    pub fn discover(records: &[Record], layout: &dyn RowLayout, config: &FlattenConfig) -> Self {
        let mut keys = KeyAccumulator::new(layout.groups().len());
        for record in records {
            layout.collect_keys(record, &mut keys);
        }
        keys.into_plan(&layout.fixed_columns(), layout.groups(), config.sanitize_keys)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Discovered keys of one group, in column order
    pub fn keys(&self, group: usize) -> &[String] {
        self.keys.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Lay out a draft as a full-width row
    ///
    /// A key missing from the draft yields an empty cell in its column.
    pub fn assemble(&self, draft: RowDraft) -> Row {
        let RowDraft { mut fixed, mut dynamic } = draft;
        debug_assert_eq!(fixed.len(), self.fixed_len, "layout produced a short row");
        fixed.resize(self.fixed_len, String::new());

        let mut row = fixed;
        row.reserve(self.width() - self.fixed_len);
        for (group, keys) in self.keys.iter().enumerate() {
            let mut values = dynamic.get_mut(group);
            for key in keys {
                let cell = values
                    .as_mut()
                    .and_then(|values| values.remove(key))
                    .unwrap_or_default();
                row.push(cell);
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const PAYLOAD: ColumnGroup = ColumnGroup {
        name: "payload",
        prefix: "payload_",
    };

    fn draft(fixed: &[&str], values: &[(&str, &str)]) -> RowDraft {
        let values: BTreeMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RowDraft::new(fixed.iter().map(|s| s.to_string()).collect()).with_group(values)
    }

    #[test]
    fn test_keys_are_sorted_bytewise() {
        let mut keys = KeyAccumulator::new(1);
        for key in ["b", "a", "B", "_x", "a"] {
            keys.insert(0, key);
        }
        assert_eq!(keys.keys(0), vec!["B", "_x", "a", "b"]);
    }

    #[test]
    fn test_merge_partial_accumulators() {
        let mut left = KeyAccumulator::new(2);
        left.insert(0, "a");
        let mut right = KeyAccumulator::new(2);
        right.insert(0, "c");
        right.insert(1, "z");

        left.merge(right);
        assert_eq!(left.keys(0), vec!["a", "c"]);
        assert_eq!(left.keys(1), vec!["z"]);
    }

    #[test]
    fn test_missing_keys_become_empty_cells() {
        let mut keys = KeyAccumulator::new(1);
        keys.observe(&draft(&["r1"], &[("a", "1")]));
        keys.observe(&draft(&["r2"], &[("b", "x")]));
        keys.observe(&draft(&["r3"], &[("a", "2"), ("c", "true")]));

        let plan = keys.into_plan(&["id"], &[PAYLOAD], false);
        assert_eq!(plan.header(), ["id", "payload_a", "payload_b", "payload_c"]);

        let row = plan.assemble(draft(&["r2"], &[("b", "x")]));
        assert_eq!(row, vec!["r2", "", "x", ""]);
        assert_eq!(row.len(), plan.width());
    }

    #[test]
    fn test_empty_input_yields_fixed_header() {
        let plan = KeyAccumulator::new(1).into_plan(&["id", "name"], &[PAYLOAD], false);
        assert_eq!(plan.header(), ["id", "name"]);
        assert!(plan.keys(0).is_empty());
    }

    #[test]
    fn test_sanitized_collision_keeps_both_columns() {
        let mut keys = KeyAccumulator::new(1);
        keys.insert(0, "screen name");
        keys.insert(0, "screen.name");

        let plan = keys.into_plan(&["id"], &[PAYLOAD], true);
        assert_eq!(
            plan.header(),
            ["id", "payload_screen_name", "payload_screen_name__2"]
        );
        assert_eq!(plan.collisions().len(), 1);
        assert_eq!(plan.collisions()[0].original, "payload_screen_name");

        let row = plan.assemble(draft(&["1"], &[("screen name", "a"), ("screen.name", "b")]));
        assert_eq!(row, vec!["1", "a", "b"]);
    }

    #[test]
    fn test_collision_with_fixed_column() {
        let generic = ColumnGroup {
            name: "fields",
            prefix: "",
        };
        let mut keys = KeyAccumulator::new(1);
        keys.insert(0, "_raw");

        let plan = keys.into_plan(&["_raw"], &[generic], false);
        assert_eq!(plan.header(), ["_raw", "_raw__2"]);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("param_a-b.c d"), "param_a_b_c_d");
        assert_eq!(sanitize("plain_key1"), "plain_key1");
    }
}
