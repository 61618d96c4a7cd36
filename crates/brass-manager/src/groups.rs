//! Group tree flattening.
//!
//! A group's effective middleware list is its parent's effective list
//! followed by its own entries, applied recursively down the tree. The
//! result is a flat name → lists table; names are resolved against the
//! registry only at bind time.

use std::collections::HashMap;

use tracing::debug;

use crate::metadata::PluginGroup;

/// Effective middleware names of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMiddlewares {
    pub pre: Vec<String>,
    pub mid: Vec<String>,
}

impl GroupMiddlewares {
    fn inherit(parent: &Self, group: &PluginGroup) -> Self {
        Self {
            pre: parent
                .pre
                .iter()
                .chain(&group.pre_handlers)
                .cloned()
                .collect(),
            mid: parent
                .mid
                .iter()
                .chain(&group.mid_handlers)
                .cloned()
                .collect(),
        }
    }
}

/// Flat lookup of every group in one or more trees.
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    groups: HashMap<String, GroupMiddlewares>,
}

/// Flattens a list of group trees into a new table.
pub fn resolve_groups(groups: &[PluginGroup]) -> GroupTable {
    let mut table = GroupTable::default();
    table.extend_from(groups);
    table
}

impl GroupTable {
    /// Adds more group trees to the table.
    ///
    /// Names are global across all trees ever added; a repeated name
    /// replaces the earlier entry.
    pub fn extend_from(&mut self, groups: &[PluginGroup]) {
        let root = GroupMiddlewares::default();
        for group in groups {
            self.flatten(group, &root);
        }
    }

    fn flatten(&mut self, group: &PluginGroup, parent: &GroupMiddlewares) {
        let resolved = GroupMiddlewares::inherit(parent, group);
        if self
            .groups
            .insert(group.name.clone(), resolved.clone())
            .is_some()
        {
            debug!(group = %group.name, "Group redeclared, replacing earlier entry");
        }
        for child in &group.sub_groups {
            self.flatten(child, &resolved);
        }
    }

    pub fn get(&self, name: &str) -> Option<&GroupMiddlewares> {
        self.groups.get(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, pre: &[&str], mid: &[&str], sub_groups: Vec<PluginGroup>) -> PluginGroup {
        PluginGroup {
            name: name.to_string(),
            pre_handlers: pre.iter().map(|s| s.to_string()).collect(),
            mid_handlers: mid.iter().map(|s| s.to_string()).collect(),
            sub_groups,
        }
    }

    #[test]
    fn test_inheritance_accumulates_down_the_tree() {
        let tree = group(
            "root",
            &["A"],
            &["X"],
            vec![group(
                "child",
                &["B"],
                &[],
                vec![group("grandchild", &["C"], &["Z"], vec![])],
            )],
        );
        let table = resolve_groups(&[tree]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("root").unwrap().pre, vec!["A"]);
        assert_eq!(table.get("child").unwrap().pre, vec!["A", "B"]);
        assert_eq!(table.get("child").unwrap().mid, vec!["X"]);
        let grandchild = table.get("grandchild").unwrap();
        assert_eq!(grandchild.pre, vec!["A", "B", "C"]);
        assert_eq!(grandchild.mid, vec!["X", "Z"]);
    }

    #[test]
    fn test_siblings_do_not_see_each_other() {
        let tree = group(
            "root",
            &["A"],
            &[],
            vec![
                group("left", &["L"], &[], vec![]),
                group("right", &["R"], &[], vec![]),
            ],
        );
        let table = resolve_groups(&[tree]);
        assert_eq!(table.get("left").unwrap().pre, vec!["A", "L"]);
        assert_eq!(table.get("right").unwrap().pre, vec!["A", "R"]);
    }

    #[test]
    fn test_declared_lists_are_left_untouched() {
        let tree = group("root", &["A"], &[], vec![group("child", &["B"], &[], vec![])]);
        let table = resolve_groups(std::slice::from_ref(&tree));
        assert_eq!(table.get("child").unwrap().pre, vec!["A", "B"]);
        assert_eq!(tree.sub_groups[0].pre_handlers, vec!["B"]);
    }

    #[test]
    fn test_name_collision_later_wins() {
        let first = group("dup", &["first"], &[], vec![]);
        let second = group(
            "other",
            &["O"],
            &[],
            vec![group("dup", &["second"], &[], vec![])],
        );
        let mut table = resolve_groups(&[first]);
        table.extend_from(&[second]);
        assert_eq!(table.get("dup").unwrap().pre, vec!["O", "second"]);
        assert!(table.get("missing").is_none());
    }
}
