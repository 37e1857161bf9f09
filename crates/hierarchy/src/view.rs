//! Expand/collapse state and the flattened row list a grid renders.

use crate::node::{Hierarchy, HierarchyNode, NodeLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Set of expanded node keys.
///
/// Keys are path-derived, so expansion survives a rebuild as long as the
/// node still exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<String>,
}

impl ExpansionState {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expanded: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }
}

/// One rendered grid row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRow {
    pub key: String,
    pub level: NodeLevel,
    pub label: String,
    pub depth: usize,
    pub expandable: bool,
    pub expanded: bool,
    pub cell_counts: Vec<usize>,
    pub total: usize,
}

/// Rows in display order: owners always, descendants only under expanded
/// ancestors. Program nodes are leaves.
pub fn visible_rows(hierarchy: &Hierarchy, state: &ExpansionState) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    for owner in &hierarchy.owners {
        push_rows(owner, 0, state, &mut rows);
    }
    rows
}

fn push_rows(node: &HierarchyNode, depth: usize, state: &ExpansionState, rows: &mut Vec<VisibleRow>) {
    let expandable = node.level != NodeLevel::Program && !node.children().is_empty();
    let expanded = expandable && state.is_expanded(&node.key);

    rows.push(VisibleRow {
        key: node.key.clone(),
        level: node.level,
        label: node.label.clone(),
        depth,
        expandable,
        expanded,
        cell_counts: node.cell_counts.clone(),
        total: node.total,
    });

    if expanded {
        for child in node.children() {
            push_rows(child, depth + 1, state, rows);
        }
    }
}
