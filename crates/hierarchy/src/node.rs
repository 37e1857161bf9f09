//! Hierarchy tree types.

use chrono::NaiveDate;
use engine_core::{parse_event_time, DateColumn, EnrichedRecord};
use serde::{Deserialize, Serialize};

/// Tree level of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeLevel {
    Owner,
    Country,
    Program,
}

/// What a node holds: child nodes (owner, country) or member records (program).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeContent {
    Children(Vec<HierarchyNode>),
    Records(Vec<EnrichedRecord>),
}

/// One owner, country, or program row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Stable path-derived key, unique within the tree
    pub key: String,
    pub level: NodeLevel,
    pub label: String,
    pub content: NodeContent,
    /// One count per date column, same order as [`Hierarchy::columns`]
    pub cell_counts: Vec<usize>,
    /// Sum of `cell_counts`
    pub total: usize,
}

impl HierarchyNode {
    pub(crate) fn new(level: NodeLevel, key: String, label: &str) -> Self {
        let content = match level {
            NodeLevel::Program => NodeContent::Records(Vec::new()),
            NodeLevel::Owner | NodeLevel::Country => NodeContent::Children(Vec::new()),
        };
        Self {
            key,
            level,
            label: label.to_string(),
            content,
            cell_counts: Vec::new(),
            total: 0,
        }
    }

    /// Child nodes; empty for program nodes.
    pub fn children(&self) -> &[HierarchyNode] {
        match &self.content {
            NodeContent::Children(children) => children,
            NodeContent::Records(_) => &[],
        }
    }

    /// Member records; empty for owner and country nodes.
    pub fn records(&self) -> &[EnrichedRecord] {
        match &self.content {
            NodeContent::Records(records) => records,
            NodeContent::Children(_) => &[],
        }
    }

    /// Member records whose event falls on `date`.
    pub fn records_on(&self, date: NaiveDate) -> Vec<&EnrichedRecord> {
        self.records()
            .iter()
            .filter(|record| parse_event_time(&record.event_time).date() == Some(date))
            .collect()
    }

    /// Depth-first search for `key` in this subtree.
    pub fn find(&self, key: &str) -> Option<&HierarchyNode> {
        if self.key == key {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(key))
    }
}

/// The grouped, aggregated result for one set of date columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub columns: Vec<DateColumn>,
    pub owners: Vec<HierarchyNode>,
    /// Whole-tree count per column
    pub column_totals: Vec<usize>,
    pub total: usize,
}

impl Hierarchy {
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn find(&self, key: &str) -> Option<&HierarchyNode> {
        self.owners.iter().find_map(|owner| owner.find(key))
    }

    /// Records in one cell: program node `key` on column `date`.
    pub fn cell(&self, key: &str, date: NaiveDate) -> Option<Vec<&EnrichedRecord>> {
        self.find(key)
            .filter(|node| node.level == NodeLevel::Program)
            .map(|node| node.records_on(date))
    }
}
