//! Builds the owner → country → program tree.
//!
//! Steps, in order: filter records to the date window, normalize program
//! labels, group, sort every level, then aggregate cell counts bottom-up.
//! The builder only reads its inputs; the same inputs always produce the
//! same tree.

use crate::node::{Hierarchy, HierarchyNode, NodeContent, NodeLevel};
use crate::normalize::NormalizationRules;
use chrono::NaiveDate;
use engine_core::{parse_event_time, DateColumn, EnrichedRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Owner label for records without an owner.
pub const UNASSIGNED_OWNER: &str = "Unassigned";

/// Country label for records without a country.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Hierarchy builder configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Owner identifier whose records are left out entirely
    #[serde(default)]
    pub system_owner: Option<String>,
    #[serde(default)]
    pub rules: NormalizationRules,
}

/// Groups enriched records for a set of date columns.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    config: HierarchyConfig,
}

impl HierarchyBuilder {
    pub fn new(config: HierarchyConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, records: &[EnrichedRecord], columns: &[DateColumn]) -> Hierarchy {
        let mut owners: Vec<HierarchyNode> = Vec::new();
        let mut included = 0usize;

        for record in records {
            if !self.is_included(record, columns) {
                continue;
            }
            included += 1;

            let owner_label = label_or(&record.owner, UNASSIGNED_OWNER);
            let country_label = label_or(&record.country, UNKNOWN_COUNTRY);
            let program_label = self.config.rules.program_label(
                &record.country,
                &record.program,
                &record.eligibility,
            );

            let owner = child_entry(&mut owners, None, NodeLevel::Owner, owner_label);
            let country = match &mut owner.content {
                NodeContent::Children(countries) => {
                    let parent = owner.key.clone();
                    child_entry(countries, Some(parent.as_str()), NodeLevel::Country, country_label)
                }
                NodeContent::Records(_) => continue,
            };
            let program = match &mut country.content {
                NodeContent::Children(programs) => {
                    let parent = country.key.clone();
                    child_entry(programs, Some(parent.as_str()), NodeLevel::Program, &program_label)
                }
                NodeContent::Records(_) => continue,
            };
            if let NodeContent::Records(members) = &mut program.content {
                members.push(record.clone());
            }
        }

        sort_siblings(&mut owners);
        for owner in owners.iter_mut() {
            finalize(owner, columns);
        }

        let column_totals: Vec<usize> = (0..columns.len())
            .map(|i| owners.iter().map(|owner| owner.cell_counts[i]).sum())
            .collect();
        let total = column_totals.iter().sum();

        debug!(
            records = records.len(),
            included,
            owners = owners.len(),
            columns = columns.len(),
            "Built hierarchy"
        );

        Hierarchy {
            columns: columns.to_vec(),
            owners,
            column_totals,
            total,
        }
    }

    fn is_included(&self, record: &EnrichedRecord, columns: &[DateColumn]) -> bool {
        if let Some(ref system_owner) = self.config.system_owner {
            if &record.owner_id == system_owner {
                return false;
            }
        }
        match event_date(record) {
            Some(date) => columns.iter().any(|column| column.date == date),
            None => false,
        }
    }
}

fn event_date(record: &EnrichedRecord) -> Option<NaiveDate> {
    parse_event_time(&record.event_time).date()
}

fn label_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

fn node_key(parent: Option<&str>, level: NodeLevel, label: &str) -> String {
    match (parent, level) {
        (None, _) | (_, NodeLevel::Owner) => format!("owner-{}", label),
        (Some(parent), NodeLevel::Country) => format!("{}-country-{}", parent, label),
        (Some(parent), NodeLevel::Program) => format!("{}-program-{}", parent, label),
    }
}

/// The sibling labelled `label`, created on first encounter.
fn child_entry<'a>(
    siblings: &'a mut Vec<HierarchyNode>,
    parent: Option<&str>,
    level: NodeLevel,
    label: &str,
) -> &'a mut HierarchyNode {
    let index = match siblings.iter().position(|node| node.label == label) {
        Some(index) => index,
        None => {
            siblings.push(HierarchyNode::new(level, node_key(parent, level, label), label));
            siblings.len() - 1
        }
    };
    &mut siblings[index]
}

/// Label order used at every level.
///
/// Letters compare without accents or case first (`Álvaro` sorts with `a`),
/// then unaccented before accented, then lowercase before uppercase.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Lowercase with diacritics stripped.
fn base_letters(label: &str) -> String {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Stable sort of sibling nodes by label; equal labels keep insertion order.
pub fn sort_siblings(nodes: &mut [HierarchyNode]) {
    nodes.sort_by(|a, b| compare_labels(&a.label, &b.label));
}

/// Sort children and members, then compute cell counts bottom-up.
fn finalize(node: &mut HierarchyNode, columns: &[DateColumn]) {
    node.cell_counts = match &mut node.content {
        NodeContent::Children(children) => {
            sort_siblings(children);
            for child in children.iter_mut() {
                finalize(child, columns);
            }
            (0..columns.len())
                .map(|i| children.iter().map(|child| child.cell_counts[i]).sum())
                .collect()
        }
        NodeContent::Records(members) => {
            members.sort_by(|a, b| {
                a.event_time
                    .cmp(&b.event_time)
                    .then_with(|| a.id.cmp(&b.id))
            });
            let dates: Vec<Option<NaiveDate>> = members.iter().map(event_date).collect();
            columns
                .iter()
                .map(|column| dates.iter().filter(|d| **d == Some(column.date)).count())
                .collect()
        }
    };
    node.total = node.cell_counts.iter().sum();
}
