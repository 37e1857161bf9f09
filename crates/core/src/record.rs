//! Record types shared by the fetch pipeline and the hierarchy builder.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-record key/value data fetched in the enrichment pass.
///
/// Keys are the endpoint's attribute identifiers. Only four of them carry
/// meaning for grouping (see [`AttributeFieldMap`]); the rest are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, String>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or an empty string when absent.
    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A primary record as listed by the endpoint, before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryRecord {
    pub id: String,
    pub title: String,
    /// Owner identifier, empty when unassigned
    pub owner: String,
    /// Creation timestamp as reported by the endpoint
    pub created_at: String,
    pub attributes: AttributeSet,
}

/// Identifier to display-name table for record owners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable(HashMap<String, String>);

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.0.insert(id.into(), name.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Display name for `id`, falling back to the raw identifier.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Attribute keys that carry grouping semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFieldMap {
    #[serde(default = "default_event_time_key")]
    pub event_time: String,
    #[serde(default = "default_country_key")]
    pub country: String,
    #[serde(default = "default_program_key")]
    pub program: String,
    #[serde(default = "default_eligibility_key")]
    pub eligibility: String,
}

fn default_event_time_key() -> String {
    "15".to_string()
}

fn default_country_key() -> String {
    "53".to_string()
}

fn default_program_key() -> String {
    "52".to_string()
}

fn default_eligibility_key() -> String {
    "6".to_string()
}

impl Default for AttributeFieldMap {
    fn default() -> Self {
        Self {
            event_time: default_event_time_key(),
            country: default_country_key(),
            program: default_program_key(),
            eligibility: default_eligibility_key(),
        }
    }
}

/// A primary record joined with its attributes and owner display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub id: String,
    pub title: String,
    /// Owner display name (raw identifier when the lookup had no entry)
    pub owner: String,
    pub owner_id: String,
    pub created_at: String,
    pub event_time: String,
    pub country: String,
    pub program: String,
    pub eligibility: String,
    pub attributes: AttributeSet,
}

impl EnrichedRecord {
    /// Joins `record` with its attribute set and owner lookup.
    pub fn from_parts(
        record: PrimaryRecord,
        attributes: AttributeSet,
        lookup: &LookupTable,
        fields: &AttributeFieldMap,
    ) -> Self {
        let owner = lookup.resolve(&record.owner).to_string();
        Self {
            event_time: attributes.get_or_empty(&fields.event_time),
            country: attributes.get_or_empty(&fields.country),
            program: attributes.get_or_empty(&fields.program),
            eligibility: attributes.get_or_empty(&fields.eligibility),
            id: record.id,
            title: record.title,
            owner,
            owner_id: record.owner,
            created_at: record.created_at,
            attributes,
        }
    }
}
