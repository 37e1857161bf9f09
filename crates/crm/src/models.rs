//! Wire shapes of the CRM listings.
//!
//! The CRM is loose about types: identifiers and totals show up as either
//! strings or numbers, and most text fields may be `null`. The deserializers
//! here normalize all of that to plain strings.

use engine_core::{AttributeSet, Error, PrimaryRecord, Result};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// One page of the user listing.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersPage {
    #[serde(default)]
    pub users: Vec<UserRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
}

impl UserRow {
    /// `"{first} {last}"` trimmed, or `"User {id}"` when both are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            format!("User {}", self.id)
        } else {
            full.to_string()
        }
    }
}

/// One page of the primary record listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsPage {
    #[serde(default, rename = "deals")]
    pub records: Vec<RecordRow>,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    /// Total rows matching the filter, when the endpoint reports it
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordRow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub owner: String,
    #[serde(default, rename = "cdate", deserialize_with = "lenient_string")]
    pub created_at: String,
}

impl From<RecordRow> for PrimaryRecord {
    fn from(row: RecordRow) -> Self {
        PrimaryRecord {
            id: row.id,
            title: row.title,
            owner: row.owner,
            created_at: row.created_at,
            attributes: AttributeSet::new(),
        }
    }
}

/// Attribute values of one record.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributesPage {
    #[serde(default, rename = "dealCustomFieldData")]
    pub fields: Vec<AttributeRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeRow {
    #[serde(rename = "customFieldId", deserialize_with = "string_or_number")]
    pub key: String,
    #[serde(default, rename = "fieldValue")]
    pub value: Value,
}

impl AttributesPage {
    /// Collapse into an [`AttributeSet`], dropping `null` values.
    pub fn into_attribute_set(self) -> AttributeSet {
        self.fields
            .into_iter()
            .filter_map(|row| value_to_string(row.value).map(|value| (row.key, value)))
            .collect()
    }
}

/// Decode a JSON body into one of the page types.
pub fn decode<T: DeserializeOwned>(body: Value, what: &str) -> Result<T> {
    serde_json::from_value(body).map_err(|e| Error::decode(format!("unexpected {} shape: {}", what, e)))
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<usize>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
