//! Remote endpoint configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// CRM endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL, e.g. `https://account.api-us1.com`
    pub base_url: String,
    /// Value of the `Api-Token` header (optional when a proxy injects it)
    #[serde(default)]
    pub api_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Path of the paginated user listing
    #[serde(default = "default_users_path")]
    pub users_path: String,
    /// Path of the paginated primary record listing
    #[serde(default = "default_records_path")]
    pub records_path: String,
    /// Per-record attribute path, `{id}` is replaced by the record identifier
    #[serde(default = "default_attributes_path")]
    pub attributes_path: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_users_path() -> String {
    "/api/3/users".to_string()
}

fn default_records_path() -> String {
    "/api/3/deals".to_string()
}

fn default_attributes_path() -> String {
    "/api/3/deals/{id}/dealCustomFieldData".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
            users_path: default_users_path(),
            records_path: default_records_path(),
            attributes_path: default_attributes_path(),
        }
    }
}

impl EndpointConfig {
    /// One page of the user listing.
    pub fn lookup_page(&self, limit: usize, offset: usize) -> String {
        format!("{}?limit={}&offset={}", self.users_path, limit, offset)
    }

    /// One page of primary records created after `created_after`, newest first.
    pub fn records_page(&self, limit: usize, offset: usize, created_after: NaiveDate) -> String {
        format!(
            "{}?limit={}&offset={}&orders[cdate]=DESC&filters[cdate_after]={}",
            self.records_path,
            limit,
            offset,
            created_after.format("%Y-%m-%d")
        )
    }

    /// Attribute sub-resource of one record.
    pub fn attributes(&self, id: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        self.attributes_path.replace("{id}", &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = EndpointConfig::default();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert_eq!(config.lookup_page(100, 200), "/api/3/users?limit=100&offset=200");
        assert_eq!(
            config.records_page(100, 0, date),
            "/api/3/deals?limit=100&offset=0&orders[cdate]=DESC&filters[cdate_after]=2025-03-01"
        );
        assert_eq!(
            config.attributes("4821"),
            "/api/3/deals/4821/dealCustomFieldData"
        );
    }

    #[test]
    fn test_attribute_id_is_encoded() {
        let config = EndpointConfig::default();
        assert_eq!(
            config.attributes("a/b c"),
            "/api/3/deals/a%2Fb+c/dealCustomFieldData"
        );
    }
}
