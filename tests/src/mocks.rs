//! Mock implementations for testing.

use async_trait::async_trait;
use crm_client::RemoteEndpoint;
use engine_core::{Error, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory CRM.
///
/// Implements the same `RemoteEndpoint` trait as the real `HttpEndpoint`
/// and serves users, deals, and attribute listings from memory, paging
/// with the `limit` and `offset` query parameters.
#[derive(Clone, Default)]
pub struct MockEndpoint {
    users: Arc<Mutex<Vec<Value>>>,
    deals: Arc<Mutex<Vec<Value>>>,
    attributes: Arc<Mutex<HashMap<String, Value>>>,
    /// Identifiers whose attribute fetch answers 500
    failing_ids: Arc<Mutex<Vec<String>>>,
    /// Every call fails with a transport error if set.
    should_fail: Arc<Mutex<bool>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: Value) {
        self.users.lock().push(user);
    }

    /// Add a deal and its attribute listing.
    pub fn add_deal(&self, deal: Value, attributes: Value) {
        if let Some(id) = deal["id"].as_str() {
            self.attributes.lock().insert(id.to_string(), attributes);
        }
        self.deals.lock().push(deal);
    }

    pub fn fail_attributes_for(&self, id: &str) {
        self.failing_ids.lock().push(id.to_string());
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock() = should_fail;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn page(rows: &[Value], path: &str) -> Vec<Value> {
        let limit = query_usize(path, "limit").unwrap_or(100);
        let offset = query_usize(path, "offset").unwrap_or(0);
        rows.iter().skip(offset).take(limit).cloned().collect()
    }
}

#[async_trait]
impl RemoteEndpoint for MockEndpoint {
    async fn fetch(&self, path: &str) -> Result<Value> {
        self.calls.lock().push(path.to_string());

        if *self.should_fail.lock() {
            return Err(Error::transport("mock endpoint unreachable"));
        }

        if path.starts_with("/api/3/users") {
            return Ok(json!({ "users": Self::page(&self.users.lock(), path) }));
        }

        if let Some(rest) = path.strip_prefix("/api/3/deals/") {
            let id = rest.split('/').next().unwrap_or_default();
            if self.failing_ids.lock().iter().any(|f| f == id) {
                return Err(Error::status(500, "API Error: 500 Internal Server Error"));
            }
            return self
                .attributes
                .lock()
                .get(id)
                .cloned()
                .ok_or_else(|| Error::status(404, "API Error: 404 Not Found"));
        }

        if path.starts_with("/api/3/deals") {
            let deals = self.deals.lock();
            return Ok(json!({
                "deals": Self::page(&deals, path),
                "meta": { "total": deals.len().to_string() }
            }));
        }

        Err(Error::status(404, "API Error: 404 Not Found"))
    }
}

fn query_usize(path: &str, name: &str) -> Option<usize> {
    let needle = format!("{}=", name);
    path.split(['?', '&'])
        .find_map(|pair| pair.strip_prefix(needle.as_str()))
        .and_then(|v| v.parse().ok())
}
