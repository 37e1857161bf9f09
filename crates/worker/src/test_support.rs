//! Scripted endpoint for pipeline unit tests.

use async_trait::async_trait;
use crm_client::{EndpointConfig, RateLimitConfig, RateLimiter, RemoteEndpoint};
use engine_core::{ProgressEvent, ProgressSink, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::context::FetchContext;

type Handler = dyn Fn(&str) -> Result<Value> + Send + Sync;

/// Answers every path with a closure and records the calls.
pub struct FnEndpoint {
    handler: Box<Handler>,
    pub calls: Mutex<Vec<String>>,
}

impl FnEndpoint {
    pub fn new(handler: impl Fn(&str) -> Result<Value> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RemoteEndpoint for FnEndpoint {
    async fn fetch(&self, path: &str) -> Result<Value> {
        self.calls.lock().push(path.to_string());
        (self.handler)(path)
    }
}

pub fn context(endpoint: Arc<FnEndpoint>) -> FetchContext {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        rate: 100,
        max_in_flight: 20,
    }));
    FetchContext::new(endpoint, limiter, EndpointConfig::default())
}

/// Integer query parameter of `path`, 0 when absent.
pub fn query_usize(path: &str, name: &str) -> usize {
    let needle = format!("{}=", name);
    path.split(['?', '&'])
        .find_map(|pair| pair.strip_prefix(needle.as_str()))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

pub fn users_page(from: usize, count: usize) -> Value {
    let users: Vec<Value> = (from..from + count)
        .map(|i| json!({"id": i.to_string(), "firstName": format!("User{i}"), "lastName": "Test"}))
        .collect();
    json!({ "users": users })
}

pub fn deals_page(from: usize, count: usize, total: Option<usize>) -> Value {
    let deals: Vec<Value> = (from..from + count)
        .map(|i| json!({"id": i.to_string(), "title": format!("Deal {i}"), "owner": "1", "cdate": "2025-03-09T10:00:00-05:00"}))
        .collect();
    match total {
        Some(total) => json!({ "deals": deals, "meta": { "total": total.to_string() } }),
        None => json!({ "deals": deals }),
    }
}

/// Progress sink that keeps every event.
pub fn collector() -> (Arc<dyn ProgressSink>, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();
    let sink: Arc<dyn ProgressSink> = Arc::new(move |event: ProgressEvent| {
        sink_events.lock().push(event);
    });
    (sink, events)
}
