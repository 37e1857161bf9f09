//! Handles shared by every fetch phase of one pipeline.

use crm_client::{EndpointConfig, RemoteEndpoint, SharedRateLimiter};
use engine_core::Result;
use serde_json::Value;
use std::sync::Arc;

/// Endpoint, limiter, and path layout; cheap to clone into worker tasks.
#[derive(Clone)]
pub struct FetchContext {
    pub endpoint: Arc<dyn RemoteEndpoint>,
    pub limiter: SharedRateLimiter,
    pub paths: Arc<EndpointConfig>,
}

impl FetchContext {
    pub fn new(
        endpoint: Arc<dyn RemoteEndpoint>,
        limiter: SharedRateLimiter,
        paths: EndpointConfig,
    ) -> Self {
        Self {
            endpoint,
            limiter,
            paths: Arc::new(paths),
        }
    }

    /// Fetch `path` through the rate limiter.
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.limiter.throttle(|| self.endpoint.fetch(path)).await
    }
}
