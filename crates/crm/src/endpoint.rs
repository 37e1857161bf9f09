//! The remote data endpoint seam.

use async_trait::async_trait;
use engine_core::Result;
use serde_json::Value;

/// Stateless request/response boundary to the CRM.
///
/// Implemented by [`crate::HttpEndpoint`] in production and by scripted
/// mocks in tests.
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    /// Fetch `path` (relative to the endpoint root, query string included)
    /// and return the decoded JSON body.
    async fn fetch(&self, path: &str) -> Result<Value>;
}
