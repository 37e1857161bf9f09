//! Common test setup functions.

use api::{router, state::AppState};
use axum::Router;
use crm_client::{EndpointConfig, RemoteEndpoint};
use engine_core::AttributeFieldMap;
use hierarchy::{HierarchyBuilder, HierarchyConfig};
use std::sync::Arc;
use worker::{FetchConfig, FetchPipeline, RefreshCoordinator};

use crate::fixtures::today;
use crate::mocks::MockEndpoint;

/// Test context with an in-memory CRM.
///
/// Uses the real Axum router, the real fetch pipeline, and the real refresh
/// coordinator; only the remote endpoint is mocked.
pub struct TestContext {
    pub endpoint: Arc<MockEndpoint>,
    pub coordinator: Arc<RefreshCoordinator>,
    pub router: Router,
}

impl TestContext {
    /// Create a new test context with an empty CRM.
    pub fn new() -> Self {
        Self::with_hierarchy_config(HierarchyConfig::default())
    }

    pub fn with_hierarchy_config(config: HierarchyConfig) -> Self {
        let endpoint = Arc::new(MockEndpoint::new());
        let pipeline = FetchPipeline::new(
            endpoint.clone() as Arc<dyn RemoteEndpoint>,
            EndpointConfig::default(),
            FetchConfig {
                rate_limit: 100,
                ..FetchConfig::default()
            },
            AttributeFieldMap::default(),
        );
        let coordinator = Arc::new(RefreshCoordinator::new(pipeline));
        let state = AppState::new(
            coordinator.clone(),
            HierarchyBuilder::new(config),
            engine_core::limits::DEFAULT_WINDOW_DAYS,
        )
        .with_fixed_today(today());

        Self {
            endpoint,
            coordinator,
            router: router(state),
        }
    }

    /// Run a refresh to completion, panicking on failure.
    pub async fn refresh(&self) {
        self.coordinator
            .refresh()
            .await
            .expect("refresh should succeed");
    }

    /// Set the mock endpoint to fail (for error testing).
    pub fn set_endpoint_failure(&self, should_fail: bool) {
        self.endpoint.set_should_fail(should_fail);
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
