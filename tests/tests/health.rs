//! Tests for health check endpoints.
//!
//! These tests verify the health endpoints return correct status and structure.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::fixtures::{attributes, deal, event_time, today, user};
use integration_tests::setup::TestContext;

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    for field in ["status", "endpoint_connected", "snapshot_loaded", "components", "metrics"] {
        assert!(
            body.get(field).is_some(),
            "Response should have '{}' field",
            field
        );
    }
    assert_eq!(body["components"].as_array().unwrap().len(), 2);
}

/// Test /health endpoint reports valid status
#[tokio::test]
async fn test_health_endpoint_status_values() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let body: serde_json::Value = server.get("/health").await.json();

    let status = body["status"].as_str().unwrap_or("");
    assert!(
        status == "healthy" || status == "degraded" || status == "unhealthy",
        "Status should be 'healthy', 'degraded', or 'unhealthy', got '{}'",
        status
    );
}

/// Readiness follows the snapshot
#[tokio::test]
async fn test_ready_after_first_refresh() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    ctx.endpoint.add_user(user("1", "Alice", "Martins"));
    ctx.endpoint.add_deal(
        deal("101", "1"),
        attributes(&event_time(today(), 9, 0), "France", "X", ""),
    );
    ctx.refresh().await;

    server.get("/health/ready").await.assert_status_ok();
    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["snapshot_loaded"], true);
    assert_eq!(body["generation"], 1);
}

/// Test /health/live endpoint
#[tokio::test]
async fn test_liveness_probe() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server.get("/health/live").await.assert_status_ok();
}
