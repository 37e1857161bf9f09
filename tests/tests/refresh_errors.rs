//! Error paths: missing snapshot, failed refresh, concurrent refresh, bad input.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::fixtures::{attributes, deal, event_time, today, user};
use integration_tests::setup::TestContext;
use serde_json::Value;
use std::time::Duration;

fn seed_one(ctx: &TestContext) {
    ctx.endpoint.add_user(user("1", "Alice", "Martins"));
    ctx.endpoint.add_deal(
        deal("101", "1"),
        attributes(&event_time(today(), 9, 0), "France", "X", ""),
    );
}

/// Hierarchy endpoints answer 503 until the first refresh succeeds
#[tokio::test]
async fn test_no_snapshot_yet() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/hierarchy").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["code"], "DATA_001");

    let status: Value = server.get("/refresh").await.json();
    assert_eq!(status["state"], "idle");
}

/// A failed refresh reports its error and keeps serving the previous snapshot
#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let ctx = TestContext::new();
    seed_one(&ctx);
    ctx.refresh().await;

    ctx.set_endpoint_failure(true);
    let err = ctx.coordinator.refresh().await.unwrap_err();
    assert_eq!(err.error_code(), "FETCH_001");

    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let status: Value = server.get("/refresh").await.json();
    assert_eq!(status["state"], "failed");
    assert!(status["message"]
        .as_str()
        .unwrap()
        .contains("mock endpoint unreachable"));

    let response = server.get("/hierarchy").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["snapshot"]["generation"], 1);
}

/// POST /refresh starts a background run that becomes visible when done
#[tokio::test]
async fn test_background_refresh() {
    let ctx = TestContext::new();
    seed_one(&ctx);
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.post("/refresh").await;
    response.assert_status(StatusCode::ACCEPTED);
    let accepted: Value = response.json();
    assert_eq!(accepted["status"], "started");

    let mut state = String::new();
    for _ in 0..200 {
        let status: Value = server.get("/refresh").await.json();
        state = status["state"].as_str().unwrap_or_default().to_string();
        if state != "running" {
            assert_eq!(status["run_id"], accepted["run_id"]);
            assert_eq!(status["progress"]["phase"], "complete");
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state, "succeeded");

    server.get("/hierarchy").await.assert_status_ok();
}

/// A second refresh while one is running is rejected with 409
#[tokio::test]
async fn test_concurrent_refresh_conflict() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let (_run_id, guard) = ctx.coordinator.begin().unwrap();

    let response = server.post("/refresh").await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "REFRESH_001");

    drop(guard);
    assert!(!ctx.coordinator.is_running());
}

/// Unknown view values are rejected
#[tokio::test]
async fn test_invalid_view() {
    let ctx = TestContext::new();
    seed_one(&ctx);
    ctx.refresh().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/hierarchy").add_query_param("view", "month").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

/// Cell lookups need an existing program key and a date inside the view
#[tokio::test]
async fn test_cell_errors() {
    let ctx = TestContext::new();
    seed_one(&ctx);
    ctx.refresh().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .get("/hierarchy/cell")
        .add_query_param("key", "owner-Alice Martins")
        .add_query_param("date", today().to_string())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "DATA_002");

    let response = server
        .get("/hierarchy/cell")
        .add_query_param("key", "owner-Alice Martins-country-France-program-X")
        .add_query_param("date", "2024-01-01")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
