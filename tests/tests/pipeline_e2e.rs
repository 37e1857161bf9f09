//! End-to-end tests: in-memory CRM → refresh → dashboard endpoints.

use axum_test::TestServer;
use integration_tests::fixtures::{attributes, day_offset, deal, event_time, today, user};
use integration_tests::setup::TestContext;
use serde_json::Value;

/// Alice's two France deals on the same day and one Bruno deal yesterday.
fn seed(ctx: &TestContext) {
    ctx.endpoint.add_user(user("1", "Alice", "Martins"));
    ctx.endpoint.add_user(user("2", "Bruno", "Costa"));
    ctx.endpoint.add_deal(
        deal("101", "1"),
        attributes(&event_time(today(), 9, 0), "France", "Citizenship by Investment", ""),
    );
    ctx.endpoint.add_deal(
        deal("102", "1"),
        attributes(&event_time(today(), 15, 30), "France", "X", ""),
    );
    ctx.endpoint.add_deal(
        deal("103", "2"),
        attributes(&event_time(day_offset(-1), 11, 0), "Portugal", "Passive Income Visa", "Eligible Hot"),
    );
}

fn labels(nodes: &Value) -> Vec<String> {
    nodes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["label"].as_str().unwrap().to_string())
        .collect()
}

/// Week view groups owner → country → normalized program with totals
#[tokio::test]
async fn test_week_view_tree_and_totals() {
    let ctx = TestContext::new();
    seed(&ctx);
    ctx.refresh().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/hierarchy").await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["view"], "week");
    assert_eq!(body["columns"].as_array().unwrap().len(), 7);
    assert_eq!(body["columns"][6]["label"], "10/03");
    assert_eq!(body["total"], 3);
    assert_eq!(body["column_totals"][5], 1);
    assert_eq!(body["column_totals"][6], 2);
    assert_eq!(body["snapshot"]["generation"], 1);

    let owners = &body["owners"];
    assert_eq!(labels(owners), vec!["Alice Martins", "Bruno Costa"]);

    let alice = &owners[0];
    assert_eq!(alice["key"], "owner-Alice Martins");
    assert_eq!(alice["total"], 2);
    assert_eq!(alice["cell_counts"][6], 2);

    let france = &alice["content"]["children"][0];
    assert_eq!(france["label"], "France");
    let programs = &france["content"]["children"];
    assert_eq!(labels(programs), vec!["CBI", "X"]);
    assert_eq!(programs[0]["total"], 1);
    assert_eq!(programs[1]["cell_counts"][6], 1);

    let portugal = &owners[1]["content"]["children"][0];
    assert_eq!(labels(&portugal["content"]["children"]), vec!["D7 Hot"]);
}

/// Day view only keeps records dated today
#[tokio::test]
async fn test_day_view_filters_to_today() {
    let ctx = TestContext::new();
    seed(&ctx);
    ctx.refresh().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/hierarchy").add_query_param("view", "day").await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["view"], "day");
    assert_eq!(body["columns"].as_array().unwrap().len(), 1);
    assert_eq!(labels(&body["owners"]), vec!["Alice Martins"]);
    assert_eq!(body["total"], 2);
}

/// Visible rows descend only into expanded nodes
#[tokio::test]
async fn test_rows_follow_expansion() {
    let ctx = TestContext::new();
    seed(&ctx);
    ctx.refresh().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let collapsed: Value = server.get("/hierarchy/rows").await.json();
    assert_eq!(collapsed["rows"].as_array().unwrap().len(), 2);

    let response = server
        .get("/hierarchy/rows")
        .add_query_param(
            "expanded",
            "owner-Alice Martins,owner-Alice Martins-country-France",
        )
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let rows = body["rows"].as_array().unwrap();

    let keys: Vec<&str> = rows.iter().map(|r| r["key"].as_str().unwrap()).collect();
    assert_eq!(
        keys,
        vec![
            "owner-Alice Martins",
            "owner-Alice Martins-country-France",
            "owner-Alice Martins-country-France-program-CBI",
            "owner-Alice Martins-country-France-program-X",
            "owner-Bruno Costa",
        ]
    );
    assert_eq!(rows[2]["depth"], 2);
    assert_eq!(rows[2]["expandable"], false);
    assert_eq!(rows[4]["expanded"], false);
}

/// Cell drill-down lists the records behind one count
#[tokio::test]
async fn test_cell_records() {
    let ctx = TestContext::new();
    seed(&ctx);
    ctx.refresh().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .get("/hierarchy/cell")
        .add_query_param("key", "owner-Alice Martins-country-France-program-CBI")
        .add_query_param("date", today().to_string())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["count"], 1);
    assert_eq!(body["records"][0]["id"], "101");
    assert_eq!(body["records"][0]["owner"], "Alice Martins");
    assert_eq!(body["records"][0]["owner_id"], "1");
}

/// A failed attribute fetch drops that record's attributes but keeps the run
#[tokio::test]
async fn test_attribute_failure_is_not_fatal() {
    let ctx = TestContext::new();
    seed(&ctx);
    ctx.endpoint.fail_attributes_for("102");
    ctx.refresh().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let status: Value = server.get("/refresh").await.json();
    assert_eq!(status["state"], "succeeded");
    assert_eq!(status["failed_ids"], serde_json::json!(["102"]));

    // 102 has no event time any more, so only 101 and 103 are counted
    let body: Value = server.get("/hierarchy").await.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["snapshot"]["failed_ids"], 1);
}

/// Owners missing from the lookup show their raw identifier
#[tokio::test]
async fn test_unknown_owner_falls_back_to_id() {
    let ctx = TestContext::new();
    ctx.endpoint.add_deal(
        deal("201", "77"),
        attributes(&event_time(today(), 8, 0), "", "", ""),
    );
    ctx.refresh().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let body: Value = server.get("/hierarchy").await.json();
    let owner = &body["owners"][0];
    assert_eq!(owner["label"], "77");
    let country = &owner["content"]["children"][0];
    assert_eq!(country["label"], "Unknown");
    assert_eq!(country["content"]["children"][0]["label"], "Unknown");
}

/// Every deal's attributes are fetched exactly once
#[tokio::test]
async fn test_each_deal_enriched_once() {
    let ctx = TestContext::new();
    ctx.endpoint.add_user(user("1", "Alice", "Martins"));
    for i in 0..45 {
        let id = format!("{}", 300 + i);
        ctx.endpoint.add_deal(
            deal(&id, "1"),
            attributes(&event_time(today(), 10, 0), "Spain", "Golden Visa", ""),
        );
    }
    ctx.refresh().await;

    let calls = ctx.endpoint.calls();
    let attribute_calls: Vec<_> = calls
        .iter()
        .filter(|c| c.contains("dealCustomFieldData"))
        .collect();
    assert_eq!(attribute_calls.len(), 45);

    let snapshot = ctx.coordinator.snapshot().unwrap();
    assert_eq!(snapshot.records.len(), 45);
}
