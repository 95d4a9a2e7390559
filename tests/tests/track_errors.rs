//! Tests for gateway error handling: the rejection ladder, soft
//! invalid-site outcomes, batch isolation, and CORS preflight.

use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::json;

#[tokio::test]
async fn test_missing_type_returns_400() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/track")
        .json(&json!({ "data": { "siteId": "cc_abc123def456", "sessionId": "s-1" } }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["code"], "VALID_001");
}

#[tokio::test]
async fn test_missing_data_returns_400() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.post("/track").json(&json!({ "type": "pageview" })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_missing_site_id_returns_400() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/track")
        .json(&json!({ "type": "pageview", "data": { "sessionId": "s-1", "path": "/" } }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_unknown_type_returns_400() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/track")
        .json(&json!({
            "type": "heartbeat",
            "data": { "siteId": "cc_abc123def456", "sessionId": "s-1" }
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Unknown tracking type");
    assert_eq!(body["code"], "VALID_002");
}

#[tokio::test]
async fn test_malformed_json_returns_500_generic() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/track")
        .content_type("application/json")
        .bytes("not json at all".into())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_inactive_site_soft_rejection_writes_nothing() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_inactive_site("user-1").await;

    let session = fixtures::session_id();
    let events = vec![
        fixtures::session_event(&site.public_id, &session),
        fixtures::pageview_event(&site.public_id, &session, "/"),
        fixtures::performance_event(&site.public_id, &session, "/"),
        fixtures::custom_event(&site.public_id, &session, "signup"),
    ];

    for event in events {
        let response = server.post("/track").json(&event).await;
        // Soft outcome: HTTP 200, success false
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid or inactive site");
    }

    assert_eq!(
        store::stats::session_count(&ctx.store, &site.public_id).await.unwrap(),
        0
    );
    assert_eq!(
        store::stats::pageview_count(&ctx.store, &site.public_id).await.unwrap(),
        0
    );
    assert_eq!(
        store::stats::performance_sample_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        store::stats::event_count(&ctx.store, &site.public_id).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_unregistered_site_soft_rejection() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/track")
        .json(&fixtures::pageview_event(
            &fixtures::unregistered_site_id(),
            &fixtures::session_id(),
            "/",
        ))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid or inactive site");
}

#[tokio::test]
async fn test_batch_non_array_events_returns_400() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/track/batch")
        .json(&json!({ "events": "not an array" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

#[tokio::test]
async fn test_batch_missing_events_returns_400() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.post("/track/batch").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_isolates_per_event_failures() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let session = fixtures::session_id();
    let body = fixtures::batch(vec![
        fixtures::session_event(&site.public_id, &session),
        // Middle event targets a site that was never registered
        fixtures::pageview_event(&fixtures::unregistered_site_id(), &fixtures::session_id(), "/"),
        fixtures::custom_event(&site.public_id, &session, "cta_click"),
    ]);

    let response = server.post("/track/batch").json(&body).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let results = body["results"].as_array().expect("results array");
    assert_eq!(results.len(), 3, "one result per submitted event");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[2]["success"], true);

    // The two good events persisted, the bad one wrote nothing
    assert_eq!(
        store::stats::session_count(&ctx.store, &site.public_id).await.unwrap(),
        1
    );
    assert_eq!(
        store::stats::event_count(&ctx.store, &site.public_id).await.unwrap(),
        1
    );
    assert_eq!(
        store::stats::pageview_count(&ctx.store, &fixtures::unregistered_site_id())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_batch_isolates_parse_failures() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let session = fixtures::session_id();
    let body = fixtures::batch(vec![
        json!({ "type": "pageview", "data": { "sessionId": "s-1" } }),
        fixtures::session_event(&site.public_id, &session),
    ]);

    let response = server.post("/track/batch").json(&body).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    let results = body["results"].as_array().expect("results array");
    assert_eq!(results[0]["success"], false);
    assert_eq!(results[1]["success"], true);
}

#[tokio::test]
async fn test_cors_preflight_track() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.method(Method::OPTIONS, "/track").await;

    response.assert_status(StatusCode::NO_CONTENT);
    let allow_origin = response.header("access-control-allow-origin");
    assert_eq!(allow_origin.to_str().unwrap(), "*");
}

#[tokio::test]
async fn test_cors_preflight_batch() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.method(Method::OPTIONS, "/track/batch").await;

    response.assert_status(StatusCode::NO_CONTENT);
    let allow_origin = response.header("access-control-allow-origin");
    assert_eq!(allow_origin.to_str().unwrap(), "*");
}
