//! End-to-end tests for the tracking gateway happy paths.

use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn test_session_create_is_idempotent() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let session = fixtures::session_id();
    let event = fixtures::session_event(&site.public_id, &session);

    let response = server.post("/track").json(&event).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["isNew"], true);

    // Second start with the same session id patches instead of inserting
    let response = server.post("/track").json(&event).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["isNew"], false);

    assert_eq!(
        store::stats::session_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        1,
        "duplicate session start must not insert a second row"
    );

    let record = store::tracking::get_session(&ctx.store, &session)
        .await
        .unwrap()
        .expect("session row missing");
    assert_eq!(record.page_count, 1);
    assert!(record.is_bounce);
    assert!(record.last_activity >= record.started_at);
}

#[tokio::test]
async fn test_bounce_clears_on_second_page_view() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let session = fixtures::session_id();
    server
        .post("/track")
        .json(&fixtures::session_event(&site.public_id, &session))
        .await
        .assert_status_ok();

    let record = store::tracking::get_session(&ctx.store, &session)
        .await
        .unwrap()
        .unwrap();
    assert!(record.is_bounce, "fresh session starts as a bounce");

    server
        .post("/track")
        .json(&fixtures::pageview_event(&site.public_id, &session, "/pricing"))
        .await
        .assert_status_ok();

    let record = store::tracking::get_session(&ctx.store, &session)
        .await
        .unwrap()
        .unwrap();
    assert!(!record.is_bounce, "second page view clears the bounce flag");
    assert_eq!(record.page_count, 2);

    // The flag never reverts
    server
        .post("/track")
        .json(&fixtures::pageview_event(&site.public_id, &session, "/contact"))
        .await
        .assert_status_ok();

    let record = store::tracking::get_session(&ctx.store, &session)
        .await
        .unwrap()
        .unwrap();
    assert!(!record.is_bounce);
    assert_eq!(record.page_count, 3);
}

#[tokio::test]
async fn test_pageview_for_unknown_session_is_kept() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    // No session event arrived; the page view is still recorded
    let response = server
        .post("/track")
        .json(&fixtures::pageview_event(&site.public_id, &fixtures::session_id(), "/"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    assert_eq!(
        store::stats::pageview_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store::stats::session_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_partial_performance_sample() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let response = server
        .post("/track")
        .json(&fixtures::performance_event(&site.public_id, &fixtures::session_id(), "/"))
        .await;
    response.assert_status_ok();

    assert_eq!(
        store::stats::performance_sample_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_custom_event_with_properties() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let response = server
        .post("/track")
        .json(&fixtures::custom_event(&site.public_id, &fixtures::session_id(), "signup"))
        .await;
    response.assert_status_ok();

    assert_eq!(
        store::stats::event_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_end_session_finalizes_duration() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let session = fixtures::session_id();
    server
        .post("/track")
        .json(&fixtures::session_event(&site.public_id, &session))
        .await
        .assert_status_ok();

    let response = server.post("/track").json(&fixtures::end_event(&session)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let record = store::tracking::get_session(&ctx.store, &session)
        .await
        .unwrap()
        .unwrap();
    assert!(record.duration >= 0);
    assert!(record.last_activity >= record.started_at);
}

#[tokio::test]
async fn test_end_session_unknown_id_is_noop() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/track")
        .json(&fixtures::end_event(&fixtures::session_id()))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true, "unknown session end must not error");
}

#[tokio::test]
async fn test_referrer_is_classified_when_type_missing() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let session = fixtures::session_id();
    server
        .post("/track")
        .json(&fixtures::session_event_with_referrer(
            &site.public_id,
            &session,
            "https://www.google.com/search?q=cherrycap",
        ))
        .await
        .assert_status_ok();

    let record = store::tracking::get_session(&ctx.store, &session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.referrer_type, tracking_core::ReferrerType::Organic);
}

#[tokio::test]
async fn test_batch_happy_path() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let site = ctx.create_site("user-1", "Example", "example.com").await;

    let session = fixtures::session_id();
    let body = fixtures::batch(vec![
        fixtures::session_event(&site.public_id, &session),
        fixtures::pageview_event(&site.public_id, &session, "/pricing"),
        fixtures::custom_event(&site.public_id, &session, "cta_click"),
        fixtures::end_event(&session),
    ]);

    let response = server.post("/track/batch").json(&body).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let results = body["results"].as_array().expect("results array");
    assert_eq!(results.len(), 4);
    for result in results {
        assert_eq!(result["success"], true);
    }

    assert_eq!(
        store::stats::session_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store::stats::pageview_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store::stats::event_count(&ctx.store, &site.public_id)
            .await
            .unwrap(),
        1
    );
}
