//! E2E tests for health check, metrics and authentication basics

mod common;

use common::TestServer;
use gompa::auth::Role;
use serde_json::Value;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_cors_headers() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("Origin", "https://visitor.example.com")
        .send()
        .await
        .unwrap();

    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_metrics_exposes_request_counters() {
    gompa::metrics::init_metrics();
    let server = TestServer::new().await;

    server
        .client
        .get(server.url("/events"))
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("gompa_http_requests_total"));
    assert!(body.contains("endpoint=\"/events\""));
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/itinerary/my-itineraries"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let server = TestServer::new().await;
    let (_, token) = server.create_user("Tenzin").await;
    let forged = format!("{}x", token);

    let response = server
        .client
        .get(server.url("/itinerary/my-itineraries"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_token_for_unknown_identity_is_rejected() {
    let server = TestServer::new().await;
    let token = server.token_for("01HZZZZZZZZZZZZZZZZZZZZZZZ", Role::User);

    let response = server
        .client
        .get(server.url("/itinerary/my-itineraries"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let server = TestServer::new().await;
    let (_, token) = server.create_user("Pema").await;

    let response = server
        .client
        .get(server.url("/itinerary/my-itineraries"))
        .header("Cookie", format!("session={}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_dashboard_is_admin_only() {
    let server = TestServer::new().await;
    let (_, user_token) = server.create_user("Karma").await;
    let admin_token = server.admin_token().await;

    let response = server
        .client
        .get(server.url("/admin/dashboard"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .get(server.url("/admin/dashboard"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["success"], true);
    // Bootstrap admin plus Karma
    assert_eq!(json["data"]["users"], 2);
    assert_eq!(json["data"]["stories_pending"], 0);
}
