//! E2E tests for the preservation comparison proxy
//!
//! The image comparison service is replaced by a local stand-in server.

mod common;

use axum::{
    Json, Router,
    extract::Multipart,
    routing::{get, post},
};
use common::{TestServer, spawn_upstream};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

async fn fake_comparison_service(severity: &'static str) -> String {
    let app = Router::new()
        .route(
            "/compare",
            post(move |mut multipart: Multipart| async move {
                let mut parts = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    parts.push(field.name().unwrap_or_default().to_string());
                }
                Json(json!({
                    "similarity_score": 0.62,
                    "severity": severity,
                    "affected_areas": ["north wall mural"],
                    "received_parts": parts
                }))
            }),
        )
        .route(
            "/health",
            get(|| async { Json(json!({ "status": "healthy", "model_loaded": true })) }),
        );

    spawn_upstream(app).await
}

fn image_form() -> Form {
    Form::new()
        .part(
            "baseline",
            Part::bytes(vec![0x89, 0x50, 0x4E, 0x47])
                .file_name("2019.png")
                .mime_str("image/png")
                .unwrap(),
        )
        .part(
            "comparison",
            Part::bytes(vec![0x89, 0x50, 0x4E, 0x47, 0x0D])
                .file_name("2025.png")
                .mime_str("image/png")
                .unwrap(),
        )
}

#[tokio::test]
async fn test_compare_returns_report_with_recommendations() {
    let upstream = fake_comparison_service("MODERATE").await;
    let server = TestServer::with_config(|config| {
        config.preservation.service_url = upstream;
    })
    .await;
    let admin_token = server.admin_token().await;

    let response = server
        .client
        .post(server.url("/preservation/compare"))
        .bearer_auth(&admin_token)
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    let report = &json["data"];
    assert_eq!(report["similarity_score"], 0.62);
    assert_eq!(report["severity"], "MODERATE");
    assert_eq!(report["affected_areas"][0], "north wall mural");
    assert!(!report["recommendations"].as_array().unwrap().is_empty());
    assert_eq!(
        report["details"]["received_parts"],
        json!(["baseline", "comparison"])
    );
}

#[tokio::test]
async fn test_compare_requires_admin() {
    let server = TestServer::new().await;
    let (_, user_token) = server.create_user("Visitor").await;

    let response = server
        .client
        .post(server.url("/preservation/compare"))
        .bearer_auth(&user_token)
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_compare_requires_both_images() {
    let server = TestServer::new().await;
    let admin_token = server.admin_token().await;

    let form = Form::new().part(
        "baseline",
        Part::bytes(vec![1, 2, 3])
            .file_name("only.png")
            .mime_str("image/png")
            .unwrap(),
    );

    let response = server
        .client
        .post(server.url("/preservation/compare"))
        .bearer_auth(&admin_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    let server = TestServer::new().await;
    let admin_token = server.admin_token().await;

    let response = server
        .client
        .post(server.url("/preservation/compare"))
        .bearer_auth(&admin_token)
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);

    let response = server
        .client
        .get(server.url("/preservation/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn test_health_is_proxied() {
    let upstream = fake_comparison_service("GOOD").await;
    let server = TestServer::with_config(|config| {
        config.preservation.service_url = upstream;
    })
    .await;

    let response = server
        .client
        .get(server.url("/preservation/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["status"], "healthy");
}
