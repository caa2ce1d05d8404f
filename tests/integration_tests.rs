//! Integration tests for chirpy

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chirpy::api::{ErrorResponse, ValidResponse};
use chirpy::config::{AppConfig, MetricsFormat, RouteLayout};
use chirpy::server::{create_server_router, AppState};
use chirpy::HitCounter;
use http_body_util::BodyExt;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;

fn create_app(config: AppConfig) -> (Router, HitCounter) {
    let state = AppState::new(config);
    let hits = state.hits.clone();
    (create_server_router(state), hits)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn validate(app: &Router, body: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(post("/api/validate_chirp", body.to_string()))
        .await
        .unwrap();
    let status = response.status();
    (status, body_string(response).await)
}

#[tokio::test]
async fn test_validate_short_chirp() {
    let (app, _) = create_app(AppConfig::default());

    let (status, body) = validate(&app, r#"{"body": "hello"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: ValidResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed, ValidResponse { valid: true });
}

#[tokio::test]
async fn test_validate_length_boundary() {
    let (app, _) = create_app(AppConfig::default());

    let at_limit = serde_json::json!({ "body": "a".repeat(140) }).to_string();
    let (status, _) = validate(&app, &at_limit).await;
    assert_eq!(status, StatusCode::OK);

    let over = serde_json::json!({ "body": "a".repeat(141) }).to_string();
    let (status, body) = validate(&app, &over).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let parsed: ErrorResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed.error, "Chirp is too long");
}

#[tokio::test]
async fn test_validate_malformed_body() {
    let (app, _) = create_app(AppConfig::default());

    for body in ["not json", r#"{"body": 42}"#, "", "[]"] {
        let (status, response) = validate(&app, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body: {body:?}");
        let parsed: ErrorResponse = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed.error, "Something went wrong");
    }
}

#[tokio::test]
async fn test_validate_lenient_bodies_are_valid() {
    let (app, _) = create_app(AppConfig::default());

    for body in [
        "{}",
        "null",
        r#"{"body": null}"#,
        r#"{"text": "hello"}"#,
        r#"{"Body": "hi"}"#,
        r#"{"body": "hi"} trailing"#,
    ] {
        let (status, response) = validate(&app, body).await;
        assert_eq!(status, StatusCode::OK, "body: {body:?}");
        let parsed: ValidResponse = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed, ValidResponse { valid: true });
    }
}

#[tokio::test]
async fn test_validate_case_insensitive_key_is_length_checked() {
    let (app, _) = create_app(AppConfig::default());

    let body = serde_json::json!({ "BODY": "a".repeat(141) }).to_string();
    let (status, response) = validate(&app, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let parsed: ErrorResponse = serde_json::from_str(&response).unwrap();
    assert_eq!(parsed.error, "Chirp is too long");
}

#[tokio::test]
async fn test_validate_respects_configured_limit() {
    let mut config = AppConfig::default();
    config.chirp.max_length = 5;
    let (app, _) = create_app(config);

    let (status, _) = validate(&app, r#"{"body": "hello"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = validate(&app, r#"{"body": "hello!"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_not_counted() {
    let (app, hits) = create_app(AppConfig::default());

    validate(&app, r#"{"body": "hello"}"#).await;
    validate(&app, "garbage").await;
    assert_eq!(hits.load(), 0);
}

#[tokio::test]
async fn test_health_metrics_reset_scenario() {
    let (app, hits) = create_app(AppConfig::default());

    for _ in 0..10 {
        let response = app.clone().oneshot(get("/api/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    let response = app.clone().oneshot(get("/admin/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let page = body_string(response).await;
    assert!(page.contains("Chirpy has been visited 10 times!"));

    let response = app
        .clone()
        .oneshot(post("/admin/reset", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
    assert_eq!(hits.load(), 0);

    let response = app.oneshot(get("/admin/metrics")).await.unwrap();
    let page = body_string(response).await;
    assert!(page.contains("Chirpy has been visited 0 times!"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_all_counted() {
    let (app, hits) = create_app(AppConfig::default());

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.oneshot(get("/api/healthz")).await.unwrap() })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(hits.load(), 100);

    let response = app.oneshot(get("/admin/metrics")).await.unwrap();
    assert!(body_string(response)
        .await
        .contains("Chirpy has been visited 100 times!"));
}

#[tokio::test]
async fn test_static_files_are_served_and_counted() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Welcome to Chirpy</h1>").unwrap();
    std::fs::write(dir.path().join("logo.txt"), "chirp").unwrap();

    let mut config = AppConfig::default();
    config.files.root = dir.path().to_string_lossy().into_owned();
    let (app, hits) = create_app(config);

    let response = app.clone().oneshot(get("/app/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>Welcome to Chirpy</h1>");

    let response = app.clone().oneshot(get("/app/logo.txt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "chirp");

    // Missing files still pass through the middleware
    let response = app.clone().oneshot(get("/app/missing.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(hits.load(), 3);

    let response = app.clone().oneshot(get("/elsewhere")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(hits.load(), 3);

    // The bare mount redirects before it is counted
    let response = app.oneshot(get("/app")).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()[header::LOCATION], "/app/");
    assert_eq!(hits.load(), 3);
}

#[tokio::test]
async fn test_flat_layout() {
    let mut config = AppConfig::default();
    config.routes.layout = RouteLayout::Flat;
    let (app, hits) = create_app(config);

    let response = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/api/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_string(response).await, "Hits: 1");

    let response = app
        .clone()
        .oneshot(post("/validate_chirp", r#"{"body": "hi"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post("/reset", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hits.load(), 0);
}

#[tokio::test]
async fn test_explicit_metrics_format_overrides_layout() {
    let mut config = AppConfig::default();
    config.metrics.format = Some(MetricsFormat::Text);
    let (app, _) = create_app(config);

    let response = app.oneshot(get("/admin/metrics")).await.unwrap();
    assert_eq!(body_string(response).await, "Hits: 0");
}

#[test]
fn test_config_default() {
    let config = AppConfig::default();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.routes.layout, RouteLayout::Api);
    assert_eq!(config.route_table().validate_chirp, "/api/validate_chirp");
}

#[test]
fn test_load_config_from_toml_file() -> anyhow::Result<()> {
    let mut temp_file = NamedTempFile::with_suffix(".toml")?;
    temp_file.write_all(
        br#"
[server]
port = 9001

[files]
root = "./public"

[routes]
layout = "flat"
reset = "/admin/reset"

[chirp]
max_length = 280
"#,
    )?;
    temp_file.flush()?;

    let config = AppConfig::load(temp_file.path().to_str().unwrap())?;
    assert_eq!(config.server.port, 9001);
    assert_eq!(config.files.root, "./public");
    assert_eq!(config.files.mount, "/app");
    assert_eq!(config.chirp.max_length, 280);

    let routes = config.route_table();
    assert_eq!(routes.healthz, "/healthz");
    assert_eq!(routes.reset, "/admin/reset");
    assert!(config.validate().is_ok());

    Ok(())
}

#[test]
fn test_load_config_missing_file_uses_defaults() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("absent.toml");

    let config = AppConfig::load(path.to_str().unwrap())?;
    assert_eq!(config.files.root, "./www");
    assert_eq!(config.chirp.max_length, 140);
    Ok(())
}

#[test]
fn test_load_config_invalid_file_errors() -> anyhow::Result<()> {
    let mut temp_file = NamedTempFile::with_suffix(".toml")?;
    temp_file.write_all(b"[server]\nport = \"not a port\"\n")?;
    temp_file.flush()?;

    assert!(AppConfig::load(temp_file.path().to_str().unwrap()).is_err());
    Ok(())
}
