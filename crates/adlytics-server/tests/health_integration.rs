use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use adlytics_core::config::{Config, Environment, OAuthSettings};
use adlytics_server::app::build_app;
use adlytics_server::state::AppState;

fn config() -> Config {
    Config {
        port: 0,
        environment: Environment::Development,
        secret_key: "test-secret".to_string(),
        session_minutes: 60,
        frontend_url: "http://localhost:3000".to_string(),
        cors_origins: vec![],
        allow_mock_data: true,
        oauth: OAuthSettings {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            scopes: vec![],
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_uri: "https://www.googleapis.com/oauth2/v1/userinfo".to_string(),
        },
        ads: None,
    }
}

#[tokio::test]
async fn health_reports_ok_and_version() {
    let state = Arc::new(AppState::new(config(), None, None));
    let app = build_app(state);

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let res = app.oneshot(req).await.expect("response");
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let body: Value = serde_json::from_slice(&bytes).expect("parse JSON");
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn unconfigured_login_is_upstream_unavailable() {
    let state = Arc::new(AppState::new(config(), None, None));
    let app = build_app(state);

    let req = Request::builder()
        .uri("/api/auth/login")
        .body(Body::empty())
        .expect("request");
    let res = app.oneshot(req).await.expect("response");
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}
