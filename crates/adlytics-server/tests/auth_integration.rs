use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use adlytics_core::config::{Config, Environment, OAuthSettings};
use adlytics_core::identity::{
    IdentityProvider, ProviderError, UpstreamProfile, UpstreamTokens,
};
use adlytics_server::app::build_app;
use adlytics_server::state::AppState;

fn test_config(environment: Environment) -> Config {
    Config {
        port: 0,
        environment,
        secret_key: "test-secret".to_string(),
        session_minutes: 60,
        frontend_url: "http://localhost:3000".to_string(),
        cors_origins: vec![],
        allow_mock_data: true,
        oauth: OAuthSettings {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:5002/api/auth/callback".to_string(),
            scopes: vec!["openid".to_string()],
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_uri: "https://www.googleapis.com/oauth2/v1/userinfo".to_string(),
        },
        ads: None,
    }
}

/// Scripted identity provider: accepts any code, returns a fixed profile.
/// Passthrough tokens are recognised by the `upstream-` prefix.
#[derive(Default)]
struct StubProvider {
    exchange_calls: AtomicUsize,
    fail_exchange: bool,
    fail_profile: bool,
}

#[async_trait]
impl IdentityProvider for StubProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://provider.example/auth?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<UpstreamTokens, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exchange {
            return Err(ProviderError::TokenExchange("scripted failure".to_string()));
        }
        Ok(UpstreamTokens {
            access_token: format!("upstream-{code}"),
            refresh_token: Some("refresh".to_string()),
            id_token: None,
            expires_in: Some(3600),
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UpstreamProfile, ProviderError> {
        if self.fail_profile || !access_token.starts_with("upstream-") {
            return Err(ProviderError::UserInfo("unknown token".to_string()));
        }
        Ok(UpstreamProfile {
            id: "987654".to_string(),
            name: Some("Stub User".to_string()),
            email: Some("stub@example.com".to_string()),
            picture: None,
        })
    }
}

fn setup_with(stub: StubProvider, environment: Environment) -> (Arc<StubProvider>, axum::Router) {
    let stub = Arc::new(stub);
    let provider: Arc<dyn IdentityProvider> = stub.clone();
    let state = Arc::new(AppState::new(test_config(environment), Some(provider), None));
    let app = build_app(state);
    (stub, app)
}

fn setup() -> (Arc<StubProvider>, axum::Router) {
    setup_with(StubProvider::default(), Environment::Development)
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn set_cookie(response: &axum::http::Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header")
        .to_string()
}

fn location(response: &axum::http::Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}

async fn get(app: &axum::Router, uri: &str) -> axum::http::Response<Body> {
    let req = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    app.clone().oneshot(req).await.expect("response")
}

async fn get_with_cookie(
    app: &axum::Router,
    uri: &str,
    cookie: &str,
) -> axum::http::Response<Body> {
    let req = Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request");
    app.clone().oneshot(req).await.expect("response")
}

async fn get_with_bearer(
    app: &axum::Router,
    uri: &str,
    token: &str,
) -> axum::http::Response<Body> {
    let req = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request");
    app.clone().oneshot(req).await.expect("response")
}

#[tokio::test]
async fn login_returns_auth_url_and_sets_state_cookie() {
    let (_stub, app) = setup();

    let res = get(&app, "/api/auth/login").await;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = set_cookie(&res);
    assert!(cookie.starts_with("oauth_state="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=600"));
    // Development config: no Secure attribute.
    assert!(!cookie.contains("Secure"));

    let state_value = cookie
        .trim_start_matches("oauth_state=")
        .split(';')
        .next()
        .expect("state value")
        .to_string();
    assert_eq!(state_value.len(), 64); // 32 random bytes, hex encoded

    let body = json_body(res).await;
    let auth_url = body["auth_url"].as_str().expect("auth_url");
    assert_eq!(
        auth_url,
        format!("https://provider.example/auth?state={state_value}")
    );
}

#[tokio::test]
async fn callback_rejects_state_mismatch_before_exchange() {
    let (stub, app) = setup();

    let res = get_with_cookie(
        &app,
        "/api/auth/callback?code=c&state=xyz",
        "oauth_state=abc",
    )
    .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res),
        "http://localhost:3000/login?error=invalid_state"
    );
    assert_eq!(stub.exchange_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn callback_without_cookie_is_state_mismatch() {
    let (stub, app) = setup();

    let res = get(&app, "/api/auth/callback?code=c&state=abc").await;

    assert_eq!(
        location(&res),
        "http://localhost:3000/login?error=invalid_state"
    );
    assert_eq!(stub.exchange_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn callback_provider_error_short_circuits() {
    let (stub, app) = setup();

    let res = get_with_cookie(
        &app,
        "/api/auth/callback?code=c&state=abc&error=access_denied",
        "oauth_state=abc",
    )
    .await;

    assert_eq!(
        location(&res),
        "http://localhost:3000/login?error=access_denied"
    );
    assert_eq!(stub.exchange_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn callback_without_code_is_missing_code() {
    let (_stub, app) = setup();

    let res = get_with_cookie(&app, "/api/auth/callback?state=abc", "oauth_state=abc").await;

    assert_eq!(
        location(&res),
        "http://localhost:3000/login?error=missing_code"
    );
}

#[tokio::test]
async fn callback_happy_path_issues_session_and_clears_cookie() {
    let (stub, app) = setup();

    let res = get_with_cookie(
        &app,
        "/api/auth/callback?code=the-code&state=abc",
        "oauth_state=abc",
    )
    .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(stub.exchange_calls.load(Ordering::SeqCst), 1);

    let cookie = set_cookie(&res);
    assert!(cookie.starts_with("oauth_state=;"));
    assert!(cookie.contains("Max-Age=0"));

    let loc = location(&res);
    let token = loc
        .strip_prefix("http://localhost:3000/dashboard?token=")
        .expect("dashboard redirect with token");

    let verify = get_with_bearer(&app, "/api/auth/verify", token).await;
    let body = json_body(verify).await;
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(body["user"]["id"], "google-oauth2|987654");
    assert_eq!(body["user"]["name"], "Stub User");
    assert_eq!(body["user"]["email"], "stub@example.com");
}

#[tokio::test]
async fn callback_exchange_failure_is_named() {
    let (_stub, app) = setup_with(
        StubProvider {
            fail_exchange: true,
            ..StubProvider::default()
        },
        Environment::Development,
    );

    let res = get_with_cookie(
        &app,
        "/api/auth/callback?code=c&state=abc",
        "oauth_state=abc",
    )
    .await;

    assert_eq!(
        location(&res),
        "http://localhost:3000/login?error=token_exchange_failed"
    );
}

#[tokio::test]
async fn callback_profile_failure_is_named() {
    let (_stub, app) = setup_with(
        StubProvider {
            fail_profile: true,
            ..StubProvider::default()
        },
        Environment::Development,
    );

    let res = get_with_cookie(
        &app,
        "/api/auth/callback?code=c&state=abc",
        "oauth_state=abc",
    )
    .await;

    assert_eq!(
        location(&res),
        "http://localhost:3000/login?error=user_info_failed"
    );
}

#[tokio::test]
async fn mock_token_available_in_development() {
    let (_stub, app) = setup();

    let res = get(&app, "/api/auth/mock-token").await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["user_id"], "google-oauth2|123456789");
    let token = body["token"].as_str().expect("token");

    let verify = get_with_bearer(&app, "/api/auth/verify", token).await;
    let body = json_body(verify).await;
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(body["user"]["id"], "google-oauth2|123456789");
}

#[tokio::test]
async fn mock_token_forbidden_in_production() {
    let (_stub, app) = setup_with(StubProvider::default(), Environment::Production);

    let res = get(&app, "/api/auth/mock-token").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = json_body(res).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn verify_rejects_garbage_token() {
    let (_stub, app) = setup();

    let res = get_with_bearer(&app, "/api/auth/verify", "garbage").await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(body["isAuthenticated"], false);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn verify_without_bearer_reports_missing_token() {
    let (_stub, app) = setup();

    let res = get(&app, "/api/auth/verify").await;
    let body = json_body(res).await;
    assert_eq!(body["isAuthenticated"], false);
    assert_eq!(body["error"], "Missing bearer token");
}

#[tokio::test]
async fn verify_accepts_upstream_passthrough_token() {
    let (_stub, app) = setup();

    // Never exchanged locally, but the provider recognises it.
    let res = get_with_bearer(&app, "/api/auth/verify", "upstream-opaque").await;
    let body = json_body(res).await;
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(body["user"]["id"], "google-oauth2|987654");
}
