use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use adlytics_core::identity::{namespaced_id, Identity, UpstreamTokens};

use crate::auth::jwt::encode_session;
use crate::auth::middleware::bearer_token;
use crate::auth::session::{identity_from_profile, resolve_session};
use crate::error::AppError;
use crate::state::AppState;

const STATE_COOKIE: &str = "oauth_state";
const STATE_COOKIE_MAX_AGE_SECONDS: u64 = 600;

/// Fixed identity used by the mock-token endpoint.
const TEST_IDENTITY_ID: &str = "google-oauth2|123456789";

// ---------------------------------------------------------------------------
// GET /api/auth/login
// ---------------------------------------------------------------------------

/// `GET /api/auth/login` — start the authorization-code flow.
///
/// Generates the anti-forgery state, hands the provider authorization URL to
/// the frontend, and parks the state in a short-lived http-only cookie for
/// the callback to check against.
pub async fn login(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let provider = state.provider.as_ref().ok_or_else(|| {
        AppError::UpstreamUnavailable("Google OAuth is not configured".to_string())
    })?;

    let anti_forgery = random_hex(32);
    let auth_url = provider.authorization_url(&anti_forgery);
    let cookie = build_state_cookie(&anti_forgery, state.config.environment.is_production());

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "auth_url": auth_url })),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/auth/callback
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Why a callback was rejected. Each reason is surfaced to the frontend as a
/// distinct short code in the redirect; raw transport errors never are.
enum CallbackFailure {
    Provider(String),
    MissingCode,
    StateMismatch,
    TokenExchange,
    UserInfo,
}

impl CallbackFailure {
    fn reason(&self) -> &str {
        match self {
            CallbackFailure::Provider(error) => error,
            CallbackFailure::MissingCode => "missing_code",
            CallbackFailure::StateMismatch => "invalid_state",
            CallbackFailure::TokenExchange => "token_exchange_failed",
            CallbackFailure::UserInfo => "user_info_failed",
        }
    }
}

/// `GET /api/auth/callback` — provider redirect target.
///
/// Success redirects to `{frontend}/dashboard?token={jwt}`; every failure
/// redirects to `{frontend}/login?error={reason}`. The state cookie is
/// single-use and cleared either way.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cookie_state = state_cookie_value(&headers);

    let location = match run_callback(&state, &query, cookie_state.as_deref()).await {
        Ok(token) => format!("{}/dashboard?token={}", state.config.frontend_url, token),
        Err(failure) => {
            tracing::warn!(reason = failure.reason(), "OAuth callback failed");
            format!("{}/login?error={}", state.config.frontend_url, failure.reason())
        }
    };

    let cookie = clear_state_cookie(state.config.environment.is_production());
    ([(header::SET_COOKIE, cookie)], Redirect::to(&location))
}

async fn run_callback(
    state: &AppState,
    query: &CallbackQuery,
    cookie_state: Option<&str>,
) -> Result<String, CallbackFailure> {
    if let Some(error) = &query.error {
        return Err(CallbackFailure::Provider(error.clone()));
    }

    let code = query.code.as_deref().ok_or(CallbackFailure::MissingCode)?;

    // The echoed state must match the cookie byte-for-byte; an absent or
    // expired cookie counts as a mismatch.
    match (query.state.as_deref(), cookie_state) {
        (Some(echoed), Some(expected)) if echoed == expected => {}
        _ => return Err(CallbackFailure::StateMismatch),
    }

    let provider = state.provider.as_ref().ok_or(CallbackFailure::TokenExchange)?;

    let tokens = provider.exchange_code(code).await.map_err(|e| {
        tracing::warn!(error = %e, "Code exchange failed");
        CallbackFailure::TokenExchange
    })?;

    let profile = provider
        .fetch_profile(&tokens.access_token)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Userinfo fetch failed");
            CallbackFailure::UserInfo
        })?;
    if profile.id.is_empty() {
        return Err(CallbackFailure::UserInfo);
    }

    let user_id = namespaced_id(&profile.id);
    let identity = identity_from_profile(&user_id, profile);
    state.identities.upsert(&user_id, identity).await;
    state.upstream_tokens.upsert(&user_id, tokens).await;

    let (token, _expires_at) = encode_session(
        &state.config.secret_key,
        &user_id,
        state.config.session_minutes,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Session issuance failed");
        CallbackFailure::TokenExchange
    })?;

    tracing::info!(%user_id, "OAuth login completed");
    Ok(token)
}

// ---------------------------------------------------------------------------
// GET /api/auth/verify
// ---------------------------------------------------------------------------

/// `GET /api/auth/verify` — report whether the bearer credential is valid.
///
/// Never a 401: the response body carries the authentication status so the
/// frontend can branch without an error path.
pub async fn verify(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<Value> {
    let Some(token) = bearer_token(&headers) else {
        return Json(json!({ "isAuthenticated": false, "error": "Missing bearer token" }));
    };

    match resolve_session(&state, &token).await {
        Ok(session) => Json(json!({ "isAuthenticated": true, "user": session.identity })),
        Err(e) => Json(json!({ "isAuthenticated": false, "error": e.to_string() })),
    }
}

// ---------------------------------------------------------------------------
// GET /api/auth/mock-token
// ---------------------------------------------------------------------------

/// `GET /api/auth/mock-token` — session for the fixed test identity, no
/// provider round-trip. Forbidden in production.
pub async fn mock_token(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    if state.config.environment.is_production() {
        return Err(AppError::Forbidden(
            "Mock authentication is disabled in production mode".to_string(),
        ));
    }

    let identity = Identity {
        id: TEST_IDENTITY_ID.to_string(),
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        picture: Some("https://ui-avatars.com/api/?name=Test+User".to_string()),
    };
    state.identities.upsert(TEST_IDENTITY_ID, identity).await;
    state
        .upstream_tokens
        .upsert(
            TEST_IDENTITY_ID,
            UpstreamTokens {
                access_token: format!("mock-token-{}", random_hex(8)),
                refresh_token: None,
                id_token: Some(TEST_IDENTITY_ID.to_string()),
                expires_in: Some(3600),
            },
        )
        .await;

    let (token, _expires_at) = encode_session(
        &state.config.secret_key,
        TEST_IDENTITY_ID,
        state.config.session_minutes,
    )
    .map_err(AppError::Internal)?;

    Ok(Json(json!({
        "status": "success",
        "message": "Mock authentication successful",
        "token": token,
        "user_id": TEST_IDENTITY_ID,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn random_hex(bytes: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

fn build_state_cookie(value: &str, production: bool) -> String {
    let secure = if production { "; Secure" } else { "" };
    format!(
        "{STATE_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={STATE_COOKIE_MAX_AGE_SECONDS}{secure}",
    )
}

fn clear_state_cookie(production: bool) -> String {
    let secure = if production { "; Secure" } else { "" };
    format!("{STATE_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{secure}")
}

fn state_cookie_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("oauth_state="))
        .map(str::to_string)
}
