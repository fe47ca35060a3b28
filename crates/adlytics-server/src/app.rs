use std::sync::Arc;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use adlytics_core::config::Config;

use crate::{auth, routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — configured origins for the dashboard frontend;
///    permissive when none are configured (development).
///
/// The `/api/ads/*` routes sit behind the bearer-auth middleware; the auth
/// and health routes are public.
pub fn build_app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/ads/performance", get(routes::ads::performance))
        .route("/api/ads/campaigns", get(routes::ads::campaigns))
        .route("/api/ads/test-connection", get(routes::ads::test_connection))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::middleware::require_auth,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/auth/login", get(auth::handlers::login))
        .route("/api/auth/callback", get(auth::handlers::callback))
        .route("/api/auth/verify", get(auth::handlers::verify))
        .route("/api/auth/mock-token", get(auth::handlers::mock_token))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&state.config))
        .with_state(state)
}

fn build_cors(config: &Config) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
