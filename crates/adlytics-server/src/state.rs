use std::sync::Arc;

use adlytics_core::config::Config;
use adlytics_core::identity::{Identity, IdentityProvider, UpstreamTokens};
use adlytics_core::metrics::MetricsSource;
use adlytics_core::store::KeyValueStore;
use adlytics_google::MockAdsSource;

use crate::auth::store::MemoryStore;
use crate::error::AppError;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// All fields are safe to clone cheaply — heavy resources are wrapped in
/// `Arc`.
pub struct AppState {
    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// The OAuth identity provider, absent when client credentials are not
    /// configured (login is then disabled; mock tokens remain available
    /// outside production).
    pub provider: Option<Arc<dyn IdentityProvider>>,

    /// The real metrics backend, absent when the Ads integration is not
    /// configured or its client could not be constructed.
    pub ads: Option<Arc<dyn MetricsSource>>,

    /// Static substitute payload source, always constructible.
    pub mock_ads: Arc<dyn MetricsSource>,

    /// Process-lifetime user records keyed by namespaced external id.
    /// Upserted on every successful callback; last write wins.
    pub identities: Arc<dyn KeyValueStore<Identity>>,

    /// Upstream token records keyed the same way, superseded wholesale on
    /// re-authentication.
    pub upstream_tokens: Arc<dyn KeyValueStore<UpstreamTokens>>,
}

impl AppState {
    pub fn new(
        config: Config,
        provider: Option<Arc<dyn IdentityProvider>>,
        ads: Option<Arc<dyn MetricsSource>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            ads,
            mock_ads: Arc::new(MockAdsSource),
            identities: Arc::new(MemoryStore::new()),
            upstream_tokens: Arc::new(MemoryStore::new()),
        }
    }

    /// Pick the metrics source for a request.
    ///
    /// Returns the source plus whether it is the mock. `use_mock` forces the
    /// mock where allowed; an unconfigured integration degrades to the mock
    /// only when mock data is allowed, otherwise the caller gets the
    /// upstream-unavailable error.
    pub fn metrics_source(
        &self,
        use_mock: bool,
    ) -> Result<(Arc<dyn MetricsSource>, bool), AppError> {
        if use_mock {
            if !self.config.allow_mock_data {
                return Err(AppError::BadRequest(
                    "mock data is not allowed in this environment".to_string(),
                ));
            }
            return Ok((Arc::clone(&self.mock_ads), true));
        }

        match &self.ads {
            Some(source) => Ok((Arc::clone(source), false)),
            None if self.config.allow_mock_data => {
                tracing::warn!("Ads integration not configured — serving mock data");
                Ok((Arc::clone(&self.mock_ads), true))
            }
            None => Err(AppError::UpstreamUnavailable(
                "Google Ads integration is not configured".to_string(),
            )),
        }
    }
}
