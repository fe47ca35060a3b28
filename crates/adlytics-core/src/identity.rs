//! Authenticated-identity data model and the identity-provider seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespace prefix for upstream user ids, `google-oauth2|<id>`.
pub const PROVIDER_NAMESPACE: &str = "google-oauth2";

pub fn namespaced_id(upstream_id: &str) -> String {
    format!("{PROVIDER_NAMESPACE}|{upstream_id}")
}

/// A locally known user, created on first successful callback and refreshed
/// on every subsequent one. Never deleted; the store is process-lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Tokens obtained from the provider's token endpoint. Overwritten wholesale
/// on re-authentication; last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    /// Seconds until the access token expires, as reported by the provider.
    pub expires_in: Option<i64>,
}

/// Profile fields returned by the provider's userinfo endpoint.
#[derive(Debug, Clone, Default)]
pub struct UpstreamProfile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider returned an error payload or a non-2xx status.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("userinfo request failed: {0}")]
    UserInfo(String),
}

/// The external OAuth identity provider, reached over HTTP.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authorization URL carrying the redirect URI, scopes, and the
    /// anti-forgery state string.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for upstream tokens.
    async fn exchange_code(&self, code: &str) -> Result<UpstreamTokens, ProviderError>;

    /// Fetch the user profile with a freshly obtained access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<UpstreamProfile, ProviderError>;
}
