//! Google OAuth 2.0 client: authorization URL, code exchange, userinfo.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use adlytics_core::config::OAuthSettings;
use adlytics_core::identity::{IdentityProvider, ProviderError, UpstreamProfile, UpstreamTokens};

pub struct GoogleOAuthClient {
    http: reqwest::Client,
    settings: OAuthSettings,
    auth_endpoint: Url,
}

/// Raw token-endpoint response shape.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    id_token: Option<String>,
    expires_in: Option<i64>,
}

impl From<TokenResponse> for UpstreamTokens {
    fn from(raw: TokenResponse) -> Self {
        Self {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            id_token: raw.id_token,
            expires_in: raw.expires_in,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl GoogleOAuthClient {
    pub fn new(settings: OAuthSettings) -> Result<Self, ProviderError> {
        let auth_endpoint = Url::parse(&settings.auth_uri)
            .map_err(|e| ProviderError::Provider(format!("invalid auth_uri: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Provider(e.to_string()))?;
        Ok(Self {
            http,
            settings,
            auth_endpoint,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.auth_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.settings.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("access_type", "offline")
            .append_pair("include_granted_scopes", "true")
            .append_pair("prompt", "consent");
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<UpstreamTokens, ProviderError> {
        let params = [
            ("code", code),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.settings.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::TokenExchange(format!("{status}: {body}")));
        }

        let raw: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;
        Ok(raw.into())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UpstreamProfile, ProviderError> {
        let response = self
            .http
            .get(&self.settings.userinfo_uri)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::UserInfo(format!(
                "userinfo returned {}",
                response.status()
            )));
        }

        let raw: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?;

        let id = match raw.id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(ProviderError::UserInfo("profile carried no id".to_string())),
        };

        Ok(UpstreamProfile {
            id,
            name: raw.name,
            email: raw.email,
            picture: raw.picture,
        })
    }
}
