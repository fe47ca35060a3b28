//! Google Ads REST client (GAQL search over `googleAds:search`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use adlytics_core::config::{AdsSettings, OAuthSettings};
use adlytics_core::error::CoreError;
use adlytics_core::metrics::{AdRow, CampaignRow, MetricsSource};
use adlytics_core::period::DateRange;

#[derive(Debug)]
pub struct GoogleAdsClient {
    http: reqwest::Client,
    ads: AdsSettings,
    oauth: OAuthSettings,
    /// Access token minted via the refresh-token grant, reused until shortly
    /// before expiry.
    token_cache: Mutex<Option<CachedToken>>,
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

impl GoogleAdsClient {
    pub fn new(ads: AdsSettings, oauth: OAuthSettings) -> Result<Self, CoreError> {
        for (field, value) in [
            ("developer_token", &ads.developer_token),
            ("customer_id", &ads.customer_id),
            ("refresh_token", &ads.refresh_token),
        ] {
            if value.is_empty() {
                return Err(CoreError::UpstreamUnavailable(format!(
                    "Ads client misconfigured: {field} is empty"
                )));
            }
        }
        if !oauth.is_configured() {
            return Err(CoreError::UpstreamUnavailable(
                "Ads client requires OAuth client credentials".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CoreError::UpstreamUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            ads,
            oauth,
            token_cache: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        let mut cache = self.token_cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            // 60 second slack so a token never expires mid-query.
            if cached.expires_at > Utc::now() + chrono::Duration::seconds(60) {
                return Ok(cached.access_token.clone());
            }
        }

        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
            ("refresh_token", self.ads.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = self
            .http
            .post(&self.oauth.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(format!("token refresh: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::UpstreamUnavailable(format!(
                "token refresh returned {}",
                response.status()
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(format!("token refresh: {e}")))?;

        let access_token = refreshed.access_token.clone();
        *cache = Some(CachedToken {
            access_token: refreshed.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(refreshed.expires_in.unwrap_or(3600)),
        });
        Ok(access_token)
    }

    async fn search(&self, query: &str) -> Result<Vec<Value>, CoreError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/customers/{}/googleAds:search",
            self.ads.api_base, self.ads.customer_id
        );

        tracing::debug!(%query, "Issuing GAQL search");
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("developer-token", &self.ads.developer_token)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::UpstreamUnavailable(format!(
                "Google Ads API returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(e.to_string()))?;
        Ok(body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

fn performance_query(range: &DateRange) -> String {
    format!(
        "SELECT metrics.impressions, metrics.clicks, metrics.conversions, \
         metrics.cost_micros, metrics.ctr, \
         metrics.conversions_from_interactions_rate, metrics.cost_per_conversion \
         FROM campaign \
         WHERE segments.date BETWEEN '{}' AND '{}' \
         AND campaign.status != 'REMOVED'",
        range.start, range.end
    )
}

const CAMPAIGNS_QUERY: &str = "SELECT campaign.id, campaign.name, campaign.status, \
     metrics.impressions, metrics.clicks, metrics.conversions, metrics.cost_micros, \
     metrics.ctr, metrics.conversions_from_interactions_rate, metrics.cost_per_conversion \
     FROM campaign \
     WHERE campaign.status != 'REMOVED' \
     ORDER BY metrics.impressions DESC";

// The REST transport encodes int64 fields as JSON strings; accept both.
fn field_f64(value: &Value, field: &str) -> f64 {
    match value.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn field_u64(value: &Value, field: &str) -> u64 {
    match value.get(field) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn row_from_result(result: &Value) -> AdRow {
    let metrics = result.get("metrics").cloned().unwrap_or(Value::Null);
    AdRow {
        impressions: field_u64(&metrics, "impressions"),
        clicks: field_u64(&metrics, "clicks"),
        conversions: field_f64(&metrics, "conversions"),
        cost_micros: field_u64(&metrics, "costMicros"),
        ctr: field_f64(&metrics, "ctr"),
        conversion_rate: field_f64(&metrics, "conversionsFromInteractionsRate"),
        // Normalize to currency units here so aggregation stays unit-free.
        cost_per_conversion: field_f64(&metrics, "costPerConversion") / 1_000_000.0,
    }
}

fn campaign_from_result(result: &Value) -> CampaignRow {
    let campaign = result.get("campaign").cloned().unwrap_or(Value::Null);
    let metrics = result.get("metrics").cloned().unwrap_or(Value::Null);
    CampaignRow {
        id: field_u64(&campaign, "id") as i64,
        name: campaign
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        status: campaign
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string(),
        impressions: field_u64(&metrics, "impressions"),
        clicks: field_u64(&metrics, "clicks"),
        conversions: field_f64(&metrics, "conversions"),
        cost: field_f64(&metrics, "costMicros") / 1_000_000.0,
        ctr: field_f64(&metrics, "ctr") * 100.0,
        conversion_rate: field_f64(&metrics, "conversionsFromInteractionsRate") * 100.0,
        cost_per_conversion: field_f64(&metrics, "costPerConversion") / 1_000_000.0,
    }
}

#[async_trait]
impl MetricsSource for GoogleAdsClient {
    async fn fetch_rows(&self, range: &DateRange) -> Result<Vec<AdRow>, CoreError> {
        let results = self.search(&performance_query(range)).await?;
        Ok(results.iter().map(row_from_result).collect())
    }

    async fn fetch_campaigns(&self) -> Result<Vec<CampaignRow>, CoreError> {
        let results = self.search(CAMPAIGNS_QUERY).await?;
        Ok(results.iter().map(campaign_from_result).collect())
    }

    async fn probe(&self) -> Result<String, CoreError> {
        self.search("SELECT customer.id FROM customer LIMIT 1")
            .await?;
        Ok(self.ads.customer_id.clone())
    }
}
