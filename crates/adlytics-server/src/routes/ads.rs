use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use adlytics_core::error::CoreError;
use adlytics_core::metrics::{MetricBundle, MetricsSource, PerformanceReport};
use adlytics_core::period::ReportingPeriods;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PerformanceQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub previous_period: bool,
    #[serde(default)]
    pub use_mock: bool,
}

/// `GET /api/ads/performance` — aggregated metrics with optional
/// previous-period comparison.
pub async fn performance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PerformanceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let periods = ReportingPeriods::resolve_utc(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        query.previous_period,
    )?;

    let (source, is_mock) = state.metrics_source(query.use_mock)?;

    let report = match fetch_report(source.as_ref(), &periods).await {
        Ok(report) => report,
        Err(CoreError::UpstreamUnavailable(message))
            if !is_mock && state.config.allow_mock_data =>
        {
            tracing::warn!(error = %message, "Ads query failed — falling back to mock data");
            fetch_report(state.mock_ads.as_ref(), &periods).await?
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(report))
}

/// Aggregate one bundle per resolved period and assemble the comparison.
///
/// The two period queries are independent of each other and run
/// concurrently. A current-period failure propagates; a previous-period
/// failure only degrades the comparison (changes all zero), logged so the
/// degradation stays observable.
async fn fetch_report(
    source: &dyn MetricsSource,
    periods: &ReportingPeriods,
) -> Result<PerformanceReport, CoreError> {
    let Some(previous_range) = periods.previous else {
        let rows = source.fetch_rows(&periods.current).await?;
        return Ok(PerformanceReport::assemble(
            &MetricBundle::from_rows(&rows),
            None,
        ));
    };

    let (current_rows, previous_rows) = tokio::join!(
        source.fetch_rows(&periods.current),
        source.fetch_rows(&previous_range)
    );

    let current = MetricBundle::from_rows(&current_rows?);
    let previous = match previous_rows {
        Ok(rows) => Some(MetricBundle::from_rows(&rows)),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Previous-period fetch failed — serving current period without comparison"
            );
            None
        }
    };

    Ok(PerformanceReport::assemble(&current, previous.as_ref()))
}

#[derive(Debug, Deserialize)]
pub struct CampaignsQuery {
    #[serde(default)]
    pub use_mock: bool,
}

/// `GET /api/ads/campaigns` — campaign listing with lifetime metrics.
pub async fn campaigns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CampaignsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (source, is_mock) = state.metrics_source(query.use_mock)?;

    let rows = match source.fetch_campaigns().await {
        Ok(rows) => rows,
        Err(CoreError::UpstreamUnavailable(message))
            if !is_mock && state.config.allow_mock_data =>
        {
            tracing::warn!(error = %message, "Campaign query failed — falling back to mock data");
            state.mock_ads.fetch_campaigns().await?
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(rows))
}

/// `GET /api/ads/test-connection` — diagnostics probe against the real
/// upstream. Reports status in the body instead of failing the route.
pub async fn test_connection(State(state): State<Arc<AppState>>) -> Json<Value> {
    match &state.ads {
        None => Json(json!({
            "status": "error",
            "message": "Google Ads integration is not configured",
        })),
        Some(source) => match source.probe().await {
            Ok(customer_id) => Json(json!({
                "status": "success",
                "message": "Google Ads API connection successful",
                "customer_id": customer_id,
            })),
            Err(e) => {
                tracing::error!(error = %e, "Ads connection test failed");
                Json(json!({
                    "status": "error",
                    "message": format!("Google Ads API connection failed: {e}"),
                }))
            }
        },
    }
}
