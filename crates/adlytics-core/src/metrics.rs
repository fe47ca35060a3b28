//! Metric aggregation and period-over-period comparison.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::period::DateRange;

/// Relative change between two values, as a percentage rounded to two
/// decimal places.
///
/// Zero-previous policy: growth from nothing reads as `100`, and `0 -> 0`
/// reads as `0`. Applied uniformly to every metric.
pub fn change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current == 0.0 { 0.0 } else { 100.0 };
    }
    round2(((current - previous) / previous) * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One row of upstream metrics, at whatever granularity the provider returns
/// (campaign-day in practice). Rates are carried as reported upstream; cost
/// fields are micro-units except where noted by the producing client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdRow {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub cost_micros: u64,
    pub ctr: f64,
    pub conversion_rate: f64,
    pub cost_per_conversion: f64,
}

/// Normalized totals for one reporting period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBundle {
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    /// Currency units, converted from accumulated micros.
    pub cost: f64,
    pub click_through_rate: f64,
    pub conversion_rate: f64,
    pub cost_per_conversion: f64,
}

impl MetricBundle {
    /// Accumulate raw rows into period totals.
    ///
    /// Rate metrics are volume-weighted: CTR by impressions, conversion rate
    /// by clicks, cost per conversion by conversions. The upstream rates are
    /// themselves averages over rows of very different volume, so an
    /// unweighted mean would let low-volume rows dominate. A zero denominator
    /// yields `0` for that rate.
    pub fn from_rows(rows: &[AdRow]) -> Self {
        let mut impressions: u64 = 0;
        let mut clicks: u64 = 0;
        let mut conversions = 0.0;
        let mut cost_micros: u64 = 0;
        let mut weighted_ctr = 0.0;
        let mut weighted_conversion_rate = 0.0;
        let mut weighted_cost_per_conversion = 0.0;

        for row in rows {
            impressions += row.impressions;
            clicks += row.clicks;
            conversions += row.conversions;
            cost_micros += row.cost_micros;

            if row.impressions > 0 {
                weighted_ctr += row.ctr * row.impressions as f64;
            }
            if row.clicks > 0 {
                weighted_conversion_rate += row.conversion_rate * row.clicks as f64;
            }
            if row.conversions > 0.0 {
                weighted_cost_per_conversion += row.cost_per_conversion * row.conversions;
            }
        }

        let click_through_rate = if impressions > 0 {
            weighted_ctr / impressions as f64
        } else {
            0.0
        };
        let conversion_rate = if clicks > 0 {
            weighted_conversion_rate / clicks as f64
        } else {
            0.0
        };
        let cost_per_conversion = if conversions > 0.0 {
            weighted_cost_per_conversion / conversions
        } else {
            0.0
        };

        Self {
            impressions: impressions as f64,
            clicks: clicks as f64,
            conversions,
            cost: cost_micros as f64 / 1_000_000.0,
            click_through_rate,
            conversion_rate,
            cost_per_conversion,
        }
    }
}

/// A metric value paired with its period-over-period change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub value: f64,
    pub change: f64,
}

/// The dashboard-facing comparison result. All seven metrics are always
/// present, even when their value is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub impressions: MetricDelta,
    pub clicks: MetricDelta,
    pub conversions: MetricDelta,
    pub cost: MetricDelta,
    pub click_through_rate: MetricDelta,
    pub conversion_rate: MetricDelta,
    pub cost_per_conversion: MetricDelta,
}

impl PerformanceReport {
    /// Combine a current-period bundle with an optional previous-period
    /// bundle. Without a previous bundle every `change` is `0`.
    pub fn assemble(current: &MetricBundle, previous: Option<&MetricBundle>) -> Self {
        let delta = |cur: f64, prev: Option<f64>| MetricDelta {
            value: cur,
            change: prev.map_or(0.0, |p| change(cur, p)),
        };

        Self {
            impressions: delta(current.impressions, previous.map(|p| p.impressions)),
            clicks: delta(current.clicks, previous.map(|p| p.clicks)),
            conversions: delta(current.conversions, previous.map(|p| p.conversions)),
            cost: delta(current.cost, previous.map(|p| p.cost)),
            click_through_rate: delta(
                current.click_through_rate,
                previous.map(|p| p.click_through_rate),
            ),
            conversion_rate: delta(current.conversion_rate, previous.map(|p| p.conversion_rate)),
            cost_per_conversion: delta(
                current.cost_per_conversion,
                previous.map(|p| p.cost_per_conversion),
            ),
        }
    }
}

/// One upstream campaign with its lifetime metrics, reshaped for the
/// dashboard (rates as percentages, cost in currency units).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRow {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub cost: f64,
    pub ctr: f64,
    pub conversion_rate: f64,
    #[serde(rename = "costPerConversion")]
    pub cost_per_conversion: f64,
}

/// The external advertising-metrics query service.
///
/// Implemented by the real Google Ads REST client and by the static mock
/// source that stands in for it when the integration is unavailable.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// One query per reporting period.
    async fn fetch_rows(&self, range: &DateRange) -> Result<Vec<AdRow>, CoreError>;

    /// Campaign listing with lifetime metrics.
    async fn fetch_campaigns(&self) -> Result<Vec<CampaignRow>, CoreError>;

    /// Cheapest possible round-trip; returns the account id on success.
    async fn probe(&self) -> Result<String, CoreError>;
}
