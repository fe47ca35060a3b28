//! Static substitute payloads, same shape as the real Ads source.
//!
//! Served when the upstream integration is unavailable and mock data is
//! allowed, and on explicit `use_mock` requests outside production.

use async_trait::async_trait;
use chrono::Datelike;

use adlytics_core::error::CoreError;
use adlytics_core::metrics::{AdRow, CampaignRow, MetricsSource};
use adlytics_core::period::DateRange;

/// Fixed per-campaign daily baselines. Values are deterministic so repeated
/// requests for the same range return identical payloads.
struct CampaignBaseline {
    id: i64,
    name: &'static str,
    status: &'static str,
    impressions: u64,
    clicks: u64,
    conversions: f64,
    cost_micros: u64,
}

const BASELINES: &[CampaignBaseline] = &[
    CampaignBaseline {
        id: 101,
        name: "Brand Search",
        status: "ENABLED",
        impressions: 4200,
        clicks: 320,
        conversions: 24.0,
        cost_micros: 180_000_000,
    },
    CampaignBaseline {
        id: 102,
        name: "Performance Max - Services",
        status: "ENABLED",
        impressions: 9800,
        clicks: 410,
        conversions: 18.5,
        cost_micros: 240_000_000,
    },
    CampaignBaseline {
        id: 103,
        name: "Retargeting Display",
        status: "PAUSED",
        impressions: 1500,
        clicks: 40,
        conversions: 2.0,
        cost_micros: 30_000_000,
    },
];

/// Lifetime horizon for the campaign listing, in days.
const CAMPAIGN_HORIZON_DAYS: f64 = 90.0;

#[derive(Debug, Default)]
pub struct MockAdsSource;

impl CampaignBaseline {
    /// Weekend traffic dips; weekday volume is the baseline.
    fn daily_row(&self, weekday: chrono::Weekday) -> AdRow {
        let factor = match weekday {
            chrono::Weekday::Sat | chrono::Weekday::Sun => 0.6,
            _ => 1.0,
        };
        let impressions = (self.impressions as f64 * factor) as u64;
        let clicks = (self.clicks as f64 * factor) as u64;
        let conversions = self.conversions * factor;
        let cost_micros = (self.cost_micros as f64 * factor) as u64;
        let cost = cost_micros as f64 / 1_000_000.0;

        AdRow {
            impressions,
            clicks,
            conversions,
            cost_micros,
            ctr: if impressions > 0 {
                clicks as f64 / impressions as f64
            } else {
                0.0
            },
            conversion_rate: if clicks > 0 {
                conversions / clicks as f64
            } else {
                0.0
            },
            cost_per_conversion: if conversions > 0.0 {
                cost / conversions
            } else {
                0.0
            },
        }
    }

    fn campaign_row(&self) -> CampaignRow {
        let impressions = (self.impressions as f64 * CAMPAIGN_HORIZON_DAYS) as u64;
        let clicks = (self.clicks as f64 * CAMPAIGN_HORIZON_DAYS) as u64;
        let conversions = self.conversions * CAMPAIGN_HORIZON_DAYS;
        let cost = self.cost_micros as f64 * CAMPAIGN_HORIZON_DAYS / 1_000_000.0;

        CampaignRow {
            id: self.id,
            name: self.name.to_string(),
            status: self.status.to_string(),
            impressions,
            clicks,
            conversions,
            cost,
            ctr: if impressions > 0 {
                clicks as f64 / impressions as f64 * 100.0
            } else {
                0.0
            },
            conversion_rate: if clicks > 0 {
                conversions / clicks as f64 * 100.0
            } else {
                0.0
            },
            cost_per_conversion: if conversions > 0.0 {
                cost / conversions
            } else {
                0.0
            },
        }
    }
}

#[async_trait]
impl MetricsSource for MockAdsSource {
    async fn fetch_rows(&self, range: &DateRange) -> Result<Vec<AdRow>, CoreError> {
        let mut rows = Vec::new();
        for day in range.start.iter_days().take_while(|d| *d <= range.end) {
            for baseline in BASELINES {
                rows.push(baseline.daily_row(day.weekday()));
            }
        }
        Ok(rows)
    }

    async fn fetch_campaigns(&self) -> Result<Vec<CampaignRow>, CoreError> {
        Ok(BASELINES.iter().map(CampaignBaseline::campaign_row).collect())
    }

    async fn probe(&self) -> Result<String, CoreError> {
        Ok("mock".to_string())
    }
}
