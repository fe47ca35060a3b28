//! Reporting-period resolution for the performance endpoints.

use chrono::{Duration, NaiveDate, Utc};

use crate::error::CoreError;

/// Inclusive date range, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of days covered, inclusive of both endpoints.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Resolved current period plus the optional comparison period preceding it.
#[derive(Debug, Clone, Copy)]
pub struct ReportingPeriods {
    pub current: DateRange,
    pub previous: Option<DateRange>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDateFormat(raw.to_string()))
}

impl ReportingPeriods {
    /// Resolve concrete period bounds from optional `YYYY-MM-DD` inputs.
    ///
    /// `end` defaults to yesterday, `start` to 30 days before `today`. A
    /// malformed date is an error — defaults are never substituted for bad
    /// input. An inverted range is passed through as-is; the query simply
    /// matches no rows.
    ///
    /// With `want_previous`, the previous period ends the day before
    /// `current.start` and spans exactly as many days as the current period.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        want_previous: bool,
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        let end = match end {
            Some(raw) => parse_date(raw)?,
            None => today - Duration::days(1),
        };
        let start = match start {
            Some(raw) => parse_date(raw)?,
            None => today - Duration::days(30),
        };
        let current = DateRange { start, end };

        let previous = if want_previous {
            let prev_end = current.start - Duration::days(1);
            let prev_start = prev_end - (current.end - current.start);
            Some(DateRange {
                start: prev_start,
                end: prev_end,
            })
        } else {
            None
        };

        Ok(Self { current, previous })
    }

    /// [`resolve`](Self::resolve) against today's UTC date.
    pub fn resolve_utc(
        start: Option<&str>,
        end: Option<&str>,
        want_previous: bool,
    ) -> Result<Self, CoreError> {
        Self::resolve(start, end, want_previous, Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn defaults_to_last_thirty_days_ending_yesterday() {
        let today = date(2024, 3, 15);
        let periods = ReportingPeriods::resolve(None, None, false, today).expect("periods");
        assert_eq!(periods.current.end, date(2024, 3, 14));
        assert_eq!(periods.current.start, date(2024, 2, 14));
        assert!(periods.previous.is_none());
    }

    #[test]
    fn previous_period_has_same_length_and_abuts_current() {
        let today = date(2024, 6, 1);
        let periods = ReportingPeriods::resolve(
            Some("2024-01-01"),
            Some("2024-01-10"),
            true,
            today,
        )
        .expect("periods");
        let previous = periods.previous.expect("previous range");

        assert_eq!(previous.end, date(2023, 12, 31));
        assert_eq!(previous.start, date(2023, 12, 22));
        assert_eq!(previous.num_days(), periods.current.num_days());
        assert_eq!(previous.end + Duration::days(1), periods.current.start);
    }

    #[test]
    fn previous_period_for_single_day_range() {
        let periods =
            ReportingPeriods::resolve(Some("2024-05-20"), Some("2024-05-20"), true, date(2024, 6, 1))
                .expect("periods");
        let previous = periods.previous.expect("previous range");
        assert_eq!(previous.start, date(2024, 5, 19));
        assert_eq!(previous.end, date(2024, 5, 19));
    }

    #[test]
    fn malformed_dates_are_rejected_not_defaulted() {
        let err = ReportingPeriods::resolve(Some("01/02/2024"), None, false, date(2024, 6, 1))
            .expect_err("must reject");
        assert!(matches!(err, CoreError::InvalidDateFormat(_)));

        let err = ReportingPeriods::resolve(None, Some("2024-13-40"), false, date(2024, 6, 1))
            .expect_err("must reject");
        assert!(matches!(err, CoreError::InvalidDateFormat(_)));
    }

    #[test]
    fn inverted_range_passes_through() {
        let periods =
            ReportingPeriods::resolve(Some("2024-02-10"), Some("2024-02-01"), false, date(2024, 6, 1))
                .expect("periods");
        assert!(periods.current.end < periods.current.start);
    }
}
