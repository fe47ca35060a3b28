use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid date format: {0:?} (expected YYYY-MM-DD)")]
    InvalidDateFormat(String),

    /// The metrics backend could not be constructed or the query failed.
    ///
    /// Never swallowed into zero values — zeros are a valid metric result and
    /// must stay distinguishable from an outage.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}
