//! Google integration backends: the OAuth 2.0 identity-provider client and
//! the Ads REST metrics source, plus the static mock source that stands in
//! for the latter when the integration is unavailable.

pub mod ads;
pub mod mock;
pub mod oauth;

pub use ads::GoogleAdsClient;
pub use mock::MockAdsSource;
pub use oauth::GoogleOAuthClient;
