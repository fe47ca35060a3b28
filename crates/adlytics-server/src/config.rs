/// Re-export `Config` from `adlytics-core` for use within this crate.
///
/// All environment-variable parsing lives in `adlytics-core` so it can be
/// shared with integration tests and future crates without depending on the
/// full server.
pub use adlytics_core::config::Config;
