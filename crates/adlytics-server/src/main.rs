use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use adlytics_core::identity::IdentityProvider;
use adlytics_core::metrics::MetricsSource;
use adlytics_google::{GoogleAdsClient, GoogleOAuthClient};
use adlytics_server::state::AppState;

/// `adlytics health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$ADLYTICS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("ADLYTICS_PORT").unwrap_or_else(|_| "5002".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Health-check subcommand — handled before tokio runtime work so the
    // binary stays fast when used as a Docker HEALTHCHECK probe.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Initialise structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adlytics=info".parse()?),
        )
        .json()
        .init();

    let cfg = adlytics_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let provider: Option<Arc<dyn IdentityProvider>> = if cfg.oauth.is_configured() {
        match GoogleOAuthClient::new(cfg.oauth.clone()) {
            Ok(client) => {
                info!("Google OAuth client ready");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build Google OAuth client — login disabled");
                None
            }
        }
    } else {
        tracing::warn!(
            "Google OAuth not configured — login flow disabled. \
             Set ADLYTICS_GOOGLE_CLIENT_ID and ADLYTICS_GOOGLE_CLIENT_SECRET. \
             Mock tokens remain available outside production."
        );
        None
    };

    let ads: Option<Arc<dyn MetricsSource>> = match cfg.ads.clone() {
        Some(settings) => match GoogleAdsClient::new(settings, cfg.oauth.clone()) {
            Ok(client) => {
                info!("Google Ads client ready");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build Google Ads client");
                None
            }
        },
        None => {
            tracing::warn!(
                allow_mock_data = cfg.allow_mock_data,
                "Ads integration not configured — performance routes serve mock data when allowed"
            );
            None
        }
    };

    let addr = format!("0.0.0.0:{}", cfg.port);
    let state = Arc::new(AppState::new(cfg.clone(), provider, ads));
    let app = adlytics_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, environment = ?cfg.environment, "Adlytics listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
