use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, log_connectivity, router, AppState};
use consent_core::RedcapClient;

/// Main entry point for the consent-sync service
///
/// Loads configuration, probes the REDCap host once, then serves the REST API.
///
/// # Environment Variables
/// - `REDCAP_API_URL`: REDCap API endpoint (required)
/// - `REDCAP_SOURCE_TOKEN`: API token for the screening (source) project (required)
/// - `REDCAP_TARGET_TOKEN`: API token for the consent (target) project (required)
/// - `REDCAP_TIMEOUT_SECS`: per-call timeout in seconds (default: 5)
/// - `CONSENT_REST_ADDR`: REST server address (default: "0.0.0.0:5000")
/// - `CONSENT_SKIP_CONNECTIVITY_CHECK`: set to `1`/`true` to skip the startup probe
///
/// # Errors
/// Returns an error if:
/// - any required setting is missing or invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("consent_run=info".parse()?)
                .add_directive("consent_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = core_config_from_env()?;
    log_connectivity(&cfg).await;

    let addr = std::env::var("CONSENT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into());
    tracing::info!("++ Starting consent-sync REST on {}", addr);

    let store = Arc::new(RedcapClient::new(&cfg)?);
    let app = router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
