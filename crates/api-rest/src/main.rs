//! Standalone REST API server binary.
//!
//! ## Purpose
//! Serves the latest evaluated congestion cycle over HTTP, with OpenAPI/Swagger UI.
//!
//! ## Intended use
//! Cycles are evaluated once at start-up and then whenever a client calls
//! `POST /cycle/refresh`; scheduling the refresh cadence is left to the caller.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use api_rest::config::{EnvValues, RestConfig};
use api_rest::{app, AppState};
use edci_core::{load_or_default, CongestionEngine};
use edci_provider::{FileProvider, ReadingProvider, SyntheticProvider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the EDCI REST API server
///
/// # Environment Variables
/// - `EDCI_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `EDCI_CONFIG`: Engine configuration file (default: built-in thresholds and limits)
/// - `EDCI_READINGS_FILE`: Serve readings from this JSON/YAML file instead of synthetic data
/// - `EDCI_SEED`: Seed for synthetic readings (default: current time)
/// - `EDCI_DERIVE_EDCI`: Leave EDCI out of synthetic readings so the engine derives it
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - an environment variable or the engine configuration is malformed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("edci_core=warn".parse()?)
                .add_directive("edci_provider=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_cfg = RestConfig::from_env_values(EnvValues::from_env())?;
    let engine_cfg = load_or_default(rest_cfg.engine_config.as_deref())?;
    let engine = CongestionEngine::new(Arc::new(engine_cfg));

    let provider: Box<dyn ReadingProvider + Send> = match &rest_cfg.readings_file {
        Some(path) => {
            tracing::info!("-- Reading facility data from {}", path.display());
            Box::new(FileProvider::new(path.clone())?)
        }
        None => {
            let seed = rest_cfg.seed.unwrap_or_else(clock_seed);
            tracing::info!("-- Generating synthetic facility data (seed {})", seed);
            Box::new(SyntheticProvider::new(seed).with_reported_edci(!rest_cfg.derive_edci))
        }
    };

    let state = AppState::new(engine, provider);
    if let Err(e) = state.refresh().await {
        tracing::error!("Initial cycle failed, serving an empty snapshot: {}", e);
    }

    tracing::info!("-- Starting EDCI REST API on {}", rest_cfg.addr);

    let listener = tokio::net::TcpListener::bind(&rest_cfg.addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
