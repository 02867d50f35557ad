//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the CDS Hooks REST API server on its own, without loading `.env`.
//!
//! ## Intended use
//! Development and debugging of the HTTP layer. The workspace's main `cds-run` binary is the
//! deployable entry point.

use cds_core::config::core_config_from_lookup;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the CDS REST API server
///
/// Loads the rule tables, then serves on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `CDS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CDS_TERMINOLOGY_URL`, `CDS_RULES_*` and the dose settings read by
///   [`core_config_from_lookup`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the rule tables cannot be loaded,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("cds_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CDS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = core_config_from_lookup(|name| std::env::var(name).ok())?;
    tracing::info!("-- Loading CDS rules, terminology server {}", cfg.terminology_url());
    let state = tokio::task::spawn_blocking(move || api_rest::build_state(cfg)).await??;

    tracing::info!("-- Starting CDS REST API on {}", addr);
    api_rest::serve(&addr, state).await
}
