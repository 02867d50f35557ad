use cds_core::config::core_config_from_lookup;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the CDS Hooks engine
///
/// Loads `.env`, resolves the core configuration, expands every rule table against the
/// terminology server and then serves the REST API.
///
/// # Environment Variables
/// - `CDS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CDS_TERMINOLOGY_URL`: FHIR terminology server base URL
/// - `CDS_TERMINOLOGY_TIMEOUT_SECS`: Terminology request timeout
/// - `CDS_RULES_MEDICATION_CONDITION`, `CDS_RULES_MEDICATION_MEDICATION`,
///   `CDS_RULES_DOSE_FORMS`, `CDS_RULES_SUBSTANCE_DDD`: Rule table paths
/// - `CDS_ACCEPTABLE_DAILY_DOSE_FACTOR`, `CDS_MAXIMUM_DAILY_DOSE_FACTOR`: Dose alert thresholds
/// - `CDS_CARD_SUMMARY_TEMPLATE`, `CDS_ATC_URL_TEMPLATE`: Dose card text
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, rule loading or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("cds=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CDS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = core_config_from_lookup(|name| std::env::var(name).ok())?;
    tracing::info!("++ Loading CDS rules from terminology server {}", cfg.terminology_url());
    let state = tokio::task::spawn_blocking(move || api_rest::build_state(cfg)).await??;

    tracing::info!("++ Starting CDS REST on {}", rest_addr);
    api_rest::serve(&rest_addr, state).await
}
