use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhirstarter_core::config::{
    first_logical_id_from_env_value, seed_count_from_env_value, seed_demo_from_env_value,
};
use fhirstarter_core::{CoreConfig, DEFAULT_BASE_PATH, DEFAULT_REST_ADDR, PatientService};

/// Main entry point for the FHIR starter server
///
/// Builds the in-memory patient store, optionally seeds demo patients, and serves the REST API.
///
/// # Environment Variables
/// - `FHIRSTARTER_REST_ADDR`: REST server address (default: "0.0.0.0:8080")
/// - `FHIRSTARTER_BASE_PATH`: prefix for FHIR resource routes (default: "/fhir")
/// - `FHIRSTARTER_SEED_DEMO`: seed demo patients at startup (default: true)
/// - `FHIRSTARTER_SEED_COUNT`: number of demo patients (default: 10)
/// - `FHIRSTARTER_FIRST_ID`: first logical id allocated by the store (default: 51)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fhirstarter_run=info".parse()?)
                .add_directive("fhirstarter_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("FHIRSTARTER_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let base_path =
        std::env::var("FHIRSTARTER_BASE_PATH").unwrap_or_else(|_| DEFAULT_BASE_PATH.into());

    let cfg = CoreConfig::new(
        first_logical_id_from_env_value(std::env::var("FHIRSTARTER_FIRST_ID").ok())?,
        seed_demo_from_env_value(std::env::var("FHIRSTARTER_SEED_DEMO").ok())?,
        seed_count_from_env_value(std::env::var("FHIRSTARTER_SEED_COUNT").ok())?,
    )?;
    let patient_service = PatientService::from_config(&cfg)?;

    tracing::info!(
        "++ Starting FHIR starter REST on {} (base path {})",
        rest_addr,
        base_path
    );

    api_rest::serve(&rest_addr, patient_service, &base_path).await
}
