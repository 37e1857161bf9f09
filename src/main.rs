//! Distribution Engine
//!
//! Pulls recent records from the CRM through a rate-limited worker pool and
//! serves them grouped by owner, country, and program:
//! - Owner lookup, primary record paging, per-record attribute enrichment
//! - Owner → country → program hierarchy with per-day counts
//! - Dashboard HTTP API with on-demand refresh

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use api::{router, AppState};
use crm_client::{EndpointConfig, HttpEndpoint, RemoteEndpoint};
use engine_core::AttributeFieldMap;
use hierarchy::{HierarchyBuilder, HierarchyConfig};
use telemetry::{health, init_tracing_from_env};
use worker::{FetchConfig, FetchPipeline, RefreshCoordinator};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Seconds between automatic refreshes, 0 disables them
    #[serde(default)]
    refresh_interval_secs: u64,

    #[serde(default)]
    endpoint: EndpointConfig,

    #[serde(default)]
    fetch: FetchConfig,

    /// Attribute keys of event time, country, program, and eligibility
    #[serde(default)]
    fields: AttributeFieldMap,

    #[serde(default)]
    hierarchy: HierarchyConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            refresh_interval_secs: 0,
            endpoint: EndpointConfig::default(),
            fetch: FetchConfig::default(),
            fields: AttributeFieldMap::default(),
            hierarchy: HierarchyConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Distribution Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let fetch = config
        .fetch
        .clone()
        .validated()
        .context("Invalid fetch configuration")?;

    info!(
        base_url = %config.endpoint.base_url,
        rate_limit = fetch.rate_limit,
        worker_count = fetch.worker_count,
        record_cap = fetch.record_cap,
        window_days = fetch.window_days,
        "Loaded configuration"
    );

    let endpoint: Arc<dyn RemoteEndpoint> = Arc::new(
        HttpEndpoint::new(&config.endpoint).context("Failed to create CRM endpoint client")?,
    );

    check_health(endpoint.as_ref(), &config.endpoint).await;
    health().snapshot.set_unhealthy("No refresh has completed yet");

    let window_days = fetch.window_days;
    let pipeline = FetchPipeline::new(
        endpoint,
        config.endpoint.clone(),
        fetch,
        config.fields.clone(),
    );
    let coordinator = Arc::new(RefreshCoordinator::new(pipeline));

    // Initial load in the background; the API answers 503 until it lands
    if let Err(e) = coordinator.start() {
        error!("Failed to start initial refresh: {}", e);
    }

    let _refresh_handle = (config.refresh_interval_secs > 0).then(|| {
        info!(every_secs = config.refresh_interval_secs, "Periodic refresh enabled");
        coordinator.start_periodic(Duration::from_secs(config.refresh_interval_secs))
    });

    let state = AppState::new(
        coordinator.clone(),
        HierarchyBuilder::new(config.hierarchy.clone()),
        window_days,
    );
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables, e.g. DISTRIBUTION__FETCH__RATE_LIMIT
        .add_source(
            config::Environment::with_prefix("DISTRIBUTION")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The token is usually provided on its own rather than nested
    if let Ok(token) = std::env::var("DISTRIBUTION_API_TOKEN") {
        config.endpoint.api_token = Some(token);
    }
    if let Ok(base_url) = std::env::var("DISTRIBUTION_BASE_URL") {
        config.endpoint.base_url = base_url;
    }

    Ok(config)
}

/// Check endpoint reachability on startup.
async fn check_health(endpoint: &dyn RemoteEndpoint, config: &EndpointConfig) {
    if crm_client::health::check_connection(endpoint, config).await {
        health().endpoint.set_healthy();
        info!("CRM endpoint: healthy");
    } else {
        health().endpoint.set_unhealthy("Connection failed");
        error!("CRM endpoint: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_config_keeps_normalization_rules() {
        let config = load_config().unwrap();
        let rules = &config.hierarchy.rules;

        assert_eq!(rules, &hierarchy::NormalizationRules::default());
        assert_eq!(
            rules.program_label("Malta", "Citizenship by Investment", ""),
            "CBI"
        );
        assert_eq!(rules.program_label("Italy", "Citizenship by Descent", ""), "CBD");
        assert_eq!(
            rules.program_label("Portugal", "Passive Income Visa", "Eligible Hot"),
            "D7 Hot"
        );
    }

    #[test]
    fn test_loaded_config_defaults() {
        let config = load_config().unwrap();
        assert_eq!(config.fields, AttributeFieldMap::default());
        assert_eq!(config.fetch.worker_count, 20);
        assert_eq!(config.refresh_interval_secs, 0);
    }
}
