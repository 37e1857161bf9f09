//! Tracing setup for structured logging.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when neither `RUST_LOG` nor a configured filter parses.
/// HTTP client internals stay at warn so per-request enrichment calls
/// don't drown the pipeline logs.
pub const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Log filter (e.g., "info", "worker=debug,crm_client=trace")
    pub filter: String,
    /// One JSON object per line instead of human-readable output
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// Build from `RUST_LOG` and `LOG_JSON` values.
    pub fn from_values(rust_log: Option<String>, log_json: Option<String>) -> Self {
        Self {
            filter: rust_log
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            json: log_json.is_some_and(|v| is_enabled(&v)),
        }
    }

    pub fn from_env() -> Self {
        Self::from_values(std::env::var("RUST_LOG").ok(), std::env::var("LOG_JSON").ok())
    }
}

fn is_enabled(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Install the global subscriber.
///
/// Returns false when one is already installed; the first one stays.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = if config.json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(filter = %config.filter, json = config.json, "Tracing initialized");
    }
    installed
}

/// Initialize tracing from `RUST_LOG` and `LOG_JSON`.
pub fn init_tracing_from_env() {
    init_tracing(&TracingConfig::from_env());
}
