//! Fetch pipeline configuration.

use crm_client::RateLimitConfig;
use engine_core::limits::{
    DEFAULT_PAGE_SIZE, DEFAULT_RATE_LIMIT, DEFAULT_RECORD_CAP, DEFAULT_WINDOW_DAYS,
    DEFAULT_WORKER_COUNT,
};
use engine_core::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tunables of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FetchConfig {
    /// Requests admitted per second
    #[serde(default = "default_rate_limit")]
    #[validate(range(min = 1, max = 100))]
    pub rate_limit: u32,
    /// Enrichment workers, also the in-flight ceiling
    #[serde(default = "default_worker_count")]
    #[validate(range(min = 1, max = 200))]
    pub worker_count: usize,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: usize,
    /// Primary records kept per run
    #[serde(default = "default_record_cap")]
    #[validate(range(min = 1, max = 100000))]
    pub record_cap: usize,
    /// Trailing window, in days, for the creation-date filter and the week view
    #[serde(default = "default_window_days")]
    #[validate(range(min = 1, max = 90))]
    pub window_days: u32,
}

fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_record_cap() -> usize {
    DEFAULT_RECORD_CAP
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            worker_count: default_worker_count(),
            page_size: default_page_size(),
            record_cap: default_record_cap(),
            window_days: default_window_days(),
        }
    }
}

impl FetchConfig {
    /// Validate ranges, mapping failures to a configuration error.
    pub fn validated(self) -> Result<Self> {
        self.validate()
            .map_err(|e| Error::config(format!("fetch: {}", e)))?;
        Ok(self)
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            rate: self.rate_limit,
            max_in_flight: self.worker_count,
        }
    }
}
