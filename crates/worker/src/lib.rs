//! Fetch pipeline and refresh coordination.
//!
//! - Lookup (owner id → display name)
//! - Primary records (trailing window, capped)
//! - Attribute enrichment (bounded worker pool behind the rate limiter)
//! - Merge into enriched records
//! - Refresh coordinator holding the current snapshot

pub mod config;
pub mod context;
pub mod enrichment;
pub mod lookup;
pub mod merge;
pub mod pipeline;
pub mod primary;
pub mod refresh;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::FetchConfig;
pub use context::FetchContext;
pub use enrichment::{AttributeEnrichmentPool, EnrichmentOutcome};
pub use lookup::LookupFetcher;
pub use merge::merge_records;
pub use pipeline::*;
pub use primary::{PrimaryBatch, PrimaryFetcher};
pub use refresh::*;
