//! The four-phase fetch pipeline: lookup, primary records, attribute
//! enrichment, merge. Phases run strictly in order; every remote call of a
//! run goes through one rate limiter.

use crate::config::FetchConfig;
use crate::context::FetchContext;
use crate::enrichment::AttributeEnrichmentPool;
use crate::lookup::LookupFetcher;
use crate::merge::merge_records;
use crate::primary::PrimaryFetcher;
use chrono::{DateTime, Utc};
use crm_client::{EndpointConfig, RateLimiter, RemoteEndpoint};
use engine_core::{
    AttributeFieldMap, EnrichedRecord, LookupTable, Phase, ProgressEvent, ProgressSink, Result,
};
use std::sync::Arc;
use tracing::info;

/// Everything one successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<EnrichedRecord>,
    pub lookup: LookupTable,
    /// The record cap cut the primary listing short
    pub truncated: bool,
    /// Identifiers whose attribute fetch failed, sorted
    pub failed_ids: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

pub struct FetchPipeline {
    context: FetchContext,
    config: FetchConfig,
    fields: AttributeFieldMap,
}

impl FetchPipeline {
    /// Builds a pipeline with its own rate limiter.
    pub fn new(
        endpoint: Arc<dyn RemoteEndpoint>,
        endpoint_config: EndpointConfig,
        config: FetchConfig,
        fields: AttributeFieldMap,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_config()));
        Self {
            context: FetchContext::new(endpoint, limiter, endpoint_config),
            config,
            fields,
        }
    }

    pub async fn run(&self, sink: Arc<dyn ProgressSink>) -> Result<PipelineOutput> {
        self.run_at(Utc::now(), sink).await
    }

    /// Run with an explicit "now" for the creation-date window.
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<PipelineOutput> {
        let lookup = LookupFetcher::new(self.context.clone(), self.config.page_size)
            .fetch(sink.as_ref())
            .await?;

        let batch = PrimaryFetcher::new(
            self.context.clone(),
            self.config.page_size,
            self.config.record_cap,
            self.config.window_days,
        )
        .fetch(now, sink.as_ref())
        .await?;

        let ids: Vec<String> = batch.records.iter().map(|r| r.id.clone()).collect();
        let enrichment = AttributeEnrichmentPool::new(self.context.clone(), self.config.worker_count)
            .run(ids, sink.clone())
            .await;

        let records = merge_records(
            batch.records,
            &enrichment.attributes,
            &lookup,
            &self.fields,
            sink.as_ref(),
        );

        let total = records.len();
        sink.emit(ProgressEvent::new(
            Phase::Complete,
            format!("Loaded {} records", total),
            total,
            total,
            100.0,
        ));
        info!(
            records = total,
            owners = lookup.len(),
            failed = enrichment.failed_ids.len(),
            truncated = batch.truncated,
            "Fetch pipeline complete"
        );

        Ok(PipelineOutput {
            records,
            lookup,
            truncated: batch.truncated,
            failed_ids: enrichment.failed_ids,
            fetched_at: now,
        })
    }
}
