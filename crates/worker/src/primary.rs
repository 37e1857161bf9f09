//! Phase 2: primary records created inside the trailing window.

use crate::context::FetchContext;
use chrono::{DateTime, Duration, Utc};
use crm_client::models::{decode, RecordsPage};
use engine_core::limits::PRIMARY_PHASE_PERCENT_CAP;
use engine_core::{percent, Phase, PrimaryRecord, ProgressEvent, ProgressSink, Result};
use telemetry::metrics;
use tracing::{debug, info, warn};

/// Result of the primary phase.
#[derive(Debug, Clone, Default)]
pub struct PrimaryBatch {
    /// Newest first, at most `record_cap` entries
    pub records: Vec<PrimaryRecord>,
    /// Total the endpoint reported for the filter, if any
    pub reported_total: Option<usize>,
    /// The cap stopped the fetch while more data was available
    pub truncated: bool,
}

/// Pages through primary records, newest first, up to a cap.
pub struct PrimaryFetcher {
    context: FetchContext,
    page_size: usize,
    record_cap: usize,
    window_days: u32,
}

impl PrimaryFetcher {
    pub fn new(context: FetchContext, page_size: usize, record_cap: usize, window_days: u32) -> Self {
        Self {
            context,
            page_size: page_size.max(1),
            record_cap: record_cap.max(1),
            window_days,
        }
    }

    pub async fn fetch(&self, now: DateTime<Utc>, sink: &dyn ProgressSink) -> Result<PrimaryBatch> {
        sink.emit(ProgressEvent::new(Phase::PrimaryFetch, "Fetching records", 0, 0, 0.0));

        let created_after = (now - Duration::days(i64::from(self.window_days))).date_naive();
        let mut batch = PrimaryBatch::default();
        let mut offset = 0;

        loop {
            let path = self
                .context
                .paths
                .records_page(self.page_size, offset, created_after);
            let body = self.context.get(&path).await?;
            let page: RecordsPage = decode(body, "records")?;
            let rows = page.records.len();

            if page.meta.total.is_some() {
                batch.reported_total = page.meta.total;
            }
            batch
                .records
                .extend(page.records.into_iter().map(PrimaryRecord::from));
            debug!(offset, rows, "Fetched record page");

            let capped = batch.records.len() >= self.record_cap;
            if capped {
                batch.truncated = batch.records.len() > self.record_cap
                    || (rows == self.page_size
                        && batch.reported_total.map_or(true, |t| t > self.record_cap));
                batch.records.truncate(self.record_cap);
            }

            let current = batch.records.len();
            let total = batch.reported_total.unwrap_or(current);
            sink.emit(ProgressEvent::new(
                Phase::PrimaryFetch,
                format!("Fetched {} records", current),
                current,
                total,
                percent(current, total).min(PRIMARY_PHASE_PERCENT_CAP),
            ));

            if capped || rows < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        let count = batch.records.len();
        metrics().records_fetched.inc_by(count as u64);
        if batch.truncated {
            metrics().truncated_refreshes.inc();
            warn!(
                cap = self.record_cap,
                reported_total = ?batch.reported_total,
                "Record cap reached, newer records kept and the rest dropped"
            );
        }

        sink.emit(ProgressEvent::new(
            Phase::PrimaryFetch,
            format!("Fetched {} records", count),
            count,
            count,
            100.0,
        ));
        info!(records = count, %created_after, "Primary fetch complete");
        Ok(batch)
    }
}
