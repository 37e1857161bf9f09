//! Phase 3: per-record attribute fetch over a bounded worker pool.
//!
//! Workers pop identifiers from one shared queue, so each identifier is
//! claimed exactly once. A failed identifier is logged and left out of the
//! result; it still counts toward completion. Identifiers a worker claimed
//! but never finished (the worker panicked) are reported as failed.

use crate::context::FetchContext;
use crm_client::models::{decode, AttributesPage};
use engine_core::{percent, AttributeSet, Phase, ProgressEvent, ProgressSink};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use telemetry::metrics;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Attribute sets by record identifier, plus the identifiers that failed.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    pub attributes: HashMap<String, AttributeSet>,
    /// Sorted
    pub failed_ids: Vec<String>,
}

#[derive(Default)]
struct TallyState {
    done: usize,
    outcome: EnrichmentOutcome,
}

/// Shared results and completion count; emitting under the same lock keeps
/// percentages ordered.
struct Tally {
    state: Mutex<TallyState>,
    total: usize,
    sink: Arc<dyn ProgressSink>,
}

impl Tally {
    fn new(total: usize, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            state: Mutex::new(TallyState::default()),
            total,
            sink,
        }
    }

    fn found(&self, id: String, attributes: AttributeSet) {
        let mut state = self.state.lock();
        state.outcome.attributes.insert(id, attributes);
        self.complete_one(&mut state);
    }

    fn failed(&self, id: String) {
        let mut state = self.state.lock();
        state.outcome.failed_ids.push(id);
        self.complete_one(&mut state);
    }

    fn complete_one(&self, state: &mut TallyState) {
        state.done += 1;
        self.sink.emit(ProgressEvent::new(
            Phase::Enrichment,
            format!("Enriched {}/{}", state.done, self.total),
            state.done,
            self.total,
            percent(state.done, self.total),
        ));
    }

    /// Mark every identifier in `ids` that has no result yet as failed.
    fn fail_unfinished(&self, ids: &[String]) -> usize {
        let settled: HashSet<String> = {
            let state = self.state.lock();
            state
                .outcome
                .attributes
                .keys()
                .chain(state.outcome.failed_ids.iter())
                .cloned()
                .collect()
        };
        let unfinished: Vec<&String> = ids.iter().filter(|id| !settled.contains(*id)).collect();
        for id in &unfinished {
            metrics().attribute_failures.inc();
            self.failed((*id).clone());
        }
        unfinished.len()
    }

    fn take_outcome(&self) -> EnrichmentOutcome {
        let mut outcome = std::mem::take(&mut self.state.lock().outcome);
        outcome.failed_ids.sort();
        outcome
    }
}

pub struct AttributeEnrichmentPool {
    context: FetchContext,
    worker_count: usize,
}

impl AttributeEnrichmentPool {
    pub fn new(context: FetchContext, worker_count: usize) -> Self {
        Self {
            context,
            worker_count: worker_count.max(1),
        }
    }

    /// Fetch attributes for every identifier in `ids`.
    pub async fn run(&self, ids: Vec<String>, sink: Arc<dyn ProgressSink>) -> EnrichmentOutcome {
        let total = ids.len();
        sink.emit(ProgressEvent::new(
            Phase::Enrichment,
            format!("Enriching {} records", total),
            0,
            total,
            0.0,
        ));
        if total == 0 {
            return EnrichmentOutcome::default();
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(ids.clone())));
        let tally = Arc::new(Tally::new(total, sink));

        let workers = self.worker_count.min(total);
        let mut tasks = JoinSet::new();
        for worker_id in 0..workers {
            tasks.spawn(run_worker(
                worker_id,
                self.context.clone(),
                queue.clone(),
                tally.clone(),
            ));
        }
        debug!(workers, total, "Enrichment workers started");

        let mut aborted = 0;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Enrichment worker stopped abnormally: {}", e);
                aborted += 1;
            }
        }

        if aborted > 0 {
            let lost = tally.fail_unfinished(&ids);
            warn!(aborted, lost, "Unfinished identifiers marked as failed");
        }

        let outcome = tally.take_outcome();

        info!(
            enriched = outcome.attributes.len(),
            failed = outcome.failed_ids.len(),
            "Attribute enrichment complete"
        );
        outcome
    }
}

async fn run_worker(
    worker_id: usize,
    context: FetchContext,
    queue: Arc<Mutex<VecDeque<String>>>,
    tally: Arc<Tally>,
) {
    loop {
        let next = queue.lock().pop_front();
        let Some(id) = next else {
            break;
        };

        let path = context.paths.attributes(&id);
        let fetched = match context.get(&path).await {
            Ok(body) => decode::<AttributesPage>(body, "attributes"),
            Err(e) => Err(e),
        };

        match fetched {
            Ok(page) => {
                metrics().attribute_sets_fetched.inc();
                tally.found(id, page.into_attribute_set());
            }
            Err(e) => {
                metrics().attribute_failures.inc();
                warn!(worker_id, record_id = %id, error = %e, "Attribute fetch failed");
                tally.failed(id);
            }
        }
    }
}
