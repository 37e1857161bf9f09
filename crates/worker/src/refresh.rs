//! Refresh coordination.
//!
//! Owns the current snapshot and runs the pipeline on demand. At most one
//! refresh runs at a time; a failed refresh leaves the previous snapshot in
//! place and records the failure in the status.

use crate::pipeline::{FetchPipeline, PipelineOutput};
use chrono::{DateTime, Utc};
use engine_core::{EnrichedRecord, Error, ProgressEvent, ProgressSink, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;

/// Result of the last successful refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Increments with every successful refresh
    pub generation: u64,
    pub records: Vec<EnrichedRecord>,
    pub fetched_at: DateTime<Utc>,
    pub truncated: bool,
    pub failed_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// What `GET /refresh` reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub state: RefreshState,
    pub run_id: Option<Uuid>,
    pub message: String,
    pub progress: ProgressEvent,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Generation of the snapshot currently served
    pub generation: u64,
    pub truncated: bool,
    pub failed_ids: Vec<String>,
}

impl Default for RefreshStatus {
    fn default() -> Self {
        Self {
            state: RefreshState::Idle,
            run_id: None,
            message: "No refresh has run yet".to_string(),
            progress: ProgressEvent::idle(),
            started_at: None,
            finished_at: None,
            generation: 0,
            truncated: false,
            failed_ids: Vec::new(),
        }
    }
}

/// Clears the running flag when the refresh ends, including when its
/// future is dropped.
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

pub struct RefreshCoordinator {
    pipeline: FetchPipeline,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    status: Arc<Mutex<RefreshStatus>>,
    running: Arc<AtomicBool>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(pipeline: FetchPipeline) -> Self {
        Self {
            pipeline,
            snapshot: RwLock::new(None),
            status: Arc::new(Mutex::new(RefreshStatus::default())),
            running: Arc::new(AtomicBool::new(false)),
            generation: AtomicU64::new(0),
        }
    }

    /// Current snapshot, if any refresh has succeeded.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().clone()
    }

    pub fn status(&self) -> RefreshStatus {
        self.status.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claim the single refresh slot.
    pub fn begin(&self) -> Result<(Uuid, RunGuard)> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::RefreshInProgress)?;
        let guard = RunGuard {
            running: self.running.clone(),
        };

        let run_id = Uuid::new_v4();
        let mut status = self.status.lock();
        status.state = RefreshState::Running;
        status.run_id = Some(run_id);
        status.message = "Refresh started".to_string();
        status.progress = ProgressEvent::idle();
        status.started_at = Some(Utc::now());
        status.finished_at = None;
        Ok((run_id, guard))
    }

    /// Run a refresh to completion on the current task.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        let (run_id, _guard) = self.begin()?;
        self.execute(run_id).await
    }

    /// Start a refresh in the background; errors only if one is already running.
    ///
    /// A panic inside the refresh is recorded as a failure before the slot
    /// is released.
    pub fn start(self: &Arc<Self>) -> Result<Uuid> {
        let (run_id, guard) = self.begin()?;
        let coordinator = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let runner = coordinator.clone();
            // Outcome is recorded in the status
            let task = tokio::spawn(async move { runner.execute(run_id).await });
            if let Err(e) = task.await {
                coordinator.fail(&Error::internal(format!("refresh task aborted: {}", e)));
            }
        });
        Ok(run_id)
    }

    /// Start a refresh every `every`, skipping ticks while one is running.
    pub fn start_periodic(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match coordinator.start() {
                    Ok(run_id) => debug!(%run_id, "Periodic refresh started"),
                    Err(e) => debug!("Periodic refresh skipped: {}", e),
                }
            }
        })
    }

    async fn execute(&self, run_id: Uuid) -> Result<Arc<Snapshot>> {
        let span = tracing::info_span!("refresh", %run_id);
        let start = Instant::now();
        let status = self.status.clone();
        let sink: Arc<dyn ProgressSink> = Arc::new(move |event: ProgressEvent| {
            status.lock().progress = event;
        });

        info!(parent: &span, "Refresh started");
        let result = self.pipeline.run(sink).instrument(span.clone()).await;
        metrics()
            .refresh_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        let _entered = span.enter();
        match result {
            Ok(output) => Ok(self.publish(output)),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn publish(&self, output: PipelineOutput) -> Arc<Snapshot> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = Arc::new(Snapshot {
            generation,
            records: output.records,
            fetched_at: output.fetched_at,
            truncated: output.truncated,
            failed_ids: output.failed_ids,
        });
        *self.snapshot.write() = Some(snapshot.clone());

        {
            let mut status = self.status.lock();
            status.state = RefreshState::Succeeded;
            status.message = format!("Loaded {} records", snapshot.records.len());
            status.finished_at = Some(Utc::now());
            status.generation = generation;
            status.truncated = snapshot.truncated;
            status.failed_ids = snapshot.failed_ids.clone();
        }

        metrics().refreshes_completed.inc();
        health().endpoint.set_healthy();
        health().snapshot.set_healthy();
        info!(
            generation,
            records = snapshot.records.len(),
            "Refresh succeeded"
        );
        snapshot
    }

    fn fail(&self, e: &Error) {
        {
            let mut status = self.status.lock();
            status.state = RefreshState::Failed;
            status.message = e.to_string();
            status.finished_at = Some(Utc::now());
        }

        metrics().refreshes_failed.inc();
        if matches!(e, Error::Fetch { .. }) {
            health().endpoint.set_unhealthy(e.to_string());
        }
        error!(error = %e, "Refresh failed, keeping previous snapshot");
    }
}
