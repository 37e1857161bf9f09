//! Progress reporting for the multi-phase refresh.

use serde::{Deserialize, Serialize};

/// Refresh phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Idle,
    Lookup,
    PrimaryFetch,
    Enrichment,
    Merge,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Lookup => "lookup",
            Self::PrimaryFetch => "primary-fetch",
            Self::Enrichment => "enrichment",
            Self::Merge => "merge",
            Self::Complete => "complete",
        }
    }
}

/// A single progress update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub message: String,
    pub current: usize,
    pub total: usize,
    /// 0-100, non-decreasing within a phase
    pub percentage: f64,
}

impl ProgressEvent {
    pub fn new(
        phase: Phase,
        message: impl Into<String>,
        current: usize,
        total: usize,
        percentage: f64,
    ) -> Self {
        Self {
            phase,
            message: message.into(),
            current,
            total,
            percentage: percentage.clamp(0.0, 100.0),
        }
    }

    /// The resting state before any refresh has run.
    pub fn idle() -> Self {
        Self::new(Phase::Idle, "", 0, 0, 0.0)
    }
}

impl Default for ProgressEvent {
    fn default() -> Self {
        Self::idle()
    }
}

/// `current / total` as a percentage, 0 when `total` is 0.
pub fn percent(current: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (current as f64 / total as f64) * 100.0
    }
}

/// Receives progress events synchronously as the pipeline advances.
///
/// Events are not buffered or replayed; a sink that is not listening
/// simply misses them.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _event: ProgressEvent) {}
}
