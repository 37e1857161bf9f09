//! Application state shared across handlers.

use chrono::{Local, NaiveDate};
use engine_core::{Error, ViewMode};
use hierarchy::{Hierarchy, HierarchyBuilder};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use worker::{RefreshCoordinator, Snapshot};

/// Built hierarchies are dropped after this long even if nothing changed.
const HIERARCHY_CACHE_TTL: Duration = Duration::from_secs(300);

const HIERARCHY_CACHE_MAX_CAPACITY: u64 = 64;

/// Snapshot generation, view, and the day the columns end on.
type HierarchyKey = (u64, ViewMode, NaiveDate);

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RefreshCoordinator>,
    pub builder: Arc<HierarchyBuilder>,
    /// Columns in the week view
    pub window_days: u32,
    cache: Cache<HierarchyKey, Arc<Hierarchy>>,
    fixed_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<RefreshCoordinator>,
        builder: HierarchyBuilder,
        window_days: u32,
    ) -> Self {
        Self {
            coordinator,
            builder: Arc::new(builder),
            window_days,
            cache: Cache::builder()
                .max_capacity(HIERARCHY_CACHE_MAX_CAPACITY)
                .time_to_live(HIERARCHY_CACHE_TTL)
                .build(),
            fixed_today: None,
        }
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Hierarchy of the current snapshot for `view`, built once per
    /// snapshot generation and day.
    pub async fn hierarchy(&self, view: ViewMode) -> Result<(Arc<Snapshot>, Arc<Hierarchy>), Error> {
        let snapshot = self.coordinator.snapshot().ok_or(Error::NoSnapshot)?;
        let today = self.today();
        let key = (snapshot.generation, view, today);

        if let Some(cached) = self.cache.get(&key).await {
            debug!(generation = snapshot.generation, ?view, "Hierarchy cache hit");
            return Ok((snapshot, cached));
        }

        let columns = view.columns(today, self.window_days);
        let built = Arc::new(self.builder.build(&snapshot.records, &columns));
        self.cache.insert(key, built.clone()).await;

        Ok((snapshot, built))
    }
}
