//! Hierarchy read endpoints.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use engine_core::{DateColumn, EnrichedRecord, ViewMode};
use hierarchy::{visible_rows, ExpansionState, HierarchyNode, NodeLevel, VisibleRow};
use serde::{Deserialize, Serialize};
use worker::Snapshot;

use crate::extractors::View;
use crate::response::{ApiError, SnapshotMeta};
use crate::state::AppState;

fn meta(snapshot: &Snapshot) -> SnapshotMeta {
    SnapshotMeta {
        generation: snapshot.generation,
        fetched_at: snapshot.fetched_at,
        truncated: snapshot.truncated,
        failed_ids: snapshot.failed_ids.len(),
    }
}

#[derive(Serialize)]
struct HierarchyResponse<'a> {
    view: ViewMode,
    snapshot: SnapshotMeta,
    columns: &'a [DateColumn],
    column_totals: &'a [usize],
    total: usize,
    owners: &'a [HierarchyNode],
}

/// GET /hierarchy?view=week|day - Full tree with totals.
pub async fn hierarchy_handler(
    State(state): State<AppState>,
    View(view): View,
) -> Result<Response, ApiError> {
    let (snapshot, hierarchy) = state.hierarchy(view).await?;

    Ok(Json(HierarchyResponse {
        view,
        snapshot: meta(&snapshot),
        columns: &hierarchy.columns,
        column_totals: &hierarchy.column_totals,
        total: hierarchy.total,
        owners: &hierarchy.owners,
    })
    .into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct RowsQuery {
    /// Comma-separated expanded node keys
    #[serde(default)]
    pub expanded: Option<String>,
}

#[derive(Serialize)]
struct RowsResponse<'a> {
    view: ViewMode,
    snapshot: SnapshotMeta,
    columns: &'a [DateColumn],
    column_totals: &'a [usize],
    total: usize,
    rows: Vec<VisibleRow>,
}

/// GET /hierarchy/rows?view=..&expanded=k1,k2 - Flattened visible rows.
pub async fn rows_handler(
    State(state): State<AppState>,
    View(view): View,
    Query(query): Query<RowsQuery>,
) -> Result<Response, ApiError> {
    let (snapshot, hierarchy) = state.hierarchy(view).await?;
    let expansion = ExpansionState::from_keys(
        query
            .expanded
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty()),
    );

    Ok(Json(RowsResponse {
        view,
        snapshot: meta(&snapshot),
        columns: &hierarchy.columns,
        column_totals: &hierarchy.column_totals,
        total: hierarchy.total,
        rows: visible_rows(&hierarchy, &expansion),
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct CellQuery {
    /// Program node key
    pub key: String,
    pub date: NaiveDate,
}

#[derive(Serialize)]
struct CellResponse<'a> {
    key: &'a str,
    label: &'a str,
    date: NaiveDate,
    count: usize,
    records: Vec<&'a EnrichedRecord>,
}

/// GET /hierarchy/cell?view=..&key=..&date=YYYY-MM-DD - Records behind one cell.
pub async fn cell_handler(
    State(state): State<AppState>,
    View(view): View,
    Query(query): Query<CellQuery>,
) -> Result<Response, ApiError> {
    let (_, hierarchy) = state.hierarchy(view).await?;

    let node = hierarchy
        .find(&query.key)
        .filter(|node| node.level == NodeLevel::Program)
        .ok_or_else(|| ApiError::not_found(format!("no program row '{}'", query.key)))?;

    if !hierarchy.columns.iter().any(|c| c.date == query.date) {
        return Err(ApiError::bad_request(format!(
            "{} is outside the {:?} view",
            query.date, view
        )));
    }

    let records = node.records_on(query.date);
    Ok(Json(CellResponse {
        key: &node.key,
        label: &node.label,
        date: query.date,
        count: records.len(),
        records,
    })
    .into_response())
}
