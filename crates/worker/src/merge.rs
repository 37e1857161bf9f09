//! Phase 4: join primary records with attributes and owner names.

use engine_core::{
    AttributeFieldMap, AttributeSet, EnrichedRecord, LookupTable, Phase, PrimaryRecord,
    ProgressEvent, ProgressSink,
};
use std::collections::HashMap;

/// One enriched record per primary record, in primary order.
pub fn merge_records(
    records: Vec<PrimaryRecord>,
    attributes: &HashMap<String, AttributeSet>,
    lookup: &LookupTable,
    fields: &AttributeFieldMap,
    sink: &dyn ProgressSink,
) -> Vec<EnrichedRecord> {
    let total = records.len();
    sink.emit(ProgressEvent::new(Phase::Merge, "Merging records", 0, total, 0.0));

    let merged: Vec<EnrichedRecord> = records
        .into_iter()
        .map(|record| {
            let set = attributes.get(&record.id).cloned().unwrap_or_default();
            EnrichedRecord::from_parts(record, set, lookup, fields)
        })
        .collect();

    sink.emit(ProgressEvent::new(
        Phase::Merge,
        format!("Merged {} records", total),
        total,
        total,
        100.0,
    ));
    merged
}
