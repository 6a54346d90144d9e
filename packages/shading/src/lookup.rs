//! Area record lookup by id.
//!
//! Datasets are plain slices in load order. When an id appears more than
//! once, the last row wins, so a reload that appends corrected rows
//! overrides the earlier ones.

use std::collections::BTreeMap;

use access_map_area_models::{AreaId, AreaRecord};

/// Finds the record for `area_id`, scanning the whole slice.
///
/// Returns the last matching record in iteration order, or `None` when the
/// area has no row.
#[must_use]
pub fn lookup_record<'a>(area_id: &AreaId, records: &'a [AreaRecord]) -> Option<&'a AreaRecord> {
    records.iter().rfind(|record| &record.area_id == area_id)
}

/// Returns the access index for `area_id`, or `None` if the area has no
/// row or the row has no index.
#[must_use]
pub fn index_for(area_id: &AreaId, records: &[AreaRecord]) -> Option<f64> {
    lookup_record(area_id, records).and_then(|record| record.access_index)
}

/// Precomputed id -> index table with the same last-wins semantics as
/// [`lookup_record`]. Used when every polygon of a set is resolved at once.
pub(crate) struct RecordIndex<'a> {
    by_id: BTreeMap<&'a AreaId, Option<f64>>,
}

impl<'a> RecordIndex<'a> {
    pub(crate) fn new(records: &'a [AreaRecord]) -> Self {
        let mut by_id = BTreeMap::new();
        for record in records {
            by_id.insert(&record.area_id, record.access_index);
        }
        Self { by_id }
    }

    pub(crate) fn index_for(&self, area_id: &AreaId) -> Option<f64> {
        self.by_id.get(area_id).copied().flatten()
    }
}
