//! View aggregation. A Master view has no records of its own; it reads the
//! concatenation of its member views.

use crate::error::StoreError;
use crate::source::RecordSource;
use crate::types::{DateRange, Record, Stage};

/// Fetch the record set a report for `view_id` runs on.
///
/// Member views are fetched once each, in membership order, and concatenated
/// without deduplication. Their record sets are disjoint by construction.
pub fn fetch_view_records<S: RecordSource>(
    source: &S,
    view_id: &str,
    stage_filter: Option<&[Stage]>,
    date_range: Option<DateRange>,
) -> Result<Vec<Record>, StoreError> {
    let members = source.resolve_view_membership(view_id)?;
    if members.is_empty() {
        return source.fetch_records(view_id, stage_filter, date_range);
    }

    log::debug!("View {} aggregates {} member views", view_id, members.len());
    let mut records = Vec::new();
    for member in &members {
        let mut batch = source.fetch_records(member, stage_filter, date_range)?;
        log::debug!("  {}: {} records", member, batch.len());
        records.append(&mut batch);
    }
    Ok(records)
}
