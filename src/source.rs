//! Interfaces to the collaborators that own records and targets.
//!
//! The engine never writes through these. Implementations must return a
//! consistent snapshot per call: one `fetch_target_config` call is the only
//! target read a report makes.

use crate::error::StoreError;
use crate::targets::TargetConfig;
use crate::types::{DateRange, Record, Stage, ViewId};

pub trait RecordSource {
    /// Records owned by `view_id`. `date_range` filters on discovery date;
    /// records without one are dropped when a range is given.
    fn fetch_records(
        &self,
        view_id: &str,
        stage_filter: Option<&[Stage]>,
        date_range: Option<DateRange>,
    ) -> Result<Vec<Record>, StoreError>;

    /// Constituent views of a Master view. Empty for ordinary views.
    fn resolve_view_membership(&self, view_id: &str) -> Result<Vec<ViewId>, StoreError>;
}

pub trait TargetSource {
    /// Target config for `view_id`, with defaults for anything not configured.
    fn fetch_target_config(&self, view_id: &str) -> Result<TargetConfig, StoreError>;
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn fetch_records(
        &self,
        view_id: &str,
        stage_filter: Option<&[Stage]>,
        date_range: Option<DateRange>,
    ) -> Result<Vec<Record>, StoreError> {
        (**self).fetch_records(view_id, stage_filter, date_range)
    }

    fn resolve_view_membership(&self, view_id: &str) -> Result<Vec<ViewId>, StoreError> {
        (**self).resolve_view_membership(view_id)
    }
}

impl<T: TargetSource + ?Sized> TargetSource for &T {
    fn fetch_target_config(&self, view_id: &str) -> Result<TargetConfig, StoreError> {
        (**self).fetch_target_config(view_id)
    }
}
