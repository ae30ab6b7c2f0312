//! Metric aggregators.
//!
//! Each aggregator is a pure function over one `AggregationInput`: the
//! annotated, well-formed records of the requested view(s), the resolved
//! period, and the targets scaled to that same period. Aggregators that are
//! period-scoped filter with `in_period`; pipe totals, stalled deals and
//! projections look at the whole open set.

pub mod conversion;
pub mod deals_closed;
pub mod meetings;
pub mod old_pipe;
pub mod pipeline;
pub mod projections;
pub mod upsell;

use chrono::NaiveDate;
use serde::Serialize;

use crate::period::Period;
use crate::targets::ScaledTargets;
use crate::types::{Record, SourceType, Stage};
use crate::weighting::Annotated;

/// Breakdown key used when an owner/BDR cell is blank.
pub const UNASSIGNED_KEY: &str = "Unassigned";

pub struct AggregationInput<'a> {
    /// Well-formed records only (`Record::is_well_formed`).
    pub records: &'a [Annotated<'a>],
    pub period: &'a Period,
    pub targets: &'a ScaledTargets,
    pub today: NaiveDate,
}

impl<'a> AggregationInput<'a> {
    /// Records discovered inside the period.
    pub fn in_period(&self) -> impl Iterator<Item = &'a Annotated<'a>> + '_ {
        let period = self.period;
        self.records.iter().filter(move |a| {
            a.record
                .discovery_date
                .map(|d| period.contains(d))
                .unwrap_or(false)
        })
    }

    /// Records in an open stage, regardless of discovery date.
    pub fn open(&self) -> impl Iterator<Item = &'a Annotated<'a>> + '_ {
        self.records.iter().filter(|a| a.record.stage.is_open())
    }
}

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }
    numerator / denominator * 100.0
}

/// Trimmed breakdown key, with blanks grouped under `Unassigned`.
pub fn breakdown_key(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNASSIGNED_KEY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// One drill-down row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealRow {
    pub id: String,
    pub client: String,
    pub stage: Stage,
    pub source_type: SourceType,
    pub owner: String,
    pub bdr: String,
    pub discovery_date: Option<NaiveDate>,
    pub value: f64,
    pub weighted_value: Option<f64>,
}

impl From<&Annotated<'_>> for DealRow {
    fn from(a: &Annotated<'_>) -> Self {
        let r = a.record;
        DealRow {
            id: r.id.clone(),
            client: r.client.clone(),
            stage: r.stage,
            source_type: r.source_type,
            owner: r.owner.clone(),
            bdr: r.bdr.clone(),
            discovery_date: r.discovery_date,
            value: a.raw_value,
            weighted_value: a.weighted_value,
        }
    }
}

/// Stable drill-down order: by discovery date, then id.
pub fn sort_rows(rows: &mut [DealRow]) {
    rows.sort_by(|a, b| a.discovery_date.cmp(&b.discovery_date).then_with(|| a.id.cmp(&b.id)));
}

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

/// Counts of records excluded from date- or weight-dependent metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub total_records: usize,
    pub missing_discovery_date: usize,
    pub closed_without_close_date: usize,
    /// Records with a stored value that could not be read (e.g. text in a
    /// money column).
    pub unreadable_values: usize,
    pub excluded_record_ids: Vec<String>,
}

impl DataQuality {
    pub fn has_issues(&self) -> bool {
        self.missing_discovery_date > 0
            || self.closed_without_close_date > 0
            || self.unreadable_values > 0
    }
}

/// Inspect a fetched record set. Logs one warning per affected report.
pub fn assess_data_quality(records: &[Record]) -> DataQuality {
    let mut quality = DataQuality {
        total_records: records.len(),
        ..DataQuality::default()
    };
    for record in records {
        if record.discovery_date.is_none() {
            quality.missing_discovery_date += 1;
            quality.excluded_record_ids.push(record.id.clone());
        } else if !record.unreadable_columns.is_empty() {
            quality.unreadable_values += 1;
            quality.excluded_record_ids.push(record.id.clone());
        } else if record.stage == Stage::Closed && record.close_date().is_none() {
            quality.closed_without_close_date += 1;
            quality.excluded_record_ids.push(record.id.clone());
        }
    }
    quality.excluded_record_ids.sort();
    if quality.has_issues() {
        log::warn!(
            "Data quality: {} of {} records missing discovery date, {} with unreadable values, {} closed without close date",
            quality.missing_discovery_date,
            quality.total_records,
            quality.unreadable_values,
            quality.closed_without_close_date
        );
    }
    quality
}
