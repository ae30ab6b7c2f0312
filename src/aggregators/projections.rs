//! Closing projections: open deals bucketed by how close their stage is to
//! signature.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{breakdown_key, sort_rows, AggregationInput, DealRow};
use crate::types::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionWindow {
    Next14Days,
    Next30Days,
    Next60To90Days,
}

impl ProjectionWindow {
    pub fn for_stage(stage: Stage) -> Option<Self> {
        match stage {
            Stage::Legals => Some(ProjectionWindow::Next14Days),
            Stage::ProposalSent => Some(ProjectionWindow::Next30Days),
            Stage::PoaBooked => Some(ProjectionWindow::Next60To90Days),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectionWindow::Next14Days => "Next 14 days",
            ProjectionWindow::Next30Days => "Next 30 days",
            ProjectionWindow::Next60To90Days => "Next 60-90 days",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionBucket {
    pub window: ProjectionWindow,
    pub label: String,
    pub raw: f64,
    pub weighted: f64,
    pub count: usize,
    pub deals: Vec<DealRow>,
}

impl ProjectionBucket {
    fn new(window: ProjectionWindow) -> Self {
        Self {
            window,
            label: window.label().to_string(),
            raw: 0.0,
            weighted: 0.0,
            count: 0,
            deals: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AeProjection {
    pub pipeline: f64,
    pub weighted: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosingProjections {
    /// Nearest window first.
    pub buckets: Vec<ProjectionBucket>,
    pub total_raw: f64,
    pub total_weighted: f64,
    pub total_count: usize,
    pub by_ae: BTreeMap<String, AeProjection>,
}

pub fn aggregate(input: &AggregationInput) -> ClosingProjections {
    let mut buckets: BTreeMap<ProjectionWindow, ProjectionBucket> = [
        ProjectionWindow::Next14Days,
        ProjectionWindow::Next30Days,
        ProjectionWindow::Next60To90Days,
    ]
    .into_iter()
    .map(|w| (w, ProjectionBucket::new(w)))
    .collect();
    let mut by_ae: BTreeMap<String, AeProjection> = BTreeMap::new();

    for annotated in input.open() {
        let Some(window) = ProjectionWindow::for_stage(annotated.record.stage) else {
            continue;
        };
        let weighted = annotated.weighted_or_zero();
        if let Some(bucket) = buckets.get_mut(&window) {
            bucket.raw += annotated.raw_value;
            bucket.weighted += weighted;
            bucket.count += 1;
            bucket.deals.push(DealRow::from(annotated));
        }
        let ae = by_ae.entry(breakdown_key(&annotated.record.owner)).or_default();
        ae.pipeline += annotated.raw_value;
        ae.weighted += weighted;
        ae.count += 1;
    }

    let mut buckets: Vec<ProjectionBucket> = buckets.into_values().collect();
    for bucket in &mut buckets {
        sort_rows(&mut bucket.deals);
    }

    ClosingProjections {
        total_raw: buckets.iter().map(|b| b.raw).sum(),
        total_weighted: buckets.iter().map(|b| b.weighted).sum(),
        total_count: buckets.iter().map(|b| b.count).sum(),
        buckets,
        by_ae,
    }
}
