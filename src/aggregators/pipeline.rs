//! Pipeline metrics: created vs active pipe, raw and weighted, per AE.
//!
//! - created pipe: raw value of everything discovered in the period. Lost and
//!   NotRelevant count toward it only when `created_pipe_includes_lost` is set.
//! - created weighted pipe: weighted value of the same set. Terminal stages
//!   have no weight, so they never contribute.
//! - total pipe / total weighted pipe: every open deal, whenever discovered.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{breakdown_key, sort_rows, AggregationInput, DealRow};
use crate::targets::on_track;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeValues {
    pub created_pipe: f64,
    pub created_weighted_pipe: f64,
    pub total_pipe: f64,
    pub total_weighted_pipe: f64,
    pub created_count: usize,
    pub active_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetrics {
    #[serde(flatten)]
    pub totals: PipeValues,
    /// Raw value of Lost/NotRelevant deals discovered in the period.
    pub created_dead_volume: f64,
    pub created_dead_count: usize,
    pub includes_dead_volume: bool,
    pub created_pipe_target: f64,
    pub weighted_pipe_target: f64,
    pub created_on_track: bool,
    pub weighted_on_track: bool,
    pub by_ae: BTreeMap<String, PipeValues>,
    /// Deals created in the period.
    pub details: Vec<DealRow>,
}

pub fn aggregate(input: &AggregationInput, includes_dead_volume: bool) -> PipelineMetrics {
    let mut result = PipelineMetrics {
        includes_dead_volume,
        created_pipe_target: input.targets.pipe_created,
        weighted_pipe_target: input.targets.weighted_pipe_created,
        ..PipelineMetrics::default()
    };

    for annotated in input.in_period() {
        let record = annotated.record;
        if record.stage.is_dead() {
            result.created_dead_volume += annotated.raw_value;
            result.created_dead_count += 1;
            if !includes_dead_volume {
                continue;
            }
        }
        let ae = result.by_ae.entry(breakdown_key(&record.owner)).or_default();
        for values in [&mut result.totals, ae] {
            values.created_pipe += annotated.raw_value;
            values.created_weighted_pipe += annotated.weighted_or_zero();
            values.created_count += 1;
        }
        result.details.push(DealRow::from(annotated));
    }

    for annotated in input.open() {
        let ae = result.by_ae.entry(breakdown_key(&annotated.record.owner)).or_default();
        for values in [&mut result.totals, ae] {
            values.total_pipe += annotated.raw_value;
            values.total_weighted_pipe += annotated.weighted_or_zero();
            values.active_count += 1;
        }
    }

    let threshold = input.targets.thresholds.pipe;
    result.created_on_track = on_track(result.totals.created_pipe, result.created_pipe_target, threshold);
    result.weighted_on_track = on_track(
        result.totals.created_weighted_pipe,
        result.weighted_pipe_target,
        threshold,
    );

    sort_rows(&mut result.details);
    result
}
