//! Stalled pipeline: open deals older than the staleness threshold.
//!
//! Not period-scoped. This is a reactivation list measured from the
//! reference date.

use serde::Serialize;

use super::{AggregationInput, DealRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StalledDeal {
    #[serde(flatten)]
    pub deal: DealRow,
    pub age_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StalledPipeline {
    pub threshold_days: i64,
    pub count: usize,
    pub total_value: f64,
    pub total_weighted_value: f64,
    /// Oldest first.
    pub deals: Vec<StalledDeal>,
}

pub fn aggregate(input: &AggregationInput, stale_after_days: i64) -> StalledPipeline {
    let mut result = StalledPipeline {
        threshold_days: stale_after_days,
        ..StalledPipeline::default()
    };

    for annotated in input.open() {
        let Some(age_days) = annotated.age_days else {
            continue;
        };
        if age_days <= stale_after_days {
            continue;
        }
        result.count += 1;
        result.total_value += annotated.raw_value;
        result.total_weighted_value += annotated.weighted_or_zero();
        result.deals.push(StalledDeal {
            deal: DealRow::from(annotated),
            age_days,
        });
    }

    result
        .deals
        .sort_by(|a, b| b.age_days.cmp(&a.age_days).then_with(|| a.deal.id.cmp(&b.deal.id)));
    result
}
