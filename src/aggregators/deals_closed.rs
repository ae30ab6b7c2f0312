//! Deals closed in the period: count, ARR, MRR, monthly trend.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::{breakdown_key, AggregationInput};
use crate::targets::{month_key, on_track};
use crate::types::{SourceType, Stage};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTotals {
    pub count: usize,
    pub arr: f64,
    pub mrr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyClosed {
    /// `YYYY-MM`.
    pub month: String,
    pub count: usize,
    pub arr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedDeal {
    pub id: String,
    pub client: String,
    pub owner: String,
    pub source_type: SourceType,
    pub close_date: NaiveDate,
    pub arr: f64,
    pub mrr: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealsClosed {
    #[serde(flatten)]
    pub totals: ClosedTotals,
    pub average_deal_size: f64,
    pub count_target: f64,
    pub arr_target: f64,
    pub revenue_target: f64,
    pub count_on_track: bool,
    pub revenue_on_track: bool,
    /// One entry per calendar month in the period, empty months included.
    pub monthly_trend: Vec<MonthlyClosed>,
    pub by_ae: BTreeMap<String, ClosedTotals>,
    pub details: Vec<ClosedDeal>,
}

pub fn aggregate(input: &AggregationInput) -> DealsClosed {
    let period = input.period;
    let mut result = DealsClosed {
        count_target: input.targets.deals_count,
        arr_target: input.targets.deals_arr,
        revenue_target: input.targets.revenue,
        ..DealsClosed::default()
    };

    let mut by_month: BTreeMap<String, (usize, f64)> = period
        .calendar_months()
        .into_iter()
        .map(|(year, month)| (month_key(year, month), (0, 0.0)))
        .collect();

    for annotated in input.records {
        let record = annotated.record;
        if record.stage != Stage::Closed {
            continue;
        }
        let Some(close_date) = record.close_date() else {
            continue;
        };
        if !period.contains(close_date) {
            continue;
        }

        let arr = record.annual_value();
        let mrr = record.monthly_value();
        let ae = result.by_ae.entry(breakdown_key(&record.owner)).or_default();
        for totals in [&mut result.totals, ae] {
            totals.count += 1;
            totals.arr += arr;
            totals.mrr += mrr;
        }
        let bucket = by_month
            .entry(month_key(close_date.year(), close_date.month()))
            .or_insert((0, 0.0));
        bucket.0 += 1;
        bucket.1 += arr;

        result.details.push(ClosedDeal {
            id: record.id.clone(),
            client: record.client.clone(),
            owner: record.owner.clone(),
            source_type: record.source_type,
            close_date,
            arr,
            mrr,
        });
    }

    result.average_deal_size = if result.totals.count == 0 {
        0.0
    } else {
        result.totals.arr / result.totals.count as f64
    };
    result.count_on_track = on_track(
        result.totals.count as f64,
        result.count_target,
        input.targets.thresholds.deals,
    );
    result.revenue_on_track = on_track(
        result.totals.arr,
        result.revenue_target,
        input.targets.thresholds.revenue,
    );
    result.monthly_trend = by_month
        .into_iter()
        .map(|(month, (count, arr))| MonthlyClosed { month, count, arr })
        .collect();
    result
        .details
        .sort_by(|a, b| a.close_date.cmp(&b.close_date).then_with(|| a.id.cmp(&b.id)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodRequest;
    use crate::test_support::{date, with_input, RecordBuilder};

    #[test]
    fn test_closed_in_period_totals() {
        let records = vec![
            RecordBuilder::new("c1").owner("Dana").arr(24_000.0).closed(2025, 10, 3).discovered(2025, 8, 1).build(),
            RecordBuilder::new("c2").owner("Lee").mrr(1_000.0).closed(2025, 10, 20).discovered(2025, 9, 1).build(),
            RecordBuilder::new("c3").owner("Lee").arr(50_000.0).closed(2025, 9, 30).discovered(2025, 7, 1).build(),
            RecordBuilder::new("open").stage(Stage::Legals).arr(99_000.0).discovered(2025, 10, 1).build(),
        ];
        let result = with_input(&records, PeriodRequest::RelativeMonth { offset: 0 }, date(2025, 10, 31), aggregate);
        assert_eq!(result.totals.count, 2);
        assert_eq!(result.totals.arr, 36_000.0);
        assert_eq!(result.totals.mrr, 3_000.0);
        assert_eq!(result.average_deal_size, 18_000.0);
        assert_eq!(result.by_ae["Lee"].count, 1);
        assert_eq!(result.details.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["c1", "c2"]);
        assert_eq!(result.monthly_trend, vec![MonthlyClosed { month: "2025-10".into(), count: 2, arr: 36_000.0 }]);
    }

    #[test]
    fn test_billing_start_used_when_no_close_date() {
        let records = vec![
            RecordBuilder::new("b1").stage(Stage::Closed).arr(12_000.0).billing(2025, 10, 15).discovered(2025, 9, 1).build(),
            RecordBuilder::new("nodate").stage(Stage::Closed).arr(12_000.0).discovered(2025, 10, 1).build(),
        ];
        let result = with_input(&records, PeriodRequest::RelativeMonth { offset: 0 }, date(2025, 10, 31), aggregate);
        assert_eq!(result.totals.count, 1);
        assert_eq!(result.details[0].close_date, date(2025, 10, 15));
    }

    #[test]
    fn test_half_year_trend_has_every_month() {
        let records = vec![
            RecordBuilder::new("jul").arr(10_000.0).closed(2025, 7, 9).discovered(2025, 6, 1).build(),
            RecordBuilder::new("dec").arr(30_000.0).closed(2025, 12, 31).discovered(2025, 11, 1).build(),
        ];
        let result = with_input(&records, PeriodRequest::FixedHalfYear { year: 2025 }, date(2026, 1, 10), aggregate);
        let months: Vec<&str> = result.monthly_trend.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2025-07", "2025-08", "2025-09", "2025-10", "2025-11", "2025-12"]);
        assert_eq!(result.monthly_trend[0].count, 1);
        assert_eq!(result.monthly_trend[5].arr, 30_000.0);
        assert_eq!(result.revenue_target, 720_000.0);
        assert_eq!(result.count_target, 24.0);
    }

    #[test]
    fn test_no_deals_average_is_zero() {
        let result = with_input(&[], PeriodRequest::RelativeMonth { offset: 0 }, date(2025, 10, 31), aggregate);
        assert_eq!(result.average_deal_size, 0.0);
        assert!(!result.count_on_track);
        assert!(!result.revenue_on_track);
        assert!(result.details.is_empty());
        assert_eq!(result.monthly_trend.len(), 1);
    }
}
