//! Fixture builders shared by the unit tests.

use chrono::NaiveDate;

use crate::types::{Attendance, DealType, Record, Relevance, SourceType, Stage};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            record: Record {
                id: id.to_string(),
                client: format!("Client {}", id),
                stage: Stage::Inbox,
                source_type: SourceType::Inbound,
                discovery_date: None,
                poa_date: None,
                billing_start: None,
                closed_date: None,
                expected_mrr: 0.0,
                expected_arr: 0.0,
                pipeline_value: 0.0,
                owner: "Dana".to_string(),
                bdr: "Sam".to_string(),
                attendance: None,
                type_of_deal: None,
                relevance: None,
                partner: None,
                unreadable_columns: Vec::new(),
            },
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.record.stage = stage;
        self
    }

    pub fn source(mut self, source: SourceType) -> Self {
        self.record.source_type = source;
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.record.pipeline_value = value;
        self
    }

    pub fn arr(mut self, arr: f64) -> Self {
        self.record.expected_arr = arr;
        self
    }

    pub fn mrr(mut self, mrr: f64) -> Self {
        self.record.expected_mrr = mrr;
        self
    }

    pub fn discovered(self, y: i32, m: u32, d: u32) -> Self {
        self.discovered_on(date(y, m, d))
    }

    pub fn discovered_on(mut self, day: NaiveDate) -> Self {
        self.record.discovery_date = Some(day);
        self
    }

    pub fn poa(mut self, y: i32, m: u32, d: u32) -> Self {
        self.record.poa_date = Some(date(y, m, d));
        self
    }

    pub fn closed(mut self, y: i32, m: u32, d: u32) -> Self {
        self.record.stage = Stage::Closed;
        self.record.closed_date = Some(date(y, m, d));
        self
    }

    pub fn billing(mut self, y: i32, m: u32, d: u32) -> Self {
        self.record.billing_start = Some(date(y, m, d));
        self
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.record.owner = owner.to_string();
        self
    }

    pub fn bdr(mut self, bdr: &str) -> Self {
        self.record.bdr = bdr.to_string();
        self
    }

    pub fn attendance(mut self, attendance: Attendance) -> Self {
        self.record.attendance = Some(attendance);
        self
    }

    pub fn deal_type(mut self, deal_type: DealType) -> Self {
        self.record.type_of_deal = Some(deal_type);
        self
    }

    pub fn relevance(mut self, relevance: Relevance) -> Self {
        self.record.relevance = Some(relevance);
        self
    }

    pub fn partner(mut self, partner: &str) -> Self {
        self.record.partner = Some(partner.to_string());
        self
    }

    pub fn unreadable(mut self, column: &str) -> Self {
        self.record.unreadable_columns.push(column.to_string());
        self
    }

    pub fn build(self) -> Record {
        self.record
    }
}

/// Run `f` against an aggregation input built the way the engine builds it:
/// default weighting, targets scaled to the resolved period.
pub fn with_input<R>(
    records: &[Record],
    request: crate::period::PeriodRequest,
    today: NaiveDate,
    f: impl FnOnce(&crate::aggregators::AggregationInput<'_>) -> R,
) -> R {
    with_input_targets(records, request, today, &crate::targets::TargetConfig::default(), f)
}

pub fn with_input_targets<R>(
    records: &[Record],
    request: crate::period::PeriodRequest,
    today: NaiveDate,
    config: &crate::targets::TargetConfig,
    f: impl FnOnce(&crate::aggregators::AggregationInput<'_>) -> R,
) -> R {
    let period = crate::period::resolve(&request, today).expect("valid fixture period");
    let targets = crate::targets::ScaledTargets::for_period(config, &period);
    let table = crate::weighting::WeightingTable::default();
    let annotated = crate::weighting::annotate(&table, records, today);
    let input = crate::aggregators::AggregationInput {
        records: &annotated,
        period: &period,
        targets: &targets,
        today,
    };
    f(&input)
}
