//! Upsell & renewal performance, with a per-partner table.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{sort_rows, AggregationInput, DealRow};
use crate::types::{DealType, Record, Stage};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealTypeSummary {
    pub count: usize,
    pub value: f64,
    pub closed_count: usize,
    pub closed_value: f64,
}

impl DealTypeSummary {
    fn add(&mut self, record: &Record, value: f64) {
        self.count += 1;
        self.value += value;
        if record.stage == Stage::Closed {
            self.closed_count += 1;
            self.closed_value += record.annual_value();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPerformance {
    pub intros: usize,
    pub poa: usize,
    pub upsells: usize,
    pub renewals: usize,
    pub closings: usize,
    pub closing_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsellRenewal {
    pub period_label: String,
    /// Upsell and cross-sell deals.
    pub upsell: DealTypeSummary,
    pub renewal: DealTypeSummary,
    pub partners: BTreeMap<String, PartnerPerformance>,
    pub details: Vec<DealRow>,
}

pub fn aggregate(input: &AggregationInput) -> UpsellRenewal {
    let mut result = UpsellRenewal {
        period_label: input.period.label.clone(),
        ..UpsellRenewal::default()
    };

    for annotated in input.in_period() {
        let record = annotated.record;
        let is_expansion = record.type_of_deal.map(|t| t.is_expansion()).unwrap_or(false);
        let is_renewal = record.type_of_deal == Some(DealType::Renewal);

        if is_expansion {
            result.upsell.add(record, annotated.raw_value);
        } else if is_renewal {
            result.renewal.add(record, annotated.raw_value);
        }
        if is_expansion || is_renewal {
            result.details.push(DealRow::from(annotated));
        }

        let Some(partner) = record.partner.as_deref() else {
            continue;
        };
        let row = result.partners.entry(partner.trim().to_string()).or_default();
        row.intros += 1;
        if record.poa_date.is_some() {
            row.poa += 1;
        }
        if is_expansion {
            row.upsells += 1;
        }
        if is_renewal {
            row.renewals += 1;
        }
        if record.stage == Stage::Closed {
            row.closings += 1;
            row.closing_value += record.annual_value();
        }
    }

    sort_rows(&mut result.details);
    result
}
