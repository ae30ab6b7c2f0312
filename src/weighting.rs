//! Pipeline weighting (pure math, no I/O).
//!
//! Every weighted pipeline figure in a report comes from `WeightingTable`:
//!
//! `weighted = value * stage_weight(stage) * source_factor(source) * recency_factor(age_days)`
//!
//! Closed, Lost and NotRelevant have no stage weight and are never weighted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Record, SourceType, Stage};

/// Probability-style weight per open stage. Must increase with progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StageWeights {
    pub inbox: f64,
    pub poa_booked: f64,
    pub proposal_sent: f64,
    pub legals: f64,
}

impl Default for StageWeights {
    fn default() -> Self {
        Self {
            inbox: 0.20,
            poa_booked: 0.40,
            proposal_sent: 0.60,
            legals: 0.85,
        }
    }
}

/// Multiplier per lead source. Referral and partnership intros historically
/// close better than cold outbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceFactors {
    pub client_referral: f64,
    pub upsell_cross_sell: f64,
    pub internal_referral: f64,
    pub partnership_event: f64,
    pub inbound: f64,
    pub outbound: f64,
    pub unassigned: f64,
}

impl Default for SourceFactors {
    fn default() -> Self {
        Self {
            client_referral: 1.0,
            upsell_cross_sell: 1.0,
            internal_referral: 0.95,
            partnership_event: 0.90,
            inbound: 0.85,
            outbound: 0.70,
            unassigned: 0.60,
        }
    }
}

/// The single source of truth for stage, source and recency coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeightingTable {
    pub stage_weights: StageWeights,
    pub source_factors: SourceFactors,
    pub recency_half_life_days: f64,
    /// Lower bound on the recency factor so old-but-alive deals keep weight.
    pub recency_floor: f64,
}

impl Default for WeightingTable {
    fn default() -> Self {
        Self {
            stage_weights: StageWeights::default(),
            source_factors: SourceFactors::default(),
            recency_half_life_days: 180.0,
            recency_floor: 0.30,
        }
    }
}

impl WeightingTable {
    /// `None` for stages excluded from weighting.
    pub fn stage_weight(&self, stage: Stage) -> Option<f64> {
        let w = &self.stage_weights;
        match stage {
            Stage::Inbox => Some(w.inbox),
            Stage::PoaBooked => Some(w.poa_booked),
            Stage::ProposalSent => Some(w.proposal_sent),
            Stage::Legals => Some(w.legals),
            Stage::Closed | Stage::Lost | Stage::NotRelevant => None,
        }
    }

    pub fn source_factor(&self, source: SourceType) -> f64 {
        let f = &self.source_factors;
        match source {
            SourceType::ClientReferral => f.client_referral,
            SourceType::UpsellCrossSell => f.upsell_cross_sell,
            SourceType::InternalReferral => f.internal_referral,
            SourceType::PartnershipEvent => f.partnership_event,
            SourceType::Inbound => f.inbound,
            SourceType::Outbound => f.outbound,
            SourceType::Unassigned => f.unassigned,
        }
    }

    /// Half-life decay clamped to `[recency_floor, 1.0]`.
    pub fn recency_factor(&self, age_days: i64) -> f64 {
        decayed_weight(1.0, age_days as f64, self.recency_half_life_days)
            .clamp(self.recency_floor, 1.0)
    }

    /// Weighted value of one record as of `today`.
    ///
    /// Returns `None` for excluded stages and for records without a
    /// discovery date (their age is unknown).
    pub fn weighted_value(&self, record: &Record, today: NaiveDate) -> Option<f64> {
        let stage_weight = self.stage_weight(record.stage)?;
        let age_days = age_days(record, today)?;
        Some(
            record.pipeline_or_arr_value()
                * stage_weight
                * self.source_factor(record.source_type)
                * self.recency_factor(age_days),
        )
    }

    /// Reject tables that would break `0 < weighted <= raw` or stage ordering.
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.stage_weights;
        let stages = [w.inbox, w.poa_booked, w.proposal_sent, w.legals];
        if stages.iter().any(|v| !in_unit_interval(*v)) {
            return Err("Stage weights must be in (0, 1]".into());
        }
        if stages.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err("Stage weights must increase from Inbox to Legals".into());
        }
        let f = &self.source_factors;
        let factors = [
            f.client_referral,
            f.upsell_cross_sell,
            f.internal_referral,
            f.partnership_event,
            f.inbound,
            f.outbound,
            f.unassigned,
        ];
        if factors.iter().any(|v| !in_unit_interval(*v)) {
            return Err("Source factors must be in (0, 1]".into());
        }
        if !in_unit_interval(self.recency_floor) {
            return Err("Recency floor must be in (0, 1]".into());
        }
        if self.recency_half_life_days <= 0.0 {
            return Err("Recency half-life must be positive".into());
        }
        Ok(())
    }
}

fn in_unit_interval(v: f64) -> bool {
    v > 0.0 && v <= 1.0
}

/// `base * 2^(-age_days / half_life_days)`. Negative ages are not decayed.
pub fn decayed_weight(base_weight: f64, age_days: f64, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 || age_days < 0.0 {
        return base_weight;
    }
    base_weight * (2.0_f64).powf(-age_days / half_life_days)
}

/// Whole days between discovery and `today`.
pub fn age_days(record: &Record, today: NaiveDate) -> Option<i64> {
    record
        .discovery_date
        .map(|discovered| (today - discovered).num_days())
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// A record with its raw and weighted values computed once per request.
#[derive(Debug, Clone, Copy)]
pub struct Annotated<'a> {
    pub record: &'a Record,
    pub raw_value: f64,
    pub weighted_value: Option<f64>,
    pub age_days: Option<i64>,
}

impl Annotated<'_> {
    /// Weighted value, or 0 for excluded records.
    pub fn weighted_or_zero(&self) -> f64 {
        self.weighted_value.unwrap_or(0.0)
    }
}

/// Annotate every record with its weighting inputs and output.
pub fn annotate<'a>(table: &WeightingTable, records: &'a [Record], today: NaiveDate) -> Vec<Annotated<'a>> {
    records
        .iter()
        .map(|record| Annotated {
            record,
            raw_value: record.pipeline_or_arr_value(),
            weighted_value: table.weighted_value(record, today),
            age_days: age_days(record, today),
        })
        .collect()
}
