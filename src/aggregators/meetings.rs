//! Meeting generation: new intros booked in the period, by source and BDR.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{breakdown_key, rate, sort_rows, AggregationInput, DealRow};
use crate::targets::{on_track, MeetingTargets};
use crate::types::{Relevance, SourceType};

/// Intro counts per source bucket. Client and internal referrals share the
/// referral bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCounts {
    pub inbound: usize,
    pub outbound: usize,
    pub referral: usize,
    pub partnership_event: usize,
    pub upsell_cross_sell: usize,
    pub unassigned: usize,
}

impl SourceCounts {
    fn add(&mut self, source: SourceType) {
        match source {
            SourceType::Inbound => self.inbound += 1,
            SourceType::Outbound => self.outbound += 1,
            SourceType::ClientReferral | SourceType::InternalReferral => self.referral += 1,
            SourceType::PartnershipEvent => self.partnership_event += 1,
            SourceType::UpsellCrossSell => self.upsell_cross_sell += 1,
            SourceType::Unassigned => self.unassigned += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceDistribution {
    pub relevant: usize,
    pub questionable: usize,
    pub not_relevant: usize,
    pub unrated: usize,
    /// relevant / total * 100.
    pub relevance_rate: f64,
}

/// Per-source on-track flags against the scaled source targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOnTrack {
    pub inbound: bool,
    pub outbound: bool,
    pub referral: bool,
    pub upsell: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BdrMeetings {
    pub total: usize,
    pub by_source: SourceCounts,
    pub goal: f64,
    pub on_track: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingGeneration {
    pub total: usize,
    pub by_source: SourceCounts,
    pub targets: MeetingTargets,
    pub on_track: bool,
    pub source_on_track: SourceOnTrack,
    pub relevance: RelevanceDistribution,
    pub by_bdr: BTreeMap<String, BdrMeetings>,
    /// Intros per AE. Informational only: AEs have no meeting goal.
    pub by_owner: BTreeMap<String, usize>,
    pub details: Vec<DealRow>,
}

pub fn aggregate(input: &AggregationInput) -> MeetingGeneration {
    let targets = &input.targets.meetings;
    let threshold = input.targets.thresholds.meetings;
    let mut result = MeetingGeneration {
        targets: targets.clone(),
        ..MeetingGeneration::default()
    };

    for annotated in input.in_period() {
        let record = annotated.record;
        result.total += 1;
        result.by_source.add(record.source_type);

        match record.relevance {
            Some(Relevance::Relevant) => result.relevance.relevant += 1,
            Some(Relevance::Questionable) => result.relevance.questionable += 1,
            Some(Relevance::NotRelevant) => result.relevance.not_relevant += 1,
            None => result.relevance.unrated += 1,
        }

        let bdr = result.by_bdr.entry(breakdown_key(&record.bdr)).or_default();
        bdr.total += 1;
        bdr.by_source.add(record.source_type);

        *result.by_owner.entry(breakdown_key(&record.owner)).or_default() += 1;
        result.details.push(DealRow::from(annotated));
    }

    result.relevance.relevance_rate = rate(result.relevance.relevant as f64, result.total as f64);
    result.on_track = on_track(result.total as f64, targets.total, threshold);

    let referral = result.by_source.referral + result.by_source.partnership_event;
    result.source_on_track = SourceOnTrack {
        inbound: on_track(result.by_source.inbound as f64, targets.inbound, threshold),
        outbound: on_track(result.by_source.outbound as f64, targets.outbound, threshold),
        referral: on_track(referral as f64, targets.referral, threshold),
        upsell: on_track(result.by_source.upsell_cross_sell as f64, targets.upsell, threshold),
    };

    let goal = input.targets.bdr_meeting_goal;
    for bdr in result.by_bdr.values_mut() {
        bdr.goal = goal;
        bdr.on_track = on_track(bdr.total as f64, goal, threshold);
    }

    sort_rows(&mut result.details);
    result
}
