//! Dashboard block composer.
//!
//! Blocks are assembled from already-computed aggregator outputs and the
//! `ScaledTargets` those aggregators saw. Nothing here touches records or
//! re-resolves the period, so block totals always match the tab totals.

use serde::Serialize;

use crate::aggregators::conversion::MeetingsAttended;
use crate::aggregators::deals_closed::DealsClosed;
use crate::aggregators::meetings::MeetingGeneration;
use crate::aggregators::old_pipe::StalledPipeline;
use crate::aggregators::pipeline::PipelineMetrics;
use crate::aggregators::projections::ClosingProjections;
use crate::targets::{on_track, ScaledTargets};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetric {
    pub name: String,
    pub period_label: String,
    pub actual: f64,
    /// `None` for informational metrics without a goal.
    pub target: Option<f64>,
    pub on_track: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBlock {
    pub title: String,
    pub metrics: Vec<BlockMetric>,
}

impl DashboardBlock {
    pub fn metric(&self, name: &str) -> Option<&BlockMetric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBlocks {
    pub meetings: DashboardBlock,
    pub intro_poa: DashboardBlock,
    pub pipe_creation: DashboardBlock,
    pub revenue: DashboardBlock,
}

/// Headline numbers for the top of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BigNumbersRecap {
    pub period_label: String,
    pub month_count: u32,
    pub meetings: usize,
    pub meetings_target: f64,
    pub attendance_rate: f64,
    pub intros: usize,
    pub poa_meetings: usize,
    pub intro_to_poa_rate: f64,
    pub poa_to_close_rate: f64,
    pub created_pipe: f64,
    pub created_weighted_pipe: f64,
    pub total_pipe: f64,
    pub total_weighted_pipe: f64,
    pub deals_closed: usize,
    pub closed_arr: f64,
    pub revenue_target: f64,
    pub stalled_deals: usize,
    pub projected_weighted: f64,
}

/// Everything the composer reads. Borrowed from one report computation.
pub struct ComposerInput<'a> {
    pub period_label: &'a str,
    pub targets: &'a ScaledTargets,
    pub meetings: &'a MeetingGeneration,
    pub attended: &'a MeetingsAttended,
    pub pipeline: &'a PipelineMetrics,
    pub closed: &'a DealsClosed,
    pub stalled: &'a StalledPipeline,
    pub projections: &'a ClosingProjections,
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

impl ComposerInput<'_> {
    fn goal(&self, name: &str, actual: f64, target: f64, threshold: f64) -> BlockMetric {
        BlockMetric {
            name: name.to_string(),
            period_label: self.period_label.to_string(),
            actual,
            target: Some(target),
            on_track: Some(on_track(actual, target, threshold)),
        }
    }

    fn info(&self, name: &str, actual: f64) -> BlockMetric {
        BlockMetric {
            name: name.to_string(),
            period_label: self.period_label.to_string(),
            actual,
            target: None,
            on_track: None,
        }
    }
}

pub fn compose_blocks(input: &ComposerInput) -> DashboardBlocks {
    let t = input.targets;
    let th = &t.thresholds;
    let m = input.meetings;
    let referral = (m.by_source.referral + m.by_source.partnership_event) as f64;

    let meetings = DashboardBlock {
        title: "Meetings".to_string(),
        metrics: vec![
            input.goal("total", m.total as f64, t.meetings.total, th.meetings),
            input.goal("inbound", m.by_source.inbound as f64, t.meetings.inbound, th.meetings),
            input.goal("outbound", m.by_source.outbound as f64, t.meetings.outbound, th.meetings),
            input.goal("referral", referral, t.meetings.referral, th.meetings),
            input.goal(
                "upsellCrossSell",
                m.by_source.upsell_cross_sell as f64,
                t.meetings.upsell,
                th.meetings,
            ),
        ],
    };

    let a = input.attended;
    let intro_poa = DashboardBlock {
        title: "Intro & POA".to_string(),
        metrics: vec![
            input.goal("intros", a.intros as f64, t.intro, th.intro_poa),
            input.goal("poaMeetings", a.poa_meetings as f64, t.poa, th.intro_poa),
            input.info("introToPoaRate", a.intro_to_poa_rate),
            input.info("poaToCloseRate", a.poa_to_close_rate),
        ],
    };

    let p = &input.pipeline.totals;
    let pipe_creation = DashboardBlock {
        title: "Pipe Creation".to_string(),
        metrics: vec![
            input.goal("newPipe", p.created_pipe, t.pipe_created, th.pipe),
            input.goal(
                "weightedNewPipe",
                p.created_weighted_pipe,
                t.weighted_pipe_created,
                th.pipe,
            ),
            input.info("aggregateWeightedPipe", p.total_weighted_pipe),
        ],
    };

    let c = input.closed;
    let revenue = DashboardBlock {
        title: "Revenue / Deals Closed".to_string(),
        metrics: vec![
            input.goal("closedArr", c.totals.arr, t.revenue, th.revenue),
            input.goal("dealsClosed", c.totals.count as f64, t.deals_count, th.deals),
        ],
    };

    DashboardBlocks {
        meetings,
        intro_poa,
        pipe_creation,
        revenue,
    }
}

pub fn big_numbers(input: &ComposerInput) -> BigNumbersRecap {
    BigNumbersRecap {
        period_label: input.period_label.to_string(),
        month_count: input.targets.month_count,
        meetings: input.meetings.total,
        meetings_target: input.targets.meetings.total,
        attendance_rate: input.attended.attendance_rate,
        intros: input.attended.intros,
        poa_meetings: input.attended.poa_meetings,
        intro_to_poa_rate: input.attended.intro_to_poa_rate,
        poa_to_close_rate: input.attended.poa_to_close_rate,
        created_pipe: input.pipeline.totals.created_pipe,
        created_weighted_pipe: input.pipeline.totals.created_weighted_pipe,
        total_pipe: input.pipeline.totals.total_pipe,
        total_weighted_pipe: input.pipeline.totals.total_weighted_pipe,
        deals_closed: input.closed.totals.count,
        closed_arr: input.closed.totals.arr,
        revenue_target: input.targets.revenue,
        stalled_deals: input.stalled.count,
        projected_weighted: input.projections.total_weighted,
    }
}
