//! Per-view monthly targets and their scaling to a resolved period.
//!
//! Targets are configured as base monthly values. A report multiplies each by
//! the period's `month_count`; revenue is the exception and sums the
//! configured per-calendar-month values when the period covers whole months.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::period::Period;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeetingTargets {
    pub total: f64,
    pub inbound: f64,
    pub outbound: f64,
    pub referral: f64,
    pub upsell: f64,
}

impl Default for MeetingTargets {
    fn default() -> Self {
        Self {
            total: 50.0,
            inbound: 22.0,
            outbound: 17.0,
            referral: 11.0,
            upsell: 5.0,
        }
    }
}

impl MeetingTargets {
    fn scaled(&self, month_count: u32) -> Self {
        Self {
            total: scaled_target(self.total, month_count),
            inbound: scaled_target(self.inbound, month_count),
            outbound: scaled_target(self.outbound, month_count),
            referral: scaled_target(self.referral, month_count),
            upsell: scaled_target(self.upsell, month_count),
        }
    }
}

/// Revenue targets differ by calendar month, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevenueTargets {
    pub default_monthly: f64,
    pub by_month: BTreeMap<String, f64>,
}

impl Default for RevenueTargets {
    fn default() -> Self {
        Self {
            default_monthly: 120_000.0,
            by_month: BTreeMap::new(),
        }
    }
}

impl RevenueTargets {
    pub fn for_month(&self, year: i32, month: u32) -> f64 {
        self.by_month
            .get(&month_key(year, month))
            .copied()
            .unwrap_or(self.default_monthly)
    }
}

pub fn month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DealTargets {
    pub count: f64,
    pub arr: f64,
}

impl Default for DealTargets {
    fn default() -> Self {
        Self {
            count: 4.0,
            arr: 120_000.0,
        }
    }
}

/// Percent of target at which a category counts as on track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thresholds {
    pub meetings: f64,
    pub intro_poa: f64,
    pub pipe: f64,
    pub revenue: f64,
    pub deals: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            meetings: 80.0,
            intro_poa: 80.0,
            pipe: 85.0,
            revenue: 90.0,
            deals: 90.0,
        }
    }
}

/// Base monthly targets for one view. Every field has a default, so a partial
/// or empty config document is always usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetConfig {
    pub meetings: MeetingTargets,
    pub intro: f64,
    pub poa: f64,
    pub revenue: RevenueTargets,
    pub pipe_created: f64,
    pub weighted_pipe_created: f64,
    pub deals_closed: DealTargets,
    /// Monthly intro goal for each BDR. AEs carry no meeting goal.
    pub bdr_meeting_goal: f64,
    pub thresholds: Thresholds,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            meetings: MeetingTargets::default(),
            intro: 40.0,
            poa: 20.0,
            revenue: RevenueTargets::default(),
            pipe_created: 300_000.0,
            weighted_pipe_created: 100_000.0,
            deals_closed: DealTargets::default(),
            bdr_meeting_goal: 15.0,
            thresholds: Thresholds::default(),
        }
    }
}

/// `base_monthly * month_count`.
pub fn scaled_target(base_monthly: f64, month_count: u32) -> f64 {
    base_monthly * month_count as f64
}

/// Targets scaled to one resolved period.
///
/// Built once per report from the same `Period` that filters the records, and
/// shared by every aggregator and the dashboard blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledTargets {
    pub month_count: u32,
    pub meetings: MeetingTargets,
    pub intro: f64,
    pub poa: f64,
    pub revenue: f64,
    pub pipe_created: f64,
    pub weighted_pipe_created: f64,
    pub deals_count: f64,
    pub deals_arr: f64,
    pub bdr_meeting_goal: f64,
    pub thresholds: Thresholds,
}

impl ScaledTargets {
    pub fn for_period(config: &TargetConfig, period: &Period) -> Self {
        let n = period.month_count;
        Self {
            month_count: n,
            meetings: config.meetings.scaled(n),
            intro: scaled_target(config.intro, n),
            poa: scaled_target(config.poa, n),
            revenue: revenue_target(&config.revenue, period),
            pipe_created: scaled_target(config.pipe_created, n),
            weighted_pipe_created: scaled_target(config.weighted_pipe_created, n),
            deals_count: scaled_target(config.deals_closed.count, n),
            deals_arr: scaled_target(config.deals_closed.arr, n),
            bdr_meeting_goal: scaled_target(config.bdr_meeting_goal, n),
            thresholds: config.thresholds.clone(),
        }
    }
}

/// Literal sum of per-month targets when the period is a run of whole
/// calendar months; otherwise the average overlapping month times
/// `month_count`.
pub fn revenue_target(revenue: &RevenueTargets, period: &Period) -> f64 {
    let monthly: Vec<f64> = period
        .calendar_months()
        .into_iter()
        .map(|(year, month)| revenue.for_month(year, month))
        .collect();
    if monthly.is_empty() {
        return scaled_target(revenue.default_monthly, period.month_count);
    }
    if period.is_whole_months() && monthly.len() == period.month_count as usize {
        return monthly.iter().sum();
    }
    let average = monthly.iter().sum::<f64>() / monthly.len() as f64;
    scaled_target(average, period.month_count)
}

/// `actual >= threshold% of target`. With no target, any activity counts.
pub fn on_track(actual: f64, target: f64, threshold_pct: f64) -> bool {
    if target <= 0.0 {
        return actual > 0.0;
    }
    actual >= target * threshold_pct / 100.0
}
