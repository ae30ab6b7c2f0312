//! Report engine: one request in, one fully-computed report out.
//!
//! Flow per request: validate/resolve the period, fetch the view's records
//! (fanning out for Master views) and its target config, drop malformed
//! records, annotate with weights, run the aggregators, compose the dashboard.
//! The engine holds no mutable state; concurrent requests need no
//! coordination.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregators::conversion::{self, MeetingsAttended};
use crate::aggregators::deals_closed::{self, DealsClosed};
use crate::aggregators::meetings::{self, MeetingGeneration};
use crate::aggregators::old_pipe::{self, StalledPipeline};
use crate::aggregators::pipeline::{self, PipelineMetrics};
use crate::aggregators::projections::{self, ClosingProjections};
use crate::aggregators::upsell::{self, UpsellRenewal};
use crate::aggregators::{assess_data_quality, AggregationInput, DataQuality, DealRow};
use crate::config::EngineConfig;
use crate::dashboard::{self, BigNumbersRecap, ComposerInput, DashboardBlocks};
use crate::error::ReportError;
use crate::period::{self, Period, PeriodRequest};
use crate::source::{RecordSource, TargetSource};
use crate::targets::ScaledTargets;
use crate::types::{Record, Relevance, Stage};
use crate::views;
use crate::weighting;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub view_id: String,
    pub reference_date: NaiveDate,
    pub period: Period,
    pub targets: ScaledTargets,
    pub meeting_generation: MeetingGeneration,
    pub meetings_attended: MeetingsAttended,
    pub pipe_metrics: PipelineMetrics,
    pub deals_closed: DealsClosed,
    pub old_pipe: StalledPipeline,
    pub closing_projections: ClosingProjections,
    pub dashboard_blocks: DashboardBlocks,
    pub big_numbers_recap: BigNumbersRecap,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsellRenewalReport {
    pub view_id: String,
    pub period: Period,
    #[serde(flatten)]
    pub upsell_renewal: UpsellRenewal,
    pub data_quality: DataQuality,
}

/// Ranked deal list used for hot deals and hot leads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDeals {
    pub count: usize,
    pub total_value: f64,
    pub total_weighted_value: f64,
    /// Highest weighted value first.
    pub deals: Vec<DealRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AePipelineRow {
    pub created_pipe: f64,
    pub created_weighted_pipe: f64,
    pub total_pipe: f64,
    pub total_weighted_pipe: f64,
    pub open_deals: usize,
    pub closed_count: usize,
    pub closed_arr: f64,
    pub projected_weighted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AePipelineBreakdown {
    pub view_id: String,
    pub period_label: String,
    pub by_ae: BTreeMap<String, AePipelineRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub view_id: String,
    pub period_label: String,
    pub dashboard_blocks: DashboardBlocks,
    pub big_numbers_recap: BigNumbersRecap,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Computes reports over a record/target source.
pub struct ReportEngine<S> {
    source: S,
    config: EngineConfig,
    reference_date: Option<NaiveDate>,
}

/// Everything one request fetched, before weighting.
struct Snapshot {
    today: NaiveDate,
    period: Period,
    targets: ScaledTargets,
    records: Vec<Record>,
    data_quality: DataQuality,
}

impl<S: RecordSource + TargetSource> ReportEngine<S> {
    pub fn new(source: S, config: EngineConfig) -> Self {
        Self {
            source,
            config,
            reference_date: None,
        }
    }

    /// Pin "today" for period resolution, record ages and hot-lead windows.
    pub fn with_reference_date(mut self, today: NaiveDate) -> Self {
        self.reference_date = Some(today);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The injected reference date, or the local calendar date when none was
    /// set. Read once per request.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    fn snapshot(&self, view_id: &str, request: &PeriodRequest) -> Result<Snapshot, ReportError> {
        let today = self.reference_date();
        // Reject bad periods before touching the source.
        let period = period::resolve(request, today)?;

        let fetched = views::fetch_view_records(&self.source, view_id, None, None)?;
        let config = self.source.fetch_target_config(view_id)?;
        let targets = ScaledTargets::for_period(&config, &period);

        let data_quality = assess_data_quality(&fetched);
        let records: Vec<Record> = fetched
            .into_iter()
            .filter(Record::is_well_formed)
            .collect();

        log::debug!(
            "View {} for {}: {} usable records, {} months",
            view_id,
            period.label,
            records.len(),
            period.month_count
        );
        Ok(Snapshot {
            today,
            period,
            targets,
            records,
            data_quality,
        })
    }

    fn run<R>(&self, snapshot: &Snapshot, f: impl FnOnce(&AggregationInput<'_>) -> R) -> R {
        let annotated = weighting::annotate(&self.config.weighting, &snapshot.records, snapshot.today);
        let input = AggregationInput {
            records: &annotated,
            period: &snapshot.period,
            targets: &snapshot.targets,
            today: snapshot.today,
        };
        f(&input)
    }

    /// Full report for one view and period.
    pub fn get_report(&self, view_id: &str, request: &PeriodRequest) -> Result<Report, ReportError> {
        let snapshot = self.snapshot(view_id, request)?;
        let report = self.run(&snapshot, |input| {
            let meeting_generation = meetings::aggregate(input);
            let meetings_attended = conversion::aggregate(input);
            let pipe_metrics = pipeline::aggregate(input, self.config.created_pipe_includes_lost);
            let deals_closed = deals_closed::aggregate(input);
            let old_pipe = old_pipe::aggregate(input, self.config.stale_after_days);
            let closing_projections = projections::aggregate(input);

            let composer = ComposerInput {
                period_label: &input.period.label,
                targets: input.targets,
                meetings: &meeting_generation,
                attended: &meetings_attended,
                pipeline: &pipe_metrics,
                closed: &deals_closed,
                stalled: &old_pipe,
                projections: &closing_projections,
            };
            let dashboard_blocks = dashboard::compose_blocks(&composer);
            let big_numbers_recap = dashboard::big_numbers(&composer);

            Report {
                view_id: view_id.to_string(),
                reference_date: input.today,
                period: input.period.clone(),
                targets: input.targets.clone(),
                meeting_generation,
                meetings_attended,
                pipe_metrics,
                deals_closed,
                old_pipe,
                closing_projections,
                dashboard_blocks,
                big_numbers_recap,
                data_quality: snapshot.data_quality.clone(),
            }
        });
        log::info!(
            "Report for {} ({}): {} meetings, {} deals closed",
            view_id,
            report.period.label,
            report.meeting_generation.total,
            report.deals_closed.totals.count
        );
        Ok(report)
    }

    /// Upsell/renewal split and partner table. An explicit request covers
    /// arbitrary date ranges.
    pub fn get_upsell_renewal_report(
        &self,
        view_id: &str,
        request: &PeriodRequest,
    ) -> Result<UpsellRenewalReport, ReportError> {
        let snapshot = self.snapshot(view_id, request)?;
        let upsell_renewal = self.run(&snapshot, upsell::aggregate);
        Ok(UpsellRenewalReport {
            view_id: view_id.to_string(),
            period: snapshot.period,
            upsell_renewal,
            data_quality: snapshot.data_quality,
        })
    }

    /// Late-stage open deals (Proposal Sent, Legals) by weighted value.
    pub fn get_hot_deals(&self, view_id: &str) -> Result<RankedDeals, ReportError> {
        let snapshot = self.snapshot(view_id, &current_month())?;
        let limit = self.config.hot_deal_limit;
        Ok(self.run(&snapshot, |input| {
            let rows = input
                .open()
                .filter(|a| matches!(a.record.stage, Stage::ProposalSent | Stage::Legals))
                .map(DealRow::from)
                .collect();
            rank(rows, limit)
        }))
    }

    /// Early-stage deals (Inbox, POA Booked) discovered recently and not
    /// marked irrelevant, by weighted value.
    pub fn get_hot_leads(&self, view_id: &str) -> Result<RankedDeals, ReportError> {
        let snapshot = self.snapshot(view_id, &current_month())?;
        let window = self.config.hot_lead_window_days;
        let limit = self.config.hot_deal_limit;
        Ok(self.run(&snapshot, |input| {
            let rows = input
                .open()
                .filter(|a| matches!(a.record.stage, Stage::Inbox | Stage::PoaBooked))
                .filter(|a| a.record.relevance != Some(Relevance::NotRelevant))
                .filter(|a| matches!(a.age_days, Some(age) if (0..=window).contains(&age)))
                .map(DealRow::from)
                .collect();
            rank(rows, limit)
        }))
    }

    /// Per-AE pipeline, closings and projections for the current month.
    pub fn get_ae_pipeline_breakdown(&self, view_id: &str) -> Result<AePipelineBreakdown, ReportError> {
        let snapshot = self.snapshot(view_id, &current_month())?;
        let includes_dead = self.config.created_pipe_includes_lost;
        let by_ae = self.run(&snapshot, |input| {
            let pipe = pipeline::aggregate(input, includes_dead);
            let closed = deals_closed::aggregate(input);
            let projected = projections::aggregate(input);

            let mut by_ae: BTreeMap<String, AePipelineRow> = BTreeMap::new();
            for (ae, values) in &pipe.by_ae {
                let row = by_ae.entry(ae.clone()).or_default();
                row.created_pipe = values.created_pipe;
                row.created_weighted_pipe = values.created_weighted_pipe;
                row.total_pipe = values.total_pipe;
                row.total_weighted_pipe = values.total_weighted_pipe;
                row.open_deals = values.active_count;
            }
            for (ae, totals) in &closed.by_ae {
                let row = by_ae.entry(ae.clone()).or_default();
                row.closed_count = totals.count;
                row.closed_arr = totals.arr;
            }
            for (ae, projection) in &projected.by_ae {
                by_ae.entry(ae.clone()).or_default().projected_weighted = projection.weighted;
            }
            by_ae
        });
        Ok(AePipelineBreakdown {
            view_id: view_id.to_string(),
            period_label: snapshot.period.label,
            by_ae,
        })
    }

    /// Current-month dashboard blocks and recap, without drill-down lists.
    pub fn get_performance_summary(&self, view_id: &str) -> Result<PerformanceSummary, ReportError> {
        let report = self.get_report(view_id, &current_month())?;
        Ok(PerformanceSummary {
            view_id: report.view_id,
            period_label: report.period.label,
            dashboard_blocks: report.dashboard_blocks,
            big_numbers_recap: report.big_numbers_recap,
        })
    }
}

fn current_month() -> PeriodRequest {
    PeriodRequest::RelativeMonth { offset: 0 }
}

fn rank(mut rows: Vec<DealRow>, limit: usize) -> RankedDeals {
    rows.sort_by(|a, b| {
        b.weighted_value
            .unwrap_or(0.0)
            .total_cmp(&a.weighted_value.unwrap_or(0.0))
            .then_with(|| a.id.cmp(&b.id))
    });
    rows.truncate(limit);
    RankedDeals {
        count: rows.len(),
        total_value: rows.iter().map(|r| r.value).sum(),
        total_weighted_value: rows.iter().map(|r| r.weighted_value.unwrap_or(0.0)).sum(),
        deals: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::SqliteStore;
    use crate::targets::TargetConfig;
    use crate::test_support::{date, RecordBuilder};
    use crate::types::{DateRange, SourceType, ViewId};
    use parking_lot::Mutex;

    const OCTOBER: PeriodRequest = PeriodRequest::RelativeMonth { offset: 0 };

    fn today() -> NaiveDate {
        date(2025, 10, 31)
    }

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_records(
                "uk",
                &[
                    RecordBuilder::new("uk-1").source(SourceType::Inbound).stage(Stage::ProposalSent).value(40_000.0).discovered(2025, 10, 2).build(),
                    RecordBuilder::new("uk-2").source(SourceType::Outbound).stage(Stage::Lost).value(25_000.0).discovered(2025, 10, 6).build(),
                    RecordBuilder::new("uk-3").owner("Lee").arr(36_000.0).closed(2025, 10, 14).discovered(2025, 8, 20).build(),
                ],
            )
            .unwrap();
        store
            .insert_records(
                "us",
                &[
                    RecordBuilder::new("us-1").source(SourceType::ClientReferral).stage(Stage::Legals).value(80_000.0).discovered(2025, 10, 9).build(),
                    RecordBuilder::new("us-2").source(SourceType::Inbound).stage(Stage::NotRelevant).value(5_000.0).discovered(2025, 10, 11).build(),
                    RecordBuilder::new("us-3").owner("Lee").stage(Stage::PoaBooked).value(15_000.0).discovered(2025, 4, 1).build(),
                ],
            )
            .unwrap();
        store
            .insert_records(
                "de",
                &[
                    RecordBuilder::new("de-1").source(SourceType::PartnershipEvent).stage(Stage::Inbox).value(12_000.0).discovered(2025, 10, 20).build(),
                    RecordBuilder::new("de-2").arr(60_000.0).closed(2025, 10, 30).discovered(2025, 9, 1).build(),
                ],
            )
            .unwrap();
        store.set_view_members("master", &["uk", "us", "de"]).unwrap();
        store
    }

    fn engine(store: &SqliteStore) -> ReportEngine<&SqliteStore> {
        ReportEngine::new(store, EngineConfig::default()).with_reference_date(today())
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<ReportEngine<SqliteStore>>();

        let store = seeded_store();
        let engine = engine(&store);
        let (a, b) = std::thread::scope(|s| {
            let a = s.spawn(|| engine.get_report("uk", &OCTOBER).unwrap());
            let b = s.spawn(|| engine.get_report("us", &OCTOBER).unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });
        assert_eq!(a.view_id, "uk");
        assert_eq!(b.view_id, "us");
    }

    #[test]
    fn test_october_report_targets() {
        let store = seeded_store();
        let report = engine(&store).get_report("uk", &OCTOBER).unwrap();
        assert_eq!(report.period.label, "October 2025");
        let targets = &report.meeting_generation.targets;
        assert_eq!(targets.total, 50.0);
        assert_eq!(targets.inbound, 22.0);
        assert_eq!(targets.outbound, 17.0);
        assert_eq!(targets.referral, 11.0);
        assert_eq!(report.dashboard_blocks.meetings.metric("total").unwrap().target, Some(50.0));
    }

    #[test]
    fn test_created_pipe_includes_lost_raw_not_weighted() {
        let store = seeded_store();
        let report = engine(&store).get_report("uk", &OCTOBER).unwrap();
        let pipe = &report.pipe_metrics.totals;
        assert_eq!(pipe.created_pipe, 65_000.0);
        let only_open = RecordBuilder::new("uk-1").source(SourceType::Inbound).stage(Stage::ProposalSent).value(40_000.0).discovered(2025, 10, 2).build();
        let expected = EngineConfig::default().weighting.weighted_value(&only_open, today()).unwrap();
        assert!((pipe.created_weighted_pipe - expected).abs() < 1e-6);
    }

    #[test]
    fn test_master_equals_sum_of_members() {
        let store = seeded_store();
        let engine = engine(&store);
        let master = engine.get_report("master", &OCTOBER).unwrap();
        let members: Vec<Report> = ["uk", "us", "de"]
            .iter()
            .map(|v| engine.get_report(v, &OCTOBER).unwrap())
            .collect();

        let sum_usize = |f: fn(&Report) -> usize| members.iter().map(f).sum::<usize>();
        let sum_f64 = |f: fn(&Report) -> f64| members.iter().map(f).sum::<f64>();

        assert_eq!(master.meeting_generation.total, sum_usize(|r| r.meeting_generation.total));
        assert_eq!(master.meeting_generation.total, 5);
        assert_eq!(master.deals_closed.totals.count, sum_usize(|r| r.deals_closed.totals.count));
        assert_eq!(master.pipe_metrics.totals.active_count, sum_usize(|r| r.pipe_metrics.totals.active_count));
        assert_eq!(master.deals_closed.totals.arr, sum_f64(|r| r.deals_closed.totals.arr));
        assert_eq!(master.pipe_metrics.totals.created_pipe, sum_f64(|r| r.pipe_metrics.totals.created_pipe));
        assert!(
            (master.pipe_metrics.totals.total_weighted_pipe - sum_f64(|r| r.pipe_metrics.totals.total_weighted_pipe)).abs() < 1e-6
        );
        assert!(
            (master.pipe_metrics.totals.created_weighted_pipe - sum_f64(|r| r.pipe_metrics.totals.created_weighted_pipe)).abs() < 1e-6
        );
    }

    #[test]
    fn test_report_is_idempotent() {
        let store = seeded_store();
        let engine = engine(&store);
        let first = serde_json::to_string(&engine.get_report("master", &OCTOBER).unwrap()).unwrap();
        let second = serde_json::to_string(&engine.get_report("master", &OCTOBER).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_view_is_zero_not_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let report = engine(&store).get_report("nobody", &OCTOBER).unwrap();
        assert_eq!(report.meeting_generation.total, 0);
        assert!(!report.meeting_generation.on_track);
        assert!(report.pipe_metrics.details.is_empty());
        assert_eq!(report.meetings_attended.intro_to_poa_rate, 0.0);
        assert_eq!(report.data_quality, DataQuality::default());
    }

    #[test]
    fn test_malformed_records_counted_and_excluded() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_records(
                "uk",
                &[
                    RecordBuilder::new("ok").value(1_000.0).discovered(2025, 10, 1).build(),
                    RecordBuilder::new("undated").value(9_000.0).build(),
                ],
            )
            .unwrap();
        let report = engine(&store).get_report("uk", &OCTOBER).unwrap();
        assert_eq!(report.data_quality.missing_discovery_date, 1);
        assert_eq!(report.data_quality.excluded_record_ids, vec!["undated"]);
        assert_eq!(report.pipe_metrics.totals.total_pipe, 1_000.0);
        assert_eq!(report.old_pipe.count, 0);
    }

    #[test]
    fn test_unreadable_money_value_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.db");
        let store = SqliteStore::open_at(path.clone()).unwrap();
        store
            .insert_record("uk", &RecordBuilder::new("ok").value(1_000.0).discovered(2025, 10, 1).build())
            .unwrap();
        {
            let raw = rusqlite::Connection::open(&path).unwrap();
            raw.execute(
                "INSERT INTO pipeline_records (id, view_id, client, stage, discovery_date, pipeline_value)
                 VALUES ('bad', 'uk', 'Acme', 'Inbox', '2025-10-03', 'n/a')",
                [],
            )
            .unwrap();
        }

        let report = engine(&store).get_report("uk", &OCTOBER).expect("report despite bad cell");
        assert_eq!(report.data_quality.unreadable_values, 1);
        assert_eq!(report.data_quality.excluded_record_ids, vec!["bad"]);
        assert_eq!(report.pipe_metrics.totals.total_pipe, 1_000.0);
    }

    #[test]
    fn test_views_sharing_a_record_id_both_count_in_master() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_record("uk", &RecordBuilder::new("row-1").value(1_000.0).discovered(2025, 10, 1).build())
            .unwrap();
        store
            .insert_record("us", &RecordBuilder::new("row-1").value(2_000.0).discovered(2025, 10, 2).build())
            .unwrap();
        store.set_view_members("master", &["uk", "us"]).unwrap();

        let engine = engine(&store);
        assert_eq!(engine.get_report("uk", &OCTOBER).unwrap().pipe_metrics.totals.total_pipe, 1_000.0);
        assert_eq!(engine.get_report("master", &OCTOBER).unwrap().pipe_metrics.totals.total_pipe, 3_000.0);
    }

    /// Delegates to a store and records every call.
    struct CountingSource<'a> {
        store: &'a SqliteStore,
        calls: Mutex<Vec<String>>,
    }

    impl RecordSource for CountingSource<'_> {
        fn fetch_records(
            &self,
            view_id: &str,
            stage_filter: Option<&[Stage]>,
            date_range: Option<DateRange>,
        ) -> Result<Vec<Record>, StoreError> {
            self.calls.lock().push(format!("records:{}", view_id));
            self.store.fetch_records(view_id, stage_filter, date_range)
        }

        fn resolve_view_membership(&self, view_id: &str) -> Result<Vec<ViewId>, StoreError> {
            self.calls.lock().push(format!("members:{}", view_id));
            self.store.resolve_view_membership(view_id)
        }
    }

    impl TargetSource for CountingSource<'_> {
        fn fetch_target_config(&self, view_id: &str) -> Result<TargetConfig, StoreError> {
            self.calls.lock().push(format!("targets:{}", view_id));
            self.store.fetch_target_config(view_id)
        }
    }

    #[test]
    fn test_invalid_period_rejected_before_fetch() {
        let store = seeded_store();
        let source = CountingSource { store: &store, calls: Mutex::new(Vec::new()) };
        let engine = ReportEngine::new(&source, EngineConfig::default()).with_reference_date(today());
        let request = PeriodRequest::Explicit { start: date(2025, 10, 31), end: date(2025, 10, 1) };
        let err = engine.get_report("uk", &request).unwrap_err();
        assert!(err.is_validation());
        assert!(source.calls.lock().is_empty());
    }

    #[test]
    fn test_target_config_read_once_per_report() {
        let store = seeded_store();
        let source = CountingSource { store: &store, calls: Mutex::new(Vec::new()) };
        let engine = ReportEngine::new(&source, EngineConfig::default()).with_reference_date(today());
        engine.get_report("master", &OCTOBER).unwrap();
        let calls = source.calls.lock();
        assert_eq!(calls.iter().filter(|c| c.starts_with("targets:")).count(), 1);
        assert_eq!(calls.iter().filter(|c| c.starts_with("records:")).count(), 3);
    }

    #[test]
    fn test_master_uses_own_target_config() {
        let store = seeded_store();
        let mut config = TargetConfig::default();
        config.meetings.total = 150.0;
        store.set_target_config("master", &config).unwrap();
        let report = engine(&store).get_report("master", &OCTOBER).unwrap();
        assert_eq!(report.meeting_generation.targets.total, 150.0);
    }

    #[test]
    fn test_hot_deals_ranked_by_weighted_value() {
        let store = seeded_store();
        let hot = engine(&store).get_hot_deals("master").unwrap();
        let ids: Vec<&str> = hot.deals.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["us-1", "uk-1"]);
        assert_eq!(hot.total_value, 120_000.0);
    }

    #[test]
    fn test_hot_deals_respects_limit() {
        let store = seeded_store();
        let config = EngineConfig { hot_deal_limit: 1, ..EngineConfig::default() };
        let hot = ReportEngine::new(&store, config).with_reference_date(today()).get_hot_deals("master").unwrap();
        assert_eq!(hot.count, 1);
        assert_eq!(hot.deals[0].id, "us-1");
    }

    #[test]
    fn test_hot_leads_window() {
        let store = seeded_store();
        let leads = engine(&store).get_hot_leads("master").unwrap();
        // us-3 is a POA from April: outside the 30-day window.
        let ids: Vec<&str> = leads.deals.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["de-1"]);
    }

    #[test]
    fn test_ae_pipeline_breakdown() {
        let store = seeded_store();
        let breakdown = engine(&store).get_ae_pipeline_breakdown("master").unwrap();
        assert_eq!(breakdown.period_label, "October 2025");
        let lee = &breakdown.by_ae["Lee"];
        assert_eq!(lee.closed_count, 1);
        assert_eq!(lee.closed_arr, 36_000.0);
        assert_eq!(lee.total_pipe, 15_000.0);
        assert!(lee.projected_weighted > 0.0);
        let dana = &breakdown.by_ae["Dana"];
        assert_eq!(dana.open_deals, 3);
        assert_eq!(dana.closed_arr, 60_000.0);
    }

    #[test]
    fn test_performance_summary_matches_report() {
        let store = seeded_store();
        let engine = engine(&store);
        let summary = engine.get_performance_summary("uk").unwrap();
        let report = engine.get_report("uk", &OCTOBER).unwrap();
        assert_eq!(summary.dashboard_blocks, report.dashboard_blocks);
        assert_eq!(summary.big_numbers_recap, report.big_numbers_recap);
    }

    #[test]
    fn test_upsell_report_over_explicit_range() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_records(
                "uk",
                &[
                    RecordBuilder::new("u1").deal_type(crate::types::DealType::Upsell).value(9_000.0).partner("Northwind").discovered(2025, 9, 15).build(),
                    RecordBuilder::new("r1").deal_type(crate::types::DealType::Renewal).value(4_000.0).discovered(2025, 10, 15).build(),
                ],
            )
            .unwrap();
        let request = PeriodRequest::Explicit { start: date(2025, 9, 1), end: date(2025, 10, 31) };
        let report = engine(&store).get_upsell_renewal_report("uk", &request).unwrap();
        assert_eq!(report.period.month_count, 2);
        assert_eq!(report.upsell_renewal.upsell.count, 1);
        assert_eq!(report.upsell_renewal.renewal.value, 4_000.0);
        assert_eq!(report.upsell_renewal.partners["Northwind"].intros, 1);
    }
}
