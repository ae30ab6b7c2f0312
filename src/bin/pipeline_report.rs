//! Print one pipeline report as JSON.
//!
//! Usage: `pipeline-report <db-path> <view-id> <period> [reference-date]`
//!
//! `period` is `current`, `relative:N`, `half-year:YYYY`, `yearly:YYYY` or
//! `YYYY-MM-DD..YYYY-MM-DD`. Set `PIPELINE_ENGINE_CONFIG` to a JSON file to
//! override weighting and aggregation settings.

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;

use pipeline_analytics::config::{load_engine_config, EngineConfig};
use pipeline_analytics::error::ReportFailure;
use pipeline_analytics::period::PeriodRequest;
use pipeline_analytics::report::ReportEngine;
use pipeline_analytics::store::SqliteStore;

const USAGE: &str = "usage: pipeline-report <db-path> <view-id> <period> [reference-date]";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 || args.len() > 4 {
        bail!(USAGE);
    }

    let config = match std::env::var_os("PIPELINE_ENGINE_CONFIG") {
        Some(path) => load_engine_config(&PathBuf::from(path))?,
        None => EngineConfig::default(),
    };
    let request: PeriodRequest = args[2].parse()?;

    let store = SqliteStore::open_at(PathBuf::from(&args[0]))
        .with_context(|| format!("Failed to open database {}", args[0]))?;
    let mut engine = ReportEngine::new(store, config);
    if let Some(raw) = args.get(3) {
        let today = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid reference date '{}'", raw))?;
        engine = engine.with_reference_date(today);
    }

    match engine.get_report(&args[1], &request) {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&ReportFailure::from(&e))?);
            Err(e.into())
        }
    }
}
