//! Sales-pipeline analytics: period resolution, pipeline weighting, target
//! scaling, metric aggregation and dashboard composition over a view's
//! record set.

pub mod aggregators;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod period;
pub mod report;
pub mod source;
pub mod store;
pub mod targets;
pub mod types;
pub mod views;
pub mod weighting;

#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
pub use error::{ReportError, ReportFailure};
pub use period::{Period, PeriodRequest};
pub use report::{Report, ReportEngine};
pub use source::{RecordSource, TargetSource};
pub use store::SqliteStore;
pub use types::{DateRange, Record, SourceType, Stage, ViewId};
