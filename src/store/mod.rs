//! SQLite-backed record and target store.
//!
//! This is the reference implementation of `RecordSource` and `TargetSource`
//! used by the `pipeline-report` binary and by tests. Ingestion and target
//! administration write through the `insert_*`/`set_*` helpers; the report
//! engine only reads.

use std::path::PathBuf;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::source::{RecordSource, TargetSource};
use crate::targets::TargetConfig;
use crate::types::{
    Attendance, DateRange, DealType, Record, Relevance, SourceType, Stage, ViewId,
};

const SCHEMA: &str = include_str!("schema.sql");

const RECORD_COLUMNS: &str = "id, client, stage, source_type, discovery_date, poa_date,
    billing_start, closed_date, expected_mrr, expected_arr, pipeline_value, owner, bdr,
    attendance, type_of_deal, relevance, partner";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at an explicit path and apply the schema.
    pub fn open_at(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
            }
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Private in-memory store. Useful for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    fn with_transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock();
        conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(&conn) {
            Ok(val) => {
                conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Insert or replace one record in `view_id`.
    pub fn insert_record(&self, view_id: &str, record: &Record) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        insert_record_with(&conn, view_id, record)
    }

    /// Insert a batch of records atomically.
    pub fn insert_records(&self, view_id: &str, records: &[Record]) -> Result<usize, StoreError> {
        self.with_transaction(|conn| {
            for record in records {
                insert_record_with(conn, view_id, record)?;
            }
            Ok(records.len())
        })
    }

    /// Replace the whole target config of a view in one write.
    pub fn set_target_config(&self, view_id: &str, config: &TargetConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string(config)?;
        self.set_target_config_json(view_id, &json)
    }

    /// Store a raw (possibly partial) target config document.
    pub fn set_target_config_json(&self, view_id: &str, json: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO view_targets (view_id, config_json, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(view_id) DO UPDATE SET
                 config_json = excluded.config_json,
                 updated_at = excluded.updated_at",
            params![view_id, json],
        )?;
        Ok(())
    }

    /// Declare `master_view_id` as the union of `members`, in order.
    pub fn set_view_members(&self, master_view_id: &str, members: &[&str]) -> Result<(), StoreError> {
        self.with_transaction(|conn| {
            conn.execute(
                "DELETE FROM view_members WHERE master_view_id = ?1",
                params![master_view_id],
            )?;
            for (position, member) in members.iter().enumerate() {
                conn.execute(
                    "INSERT INTO view_members (master_view_id, member_view_id, position)
                     VALUES (?1, ?2, ?3)",
                    params![master_view_id, member, position as i64],
                )?;
            }
            Ok(())
        })
    }
}

fn insert_record_with(conn: &Connection, view_id: &str, r: &Record) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO pipeline_records
            (id, view_id, client, stage, source_type, discovery_date, poa_date, billing_start,
             closed_date, expected_mrr, expected_arr, pipeline_value, owner, bdr, attendance,
             type_of_deal, relevance, partner)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            r.id,
            view_id,
            r.client,
            r.stage.as_str(),
            r.source_type.as_str(),
            r.discovery_date.map(format_date),
            r.poa_date.map(format_date),
            r.billing_start.map(format_date),
            r.closed_date.map(format_date),
            r.expected_mrr,
            r.expected_arr,
            r.pipeline_value,
            r.owner,
            r.bdr,
            r.attendance.map(|a| a.as_str()),
            r.type_of_deal.map(|t| t.as_str()),
            r.relevance.map(|v| v.as_str()),
            r.partner,
        ],
    )?;
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Lenient date parse: an unreadable cell becomes `None` and the record is
/// later counted as malformed instead of failing the whole fetch.
fn parse_date(column: &str, value: Option<String>) -> Option<NaiveDate> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            log::debug!("Unparseable {} '{}' treated as missing", column, trimmed);
            None
        }
    }
}

/// Lenient money read: NULL is 0, numeric text is parsed, anything else is
/// recorded in `unreadable` and read as 0.
fn read_money(row: &Row, idx: usize, column: &str, unreadable: &mut Vec<String>) -> rusqlite::Result<f64> {
    let value = match row.get::<_, Value>(idx)? {
        Value::Null => Some(0.0),
        Value::Real(v) => Some(v),
        Value::Integer(v) => Some(v as f64),
        Value::Text(text) => text.trim().parse::<f64>().ok(),
        Value::Blob(_) => None,
    };
    match value.filter(|v| v.is_finite()) {
        Some(v) => Ok(v),
        None => {
            unreadable.push(column.to_string());
            Ok(0.0)
        }
    }
}

/// Map one row. Rows with an unknown stage are skipped (`None`).
fn record_from_row(row: &Row) -> rusqlite::Result<Option<Record>> {
    let id: String = row.get(0)?;
    let stage_label: String = row.get(2)?;
    let stage = match Stage::parse(&stage_label) {
        Some(stage) => stage,
        None => {
            log::warn!("Skipping record {}: unknown stage '{}'", id, stage_label);
            return Ok(None);
        }
    };
    let source_label: String = row.get(3)?;
    let attendance: Option<String> = row.get(13)?;
    let type_of_deal: Option<String> = row.get(14)?;
    let relevance: Option<String> = row.get(15)?;

    let mut unreadable_columns = Vec::new();
    let expected_mrr = read_money(row, 8, "expected_mrr", &mut unreadable_columns)?;
    let expected_arr = read_money(row, 9, "expected_arr", &mut unreadable_columns)?;
    let pipeline_value = read_money(row, 10, "pipeline_value", &mut unreadable_columns)?;
    if !unreadable_columns.is_empty() {
        log::warn!("Record {} has unreadable {}", id, unreadable_columns.join(", "));
    }

    Ok(Some(Record {
        client: row.get(1)?,
        stage,
        source_type: SourceType::from_str_lossy(&source_label),
        discovery_date: parse_date("discovery_date", row.get(4)?),
        poa_date: parse_date("poa_date", row.get(5)?),
        billing_start: parse_date("billing_start", row.get(6)?),
        closed_date: parse_date("closed_date", row.get(7)?),
        expected_mrr,
        expected_arr,
        pipeline_value,
        owner: row.get(11)?,
        bdr: row.get(12)?,
        attendance: attendance.as_deref().and_then(Attendance::parse),
        type_of_deal: type_of_deal.as_deref().and_then(DealType::parse),
        relevance: relevance.as_deref().and_then(Relevance::parse),
        partner: row.get::<_, Option<String>>(16)?.filter(|p| !p.trim().is_empty()),
        unreadable_columns,
        id,
    }))
}

impl RecordSource for SqliteStore {
    fn fetch_records(
        &self,
        view_id: &str,
        stage_filter: Option<&[Stage]>,
        date_range: Option<DateRange>,
    ) -> Result<Vec<Record>, StoreError> {
        let mut sql = format!("SELECT {} FROM pipeline_records WHERE view_id = ?", RECORD_COLUMNS);
        let mut args: Vec<String> = vec![view_id.to_string()];

        if let Some(stages) = stage_filter {
            if stages.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; stages.len()].join(", ");
            sql.push_str(&format!(" AND stage IN ({})", placeholders));
            args.extend(stages.iter().map(|s| s.as_str().to_string()));
        }
        if let Some(range) = date_range {
            sql.push_str(" AND discovery_date >= ? AND discovery_date < ?");
            args.push(format_date(range.start));
            args.push(format_date(range.end));
        }
        sql.push_str(" ORDER BY id");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), record_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            if let Some(record) = row? {
                records.push(record);
            }
        }
        log::debug!("Fetched {} records for view {}", records.len(), view_id);
        Ok(records)
    }

    fn resolve_view_membership(&self, view_id: &str) -> Result<Vec<ViewId>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT member_view_id FROM view_members
             WHERE master_view_id = ?1
             ORDER BY position, member_view_id",
        )?;
        let members = stmt
            .query_map(params![view_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }
}

impl TargetSource for SqliteStore {
    fn fetch_target_config(&self, view_id: &str) -> Result<TargetConfig, StoreError> {
        let conn = self.conn.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT config_json FROM view_targets WHERE view_id = ?1",
                params![view_id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(parse_target_config(view_id, &json)),
            None => {
                log::debug!("No target config for view {}, using defaults", view_id);
                Ok(TargetConfig::default())
            }
        }
    }
}

/// Parse a stored target document. A category with an unusable value falls
/// back to its default instead of failing every report for the view.
fn parse_target_config(view_id: &str, json: &str) -> TargetConfig {
    let err = match serde_json::from_str::<TargetConfig>(json) {
        Ok(config) => return config,
        Err(e) => e,
    };
    let Ok(serde_json::Value::Object(doc)) = serde_json::from_str::<serde_json::Value>(json) else {
        log::warn!("Target config for view {} is not a JSON object ({}), using defaults", view_id, err);
        return TargetConfig::default();
    };

    let mut accepted = serde_json::Map::new();
    for (key, value) in doc {
        let mut candidate = accepted.clone();
        candidate.insert(key.clone(), value);
        match serde_json::from_value::<TargetConfig>(serde_json::Value::Object(candidate.clone())) {
            Ok(_) => accepted = candidate,
            Err(e) => log::warn!(
                "Target config for view {}: ignoring '{}' ({}), using its default",
                view_id,
                key,
                e
            ),
        }
    }
    serde_json::from_value(serde_json::Value::Object(accepted)).unwrap_or_default()
}
