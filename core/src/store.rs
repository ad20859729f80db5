//! SQLite persistence for the prediction audit log.
//!
//! RULE: Only store.rs talks to the database.

use crate::{
    audit::{PredictionRecord, PredictionSink},
    error::ChurnResult,
};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// Columns added after the first schema, with their SQL types.
const LATE_COLUMNS: &[(&str, &str)] = &[
    ("prediction_id", "TEXT"),
    ("total_charges", "REAL"),
    ("notes", "TEXT"),
];

/// One stored prediction, as read back for display.
/// Risk and timestamp stay as stored text: older rows use other formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub prediction_id: Option<String>,
    pub username:      String,
    pub probability:   f64,
    pub risk:          String,
    pub created_at:    String,
    pub total_charges: Option<f64>,
    pub notes:         Option<String>,
}

pub struct AuditStore {
    conn: Connection,
}

impl AuditStore {
    /// Open (or create) the audit database at `path`.
    pub fn open(path: &str) -> ChurnResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ChurnResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply the schema, then add any late columns an older table lacks.
    pub fn migrate(&self) -> ChurnResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_predictions.sql"))?;

        let existing = self.columns("predictions")?;
        for (name, sql_type) in LATE_COLUMNS {
            if !existing.iter().any(|c| c == name) {
                log::info!("store: adding column predictions.{name}");
                self.conn.execute_batch(&format!(
                    "ALTER TABLE predictions ADD COLUMN {name} {sql_type};"
                ))?;
            }
        }
        Ok(())
    }

    fn columns(&self, table: &str) -> ChurnResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    // ── Read side (runner only) ────────────────────────────────

    /// Most recent predictions for `username`, newest first.
    pub fn history_for(&self, username: &str, limit: usize) -> ChurnResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT prediction_id, username, churn_probability, risk, created_at,
                    total_charges, notes
             FROM predictions WHERE username = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![username, limit as i64], |row| {
            Ok(HistoryEntry {
                prediction_id: row.get(0)?,
                username:      row.get(1)?,
                probability:   row.get(2)?,
                risk:          row.get(3)?,
                created_at:    row.get(4)?,
                total_charges: row.get(5)?,
                notes:         row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn prediction_count(&self, username: &str) -> ChurnResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM predictions WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

impl PredictionSink for AuditStore {
    fn record(&self, record: &PredictionRecord) -> ChurnResult<()> {
        self.conn.execute(
            "INSERT INTO predictions (
                prediction_id, username, churn_probability, risk, created_at,
                total_charges, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.prediction_id,
                record.user_id,
                record.probability,
                record.risk.label(),
                record.created_at.to_rfc3339(),
                record.total_charges,
                record.notes,
            ],
        )?;
        Ok(())
    }
}
