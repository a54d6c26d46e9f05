//! Completion history repository.
//!
//! # Responsibility
//! - Provide bounded, newest-first reads over `chore_history`.
//!
//! # Invariants
//! - Read-only: history rows are written exclusively inside the chore
//!   repository's atomic completion transition.
//! - Ordering is deterministic: `completed_at` descending, then insertion
//!   order descending.

use crate::model::chore::ChoreId;
use crate::model::history::HistoryEntry;
use crate::repo::chore_repo::{
    ensure_column, ensure_migrated, ensure_table, ms_to_datetime, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const HISTORY_SELECT_SQL: &str = "SELECT
    chore_id,
    due_date_at_completion,
    completed_at,
    completed_by
FROM chore_history";

const REQUIRED_HISTORY_COLUMNS: &[&str] = &[
    "chore_id",
    "due_date_at_completion",
    "completed_at",
    "completed_by",
];

/// Read interface over completion history.
pub trait HistoryRepository {
    /// Returns up to `limit` entries for the chore, newest first.
    fn recent(&self, chore_id: ChoreId, limit: usize) -> RepoResult<Vec<HistoryEntry>>;
}

/// SQLite-backed history repository.
pub struct SqliteHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHistoryRepository<'conn> {
    /// Wraps a connection after verifying it carries the expected schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        ensure_table(conn, "chore_history")?;
        for column in REQUIRED_HISTORY_COLUMNS {
            ensure_column(conn, "chore_history", column)?;
        }
        Ok(Self { conn })
    }
}

impl HistoryRepository for SqliteHistoryRepository<'_> {
    fn recent(&self, chore_id: ChoreId, limit: usize) -> RepoResult<Vec<HistoryEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "{HISTORY_SELECT_SQL}
             WHERE chore_id = ?1
             ORDER BY completed_at DESC, id DESC
             LIMIT ?2;"
        ))?;

        let mut rows = stmt.query(params![chore_id.to_string(), limit as i64])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_history_row(row)?);
        }

        Ok(entries)
    }
}

fn parse_history_row(row: &Row<'_>) -> RepoResult<HistoryEntry> {
    let chore_id_text: String = row.get("chore_id")?;
    let chore_id = Uuid::parse_str(&chore_id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{chore_id_text}` in chore_history.chore_id"
        ))
    })?;

    let due_date_at_completion = row
        .get::<_, Option<i64>>("due_date_at_completion")?
        .map(|ms| ms_to_datetime(ms, "chore_history.due_date_at_completion"))
        .transpose()?;

    let completed_at = ms_to_datetime(
        row.get::<_, i64>("completed_at")?,
        "chore_history.completed_at",
    )?;

    Ok(HistoryEntry {
        chore_id,
        due_date_at_completion,
        completed_at,
        completed_by: row.get("completed_by")?,
    })
}
