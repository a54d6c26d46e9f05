//! Chore repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable read/write APIs over canonical `chores` storage.
//! - Commit the completion transition (due date, cursor, history row) as one
//!   atomic unit.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Chore::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - `complete_atomic` is guarded by the snapshot's due date, so a stale
//!   read loses the race instead of silently overwriting a newer schedule.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::chore::{AssignStrategy, Chore, ChoreId, ChoreValidationError, Frequency};
use crate::model::history::HistoryEntry;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CHORE_SELECT_SQL: &str = "SELECT
    id,
    name,
    frequency,
    next_due_date,
    completion_window_hours,
    assignees,
    assign_strategy,
    rotation_cursor
FROM chores";

const REQUIRED_CHORE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "frequency",
    "next_due_date",
    "completion_window_hours",
    "assignees",
    "assign_strategy",
    "rotation_cursor",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for chore persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ChoreValidationError),
    Db(DbError),
    NotFound(ChoreId),
    /// A concurrent completion committed first; the caller read a stale
    /// snapshot.
    Conflict(ChoreId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "chore not found: {id}"),
            Self::Conflict(id) => write!(f, "concurrent completion committed first for chore: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted chore data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} behind required {expected_version}; open connections via open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table: {table}"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column: {table}.{column}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChoreValidationError> for RepoError {
    fn from(value: ChoreValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for chore state.
///
/// `create_chore` exists for external editing collaborators and tests; the
/// completion core itself only reads chores and commits transitions.
pub trait ChoreRepository {
    fn create_chore(&self, chore: &Chore) -> RepoResult<ChoreId>;
    fn get_chore(&self, id: ChoreId) -> RepoResult<Option<Chore>>;
    /// Lists all chores, dated ones first by due date, undated last.
    fn list_chores(&self) -> RepoResult<Vec<Chore>>;
    /// Atomically advances the chore and appends one history row.
    ///
    /// The update is guarded by `snapshot.next_due_date`; if another
    /// completion committed in between, the guard misses and the whole
    /// transition fails with [`RepoError::Conflict`], leaving storage
    /// untouched. Returns the refreshed chore.
    fn complete_atomic(
        &self,
        snapshot: &Chore,
        new_next_due: Option<DateTime<Utc>>,
        new_cursor: usize,
        entry: &HistoryEntry,
    ) -> RepoResult<Chore>;
}

/// SQLite-backed chore repository.
pub struct SqliteChoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChoreRepository<'conn> {
    /// Wraps a connection after verifying it carries the expected schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` for partial schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        ensure_table(conn, "chores")?;
        for column in REQUIRED_CHORE_COLUMNS {
            ensure_column(conn, "chores", column)?;
        }
        Ok(Self { conn })
    }
}

impl ChoreRepository for SqliteChoreRepository<'_> {
    fn create_chore(&self, chore: &Chore) -> RepoResult<ChoreId> {
        chore.validate()?;

        self.conn.execute(
            "INSERT INTO chores (
                id,
                name,
                frequency,
                next_due_date,
                completion_window_hours,
                assignees,
                assign_strategy,
                rotation_cursor
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                chore.id.to_string(),
                chore.name.as_str(),
                frequency_to_db(&chore.frequency)?,
                chore.next_due_date.map(datetime_to_ms),
                chore.completion_window_hours,
                assignees_to_db(&chore.assignees)?,
                assign_strategy_to_db(chore.assign_strategy),
                chore.rotation_cursor as i64,
            ],
        )?;

        Ok(chore.id)
    }

    fn get_chore(&self, id: ChoreId) -> RepoResult<Option<Chore>> {
        fetch_chore(self.conn, id)
    }

    fn list_chores(&self) -> RepoResult<Vec<Chore>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHORE_SELECT_SQL}
             ORDER BY next_due_date IS NULL, next_due_date ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut chores = Vec::new();
        while let Some(row) = rows.next()? {
            chores.push(parse_chore_row(row)?);
        }

        Ok(chores)
    }

    fn complete_atomic(
        &self,
        snapshot: &Chore,
        new_next_due: Option<DateTime<Utc>>,
        new_cursor: usize,
        entry: &HistoryEntry,
    ) -> RepoResult<Chore> {
        if entry.chore_id != snapshot.id {
            return Err(RepoError::InvalidData(format!(
                "history entry chore id {} does not match chore {}",
                entry.chore_id, snapshot.id
            )));
        }
        if !snapshot.assignees.is_empty() && new_cursor >= snapshot.assignees.len() {
            return Err(RepoError::Validation(
                ChoreValidationError::CursorOutOfRange {
                    cursor: new_cursor,
                    roster_len: snapshot.assignees.len(),
                },
            ));
        }

        let tx = self.conn.unchecked_transaction()?;

        // `IS` instead of `=` so a NULL due date still guards correctly.
        let changed = tx.execute(
            "UPDATE chores
             SET
                next_due_date = ?1,
                rotation_cursor = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3 AND next_due_date IS ?4;",
            params![
                new_next_due.map(datetime_to_ms),
                new_cursor as i64,
                snapshot.id.to_string(),
                snapshot.next_due_date.map(datetime_to_ms),
            ],
        )?;

        if changed == 0 {
            let exists: i64 = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM chores WHERE id = ?1);",
                [snapshot.id.to_string()],
                |row| row.get(0),
            )?;
            return Err(if exists == 1 {
                RepoError::Conflict(snapshot.id)
            } else {
                RepoError::NotFound(snapshot.id)
            });
        }

        tx.execute(
            "INSERT INTO chore_history (
                chore_id,
                due_date_at_completion,
                completed_at,
                completed_by
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                entry.chore_id.to_string(),
                entry.due_date_at_completion.map(datetime_to_ms),
                datetime_to_ms(entry.completed_at),
                entry.completed_by.as_str(),
            ],
        )?;

        let updated =
            fetch_chore(&tx, snapshot.id)?.ok_or(RepoError::NotFound(snapshot.id))?;
        tx.commit()?;

        Ok(updated)
    }
}

fn fetch_chore(conn: &Connection, id: ChoreId) -> RepoResult<Option<Chore>> {
    let mut stmt = conn.prepare(&format!("{CHORE_SELECT_SQL} WHERE id = ?1;"))?;

    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_chore_row(row)?));
    }

    Ok(None)
}

fn parse_chore_row(row: &Row<'_>) -> RepoResult<Chore> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in chores.id"))
    })?;

    let frequency_json: String = row.get("frequency")?;
    let frequency: Frequency = serde_json::from_str(&frequency_json).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid frequency `{frequency_json}` in chores.frequency: {err}"
        ))
    })?;

    let assignees_json: String = row.get("assignees")?;
    let assignees: Vec<String> = serde_json::from_str(&assignees_json).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid roster `{assignees_json}` in chores.assignees: {err}"
        ))
    })?;

    let strategy_text: String = row.get("assign_strategy")?;
    let assign_strategy = parse_assign_strategy(&strategy_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid strategy `{strategy_text}` in chores.assign_strategy"
        ))
    })?;

    let cursor_raw: i64 = row.get("rotation_cursor")?;
    let rotation_cursor = usize::try_from(cursor_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid rotation cursor `{cursor_raw}` in chores.rotation_cursor"
        ))
    })?;

    let window_raw: Option<i64> = row.get("completion_window_hours")?;
    let completion_window_hours = window_raw
        .map(|value| {
            u32::try_from(value).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid completion window `{value}` in chores.completion_window_hours"
                ))
            })
        })
        .transpose()?;

    let next_due_date = row
        .get::<_, Option<i64>>("next_due_date")?
        .map(|ms| ms_to_datetime(ms, "chores.next_due_date"))
        .transpose()?;

    let chore = Chore {
        id,
        name: row.get("name")?,
        frequency,
        next_due_date,
        completion_window_hours,
        assignees,
        assign_strategy,
        rotation_cursor,
    };
    chore.validate()?;
    Ok(chore)
}

fn frequency_to_db(frequency: &Frequency) -> RepoResult<String> {
    serde_json::to_string(frequency)
        .map_err(|err| RepoError::InvalidData(format!("unserializable frequency: {err}")))
}

fn assignees_to_db(assignees: &[String]) -> RepoResult<String> {
    serde_json::to_string(assignees)
        .map_err(|err| RepoError::InvalidData(format!("unserializable roster: {err}")))
}

fn assign_strategy_to_db(strategy: AssignStrategy) -> &'static str {
    match strategy {
        AssignStrategy::RoundRobin => "round_robin",
        AssignStrategy::LeastRecentlyDone => "least_recently_done",
        AssignStrategy::Random => "random",
    }
}

fn parse_assign_strategy(value: &str) -> Option<AssignStrategy> {
    match value {
        "round_robin" => Some(AssignStrategy::RoundRobin),
        "least_recently_done" => Some(AssignStrategy::LeastRecentlyDone),
        "random" => Some(AssignStrategy::Random),
        _ => None,
    }
}

pub(crate) fn datetime_to_ms(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn ms_to_datetime(ms: i64, context: &str) -> RepoResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{ms}` in {context}")))
}

pub(crate) fn ensure_migrated(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn ensure_table(conn: &Connection, table: &'static str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::MissingRequiredTable(table))
    }
}

pub(crate) fn ensure_column(
    conn: &Connection,
    table: &'static str,
    column: &'static str,
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM pragma_table_info(?1)
            WHERE name = ?2
        );",
        [table, column],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::MissingRequiredColumn { table, column })
    }
}
