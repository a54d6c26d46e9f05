//! Completion history record.
//!
//! # Responsibility
//! - Capture one completed occurrence of a chore.
//!
//! # Invariants
//! - History is append-only; the core never mutates or deletes entries.
//! - Entries are ordered by `completed_at`, newest first when queried with a
//!   limit.

use crate::model::chore::{ChoreId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable record of one completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub chore_id: ChoreId,
    /// Due date the chore carried when this completion happened.
    pub due_date_at_completion: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
    pub completed_by: UserId,
}

impl HistoryEntry {
    /// Builds the record for a completion event.
    pub fn new(
        chore_id: ChoreId,
        due_date_at_completion: Option<DateTime<Utc>>,
        completed_at: DateTime<Utc>,
        completed_by: impl Into<UserId>,
    ) -> Self {
        Self {
            chore_id,
            due_date_at_completion,
            completed_at,
            completed_by: completed_by.into(),
        }
    }
}
