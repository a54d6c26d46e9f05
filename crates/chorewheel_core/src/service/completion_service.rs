//! Chore completion orchestration.
//!
//! # Responsibility
//! - Drive one completion event through validation, scheduling, rotation and
//!   the atomic repository commit.
//! - Map layer errors into the caller-facing completion taxonomy.
//!
//! # Invariants
//! - A failed completion leaves chore and history state unmodified; the
//!   repository commit is all-or-nothing.
//! - The due date sequence of a chore never moves backwards.
//! - History passed to the estimator excludes the completion being recorded.

use crate::model::chore::{
    AssignStrategy, Chore, ChoreId, ChoreValidationError, FrequencyError, UserId,
};
use crate::model::history::HistoryEntry;
use crate::repo::chore_repo::{ChoreRepository, RepoError, RepoResult};
use crate::repo::history_repo::HistoryRepository;
use crate::schedule::adaptive::{estimate_next_due, EstimateError, ADAPTIVE_HISTORY_LIMIT};
use crate::schedule::recurrence::next_occurrence;
use crate::schedule::rotation::{next_assignee, ROTATION_HISTORY_LIMIT};
use crate::schedule::window::check_completion_window;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One completion event, with the completer already resolved by the identity
/// layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteChoreRequest {
    pub chore_id: ChoreId,
    pub completed_by: UserId,
    pub completed_at: DateTime<Utc>,
}

/// Caller-facing completion failure taxonomy.
///
/// Outer layers map these onto transport-specific status codes.
#[derive(Debug)]
pub enum CompletionError {
    NotFound(ChoreId),
    /// Completion attempted after the allowed window closed.
    OutOfWindow {
        chore_id: ChoreId,
        deadline: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Malformed or unrecognized recurrence configuration.
    InvalidFrequency(FrequencyError),
    /// The estimator could not derive a due date from otherwise-valid input.
    SchedulingFailure(EstimateError),
    /// A concurrent completion committed first.
    Conflict(ChoreId),
    /// Storage failure unrelated to business rules.
    Repo(RepoError),
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "chore not found: {id}"),
            Self::OutOfWindow {
                chore_id,
                deadline,
                completed_at,
            } => write!(
                f,
                "completion of chore {chore_id} at {completed_at} is past the window deadline {deadline}"
            ),
            Self::InvalidFrequency(err) => {
                write!(f, "invalid recurrence configuration: {err}")
            }
            Self::SchedulingFailure(err) => {
                write!(f, "could not schedule the next due date: {err}")
            }
            Self::Conflict(id) => {
                write!(f, "chore {id} was completed concurrently; retry with fresh state")
            }
            // Storage detail stays out of the caller-facing message; the
            // error chain keeps it available for diagnostics.
            Self::Repo(_) => write!(f, "internal storage failure"),
        }
    }
}

impl Error for CompletionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFrequency(err) => Some(err),
            Self::SchedulingFailure(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FrequencyError> for CompletionError {
    fn from(value: FrequencyError) -> Self {
        Self::InvalidFrequency(value)
    }
}

impl From<EstimateError> for CompletionError {
    fn from(value: EstimateError) -> Self {
        Self::SchedulingFailure(value)
    }
}

impl From<RepoError> for CompletionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Conflict(id) => Self::Conflict(id),
            // Malformed recurrence configuration is a correction-by-caller
            // problem wherever it is detected, including on a read-back.
            RepoError::Validation(ChoreValidationError::Frequency(err)) => {
                Self::InvalidFrequency(err)
            }
            other => Self::Repo(other),
        }
    }
}

/// Use-case service driving chore completion transitions.
pub struct CompletionService<C: ChoreRepository, H: HistoryRepository> {
    chores: C,
    history: H,
}

impl<C: ChoreRepository, H: HistoryRepository> CompletionService<C, H> {
    /// Creates a service using the provided repository implementations.
    pub fn new(chores: C, history: H) -> Self {
        Self { chores, history }
    }

    /// Completes a chore and returns the refreshed record.
    ///
    /// # Contract
    /// - Validates the completion window, computes the next due date
    ///   (recurrence rule or adaptive estimate anchored at the completion
    ///   timestamp), rotates the assignee, then commits chore update plus
    ///   one history entry atomically.
    /// - The new due date is floored at the previous one, so a far-early
    ///   completion keeps the original schedule instead of pulling it
    ///   backwards.
    ///
    /// # Errors
    /// - `NotFound`, `OutOfWindow`, `InvalidFrequency`, `Conflict` are
    ///   recoverable by the caller through correction or retry.
    /// - `SchedulingFailure` and `Repo` indicate corrupt history or storage
    ///   failure.
    pub fn complete_chore(&self, request: &CompleteChoreRequest) -> Result<Chore, CompletionError> {
        let result = self.transition(request);

        match &result {
            Ok(chore) => info!(
                "event=chore_complete module=service status=ok chore_id={} completed_by={} next_due={} next_assignee={}",
                chore.id,
                request.completed_by,
                format_due(chore.next_due_date),
                chore.current_assignee().map_or("none", String::as_str),
            ),
            Err(err) => warn!(
                "event=chore_complete module=service status={} chore_id={} completed_by={} reason={}",
                if matches!(err, CompletionError::SchedulingFailure(_) | CompletionError::Repo(_)) {
                    "error"
                } else {
                    "rejected"
                },
                request.chore_id,
                request.completed_by,
                err
            ),
        }

        result
    }

    fn transition(&self, request: &CompleteChoreRequest) -> Result<Chore, CompletionError> {
        let chore = self
            .chores
            .get_chore(request.chore_id)?
            .ok_or(CompletionError::NotFound(request.chore_id))?;

        check_completion_window(
            chore.next_due_date,
            chore.completion_window_hours,
            request.completed_at,
        )
        .map_err(|violation| CompletionError::OutOfWindow {
            chore_id: chore.id,
            deadline: violation.deadline,
            completed_at: violation.completed_at,
        })?;

        let computed_due = if chore.frequency.is_adaptive() {
            let recent = self.history.recent(chore.id, ADAPTIVE_HISTORY_LIMIT)?;
            Some(estimate_next_due(request.completed_at, &recent)?)
        } else {
            next_occurrence(&chore.frequency, request.completed_at)?
        };

        let new_next_due = match (computed_due, chore.next_due_date) {
            (Some(computed), Some(previous)) => Some(computed.max(previous)),
            (computed, _) => computed,
        };

        let recent_for_rotation = if chore.assign_strategy == AssignStrategy::LeastRecentlyDone {
            self.history.recent(chore.id, ROTATION_HISTORY_LIMIT)?
        } else {
            Vec::new()
        };
        let rotation = next_assignee(
            &chore.assignees,
            chore.rotation_cursor,
            &request.completed_by,
            chore.assign_strategy,
            &recent_for_rotation,
        );

        let entry = HistoryEntry::new(
            chore.id,
            chore.next_due_date,
            request.completed_at,
            request.completed_by.clone(),
        );

        let updated = self
            .chores
            .complete_atomic(&chore, new_next_due, rotation.cursor, &entry)?;
        Ok(updated)
    }

    /// Gets one chore by ID.
    pub fn get_chore(&self, id: ChoreId) -> RepoResult<Option<Chore>> {
        self.chores.get_chore(id)
    }

    /// Lists all chores, most urgent first.
    pub fn list_chores(&self) -> RepoResult<Vec<Chore>> {
        self.chores.list_chores()
    }

    /// Returns recent completions of a chore, newest first.
    pub fn recent_history(&self, id: ChoreId, limit: usize) -> RepoResult<Vec<HistoryEntry>> {
        self.history.recent(id, limit)
    }
}

fn format_due(due: Option<DateTime<Utc>>) -> String {
    due.map_or_else(|| "none".to_string(), |date| date.to_rfc3339())
}
