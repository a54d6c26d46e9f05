//! Core domain logic for Chorewheel.
//! This crate is the single source of truth for completion-transition
//! invariants: window validation, due date scheduling, assignee rotation and
//! the atomic commit that records them.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::chore::{
    AssignStrategy, Chore, ChoreId, ChoreValidationError, Frequency, FrequencyError, IntervalUnit,
    UserId,
};
pub use model::history::HistoryEntry;
pub use repo::chore_repo::{ChoreRepository, RepoError, RepoResult, SqliteChoreRepository};
pub use repo::history_repo::{HistoryRepository, SqliteHistoryRepository};
pub use schedule::adaptive::{estimate_next_due, EstimateError, ADAPTIVE_HISTORY_LIMIT};
pub use schedule::recurrence::next_occurrence;
pub use schedule::rotation::{next_assignee, Rotation, ROTATION_HISTORY_LIMIT};
pub use schedule::window::{check_completion_window, WindowViolation};
pub use service::completion_service::{CompleteChoreRequest, CompletionError, CompletionService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
