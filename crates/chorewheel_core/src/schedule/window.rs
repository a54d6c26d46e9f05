//! Completion window validation.
//!
//! # Responsibility
//! - Decide whether a completion timestamp falls inside the allowed window.
//!
//! # Invariants
//! - The window boundary is inclusive.
//! - No configured window, or no due date on record, means any timestamp is
//!   valid.

use chrono::{DateTime, Duration, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Completion attempted after the window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowViolation {
    /// Last instant at which completion was still valid.
    pub deadline: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl Display for WindowViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "completion at {} is past the window deadline {}",
            self.completed_at, self.deadline
        )
    }
}

impl Error for WindowViolation {}

/// Checks `completed_at` against the chore's completion window.
///
/// # Contract
/// - Valid iff `completed_at <= next_due + window_hours`; the boundary
///   instant itself is accepted.
/// - Unconfigured window or absent due date: always valid.
pub fn check_completion_window(
    next_due: Option<DateTime<Utc>>,
    window_hours: Option<u32>,
    completed_at: DateTime<Utc>,
) -> Result<(), WindowViolation> {
    let (Some(due), Some(hours)) = (next_due, window_hours) else {
        return Ok(());
    };

    let deadline = due + Duration::hours(i64::from(hours));
    if completed_at <= deadline {
        Ok(())
    } else {
        Err(WindowViolation {
            deadline,
            completed_at,
        })
    }
}
