//! Chore domain model.
//!
//! # Responsibility
//! - Define the canonical chore record shared by scheduling and rotation.
//! - Express recurrence configuration as a closed tagged variant with
//!   per-variant required fields.
//! - Provide validation helpers enforced on every persistence boundary.
//!
//! # Invariants
//! - `id` is stable and never reused for another chore.
//! - `next_due_date == None` means the chore has no further occurrence.
//! - `rotation_cursor` indexes `assignees` whenever the roster is non-empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a chore.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ChoreId = Uuid;

/// Identifier of a roster member, resolved by an external identity layer.
///
/// The core trusts resolved ids and never re-validates them.
pub type UserId = String;

/// Unit for `Frequency::Interval` spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Hours,
    Days,
    Weeks,
}

/// Recurrence policy for a chore.
///
/// Loosely-typed configuration (JSON from storage or an outer API) decodes
/// into this closed variant and is checked by [`Frequency::validate`] before
/// any scheduling decision depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frequency {
    /// Single occurrence; completion clears the due date.
    Once,
    Daily,
    Weekly,
    /// Same day-of-month next month, clamped to the month's length.
    Monthly,
    /// Same month/day next year; Feb 29 clamps to Feb 28 off-leap.
    Yearly,
    /// Fixed spacing of `every` × `unit` from the completion anchor.
    Interval { every: u32, unit: IntervalUnit },
    /// Next date whose weekday is in `days` (1 = Monday .. 7 = Sunday).
    DaysOfWeek { days: BTreeSet<u8> },
    /// Next date matching `day`, rolling months with end-of-month clamping.
    DayOfMonth { day: u8 },
    /// Due date derived from observed completion intervals.
    Adaptive,
}

/// Rejected recurrence configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyError {
    /// `Interval.every` must be at least 1.
    ZeroInterval,
    /// `DaysOfWeek.days` must name at least one weekday.
    EmptyWeekdaySet,
    /// Weekday numbers are ISO, 1 = Monday through 7 = Sunday.
    WeekdayOutOfRange(u8),
    /// Day-of-month must be in 1..=31.
    DayOfMonthOutOfRange(u8),
    /// Adaptive chores are scheduled from history, not a calendar rule.
    AdaptiveRequiresHistory,
}

impl Display for FrequencyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "interval count must be at least 1"),
            Self::EmptyWeekdaySet => write!(f, "weekday set cannot be empty"),
            Self::WeekdayOutOfRange(day) => {
                write!(f, "weekday {day} out of range; expected 1 (Mon) ..= 7 (Sun)")
            }
            Self::DayOfMonthOutOfRange(day) => {
                write!(f, "day of month {day} out of range; expected 1 ..= 31")
            }
            Self::AdaptiveRequiresHistory => {
                write!(f, "adaptive frequency has no fixed calendar rule")
            }
        }
    }
}

impl Error for FrequencyError {}

impl Frequency {
    /// Checks variant-specific required fields.
    ///
    /// # Errors
    /// - Returns the first violated constraint for malformed configuration.
    pub fn validate(&self) -> Result<(), FrequencyError> {
        match self {
            Self::Interval { every: 0, .. } => Err(FrequencyError::ZeroInterval),
            Self::DaysOfWeek { days } => {
                if days.is_empty() {
                    return Err(FrequencyError::EmptyWeekdaySet);
                }
                for &day in days {
                    if !(1..=7).contains(&day) {
                        return Err(FrequencyError::WeekdayOutOfRange(day));
                    }
                }
                Ok(())
            }
            Self::DayOfMonth { day } => {
                if (1..=31).contains(day) {
                    Ok(())
                } else {
                    Err(FrequencyError::DayOfMonthOutOfRange(*day))
                }
            }
            _ => Ok(()),
        }
    }

    /// Returns whether scheduling consults completion history.
    pub fn is_adaptive(&self) -> bool {
        matches!(self, Self::Adaptive)
    }
}

/// Strategy used to pick the next responsible assignee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignStrategy {
    /// Walk the roster in order, starting after the completer.
    RoundRobin,
    /// Pick the roster member with the oldest (or no) recent completion.
    LeastRecentlyDone,
    /// Pick uniformly, excluding the completer on multi-member rosters.
    Random,
}

/// Canonical chore record.
///
/// Mutated only through the completion orchestrator's atomic transition,
/// which advances `next_due_date` and `rotation_cursor` together with one
/// appended history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chore {
    /// Stable global ID used for linking, locking and auditing.
    pub id: ChoreId,
    /// Human-readable label; not interpreted by the core.
    pub name: String,
    pub frequency: Frequency,
    /// Next scheduled occurrence; `None` once a one-shot chore is done.
    pub next_due_date: Option<DateTime<Utc>>,
    /// Hours after the due date during which completion is still valid.
    /// `None` means unbounded.
    pub completion_window_hours: Option<u32>,
    /// Ordered roster; insertion order is the rotation order.
    pub assignees: Vec<UserId>,
    pub assign_strategy: AssignStrategy,
    /// Index of the currently responsible roster member.
    pub rotation_cursor: usize,
}

/// Rejected chore state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoreValidationError {
    NilId,
    Frequency(FrequencyError),
    CursorOutOfRange { cursor: usize, roster_len: usize },
}

impl Display for ChoreValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "chore id cannot be the nil uuid"),
            Self::Frequency(err) => write!(f, "{err}"),
            Self::CursorOutOfRange { cursor, roster_len } => write!(
                f,
                "rotation cursor {cursor} out of range for roster of {roster_len}"
            ),
        }
    }
}

impl Error for ChoreValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Frequency(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FrequencyError> for ChoreValidationError {
    fn from(value: FrequencyError) -> Self {
        Self::Frequency(value)
    }
}

impl Chore {
    /// Creates a chore with a generated stable ID and round-robin rotation.
    ///
    /// # Invariants
    /// - The roster starts empty and the cursor at 0.
    /// - The provided frequency is not validated here; persistence
    ///   boundaries call [`Chore::validate`].
    pub fn new(
        name: impl Into<String>,
        frequency: Frequency,
        next_due_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            frequency,
            next_due_date,
            completion_window_hours: None,
            assignees: Vec::new(),
            assign_strategy: AssignStrategy::RoundRobin,
            rotation_cursor: 0,
        }
    }

    /// Creates a chore with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    ///
    /// # Errors
    /// - Returns `NilId` for the nil uuid.
    pub fn with_id(
        id: ChoreId,
        name: impl Into<String>,
        frequency: Frequency,
        next_due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ChoreValidationError> {
        if id.is_nil() {
            return Err(ChoreValidationError::NilId);
        }
        let mut chore = Self::new(name, frequency, next_due_date);
        chore.id = id;
        Ok(chore)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    /// - `NilId` for a nil identity.
    /// - `Frequency` for malformed recurrence configuration.
    /// - `CursorOutOfRange` when the cursor points past a non-empty roster.
    pub fn validate(&self) -> Result<(), ChoreValidationError> {
        if self.id.is_nil() {
            return Err(ChoreValidationError::NilId);
        }
        self.frequency.validate()?;
        if !self.assignees.is_empty() && self.rotation_cursor >= self.assignees.len() {
            return Err(ChoreValidationError::CursorOutOfRange {
                cursor: self.rotation_cursor,
                roster_len: self.assignees.len(),
            });
        }
        Ok(())
    }

    /// Returns the currently responsible roster member, if any.
    pub fn current_assignee(&self) -> Option<&UserId> {
        self.assignees.get(self.rotation_cursor)
    }
}
