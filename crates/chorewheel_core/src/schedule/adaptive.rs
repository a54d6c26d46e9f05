//! History-driven due date estimation.
//!
//! # Responsibility
//! - Predict the next due date from the spacing of recent completions.
//!
//! # Invariants
//! - At most [`ADAPTIVE_HISTORY_LIMIT`] entries are considered.
//! - The predicted interval never drops below [`MIN_INTERVAL_MS`].
//! - Pure: history retrieval is the orchestrator's responsibility.

use crate::model::history::HistoryEntry;
use chrono::{DateTime, Duration, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of newest history entries the estimator looks at.
pub const ADAPTIVE_HISTORY_LIMIT: usize = 5;

/// Interval used when history holds fewer than two completions.
pub const DEFAULT_INTERVAL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Floor for the predicted interval, so rapid back-to-back completions never
/// make a chore immediately due again.
pub const MIN_INTERVAL_MS: i64 = 60 * 60 * 1000;

/// History that cannot yield an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateError {
    /// Entries were not supplied newest-first.
    UnorderedHistory {
        newer: DateTime<Utc>,
        older: DateTime<Utc>,
    },
}

impl Display for EstimateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnorderedHistory { newer, older } => write!(
                f,
                "history entries out of order: {newer} listed before {older}"
            ),
        }
    }
}

impl Error for EstimateError {}

/// Predicts the next due date from recent completion spacing.
///
/// `recent_history` must be ordered newest first. Intervals between
/// consecutive completions are averaged with linearly decaying weights, the
/// newest interval counting the most.
///
/// # Contract
/// - Fewer than two entries: falls back to [`DEFAULT_INTERVAL_MS`].
/// - The returned date is always at least [`MIN_INTERVAL_MS`] after
///   `completed_at`.
///
/// # Errors
/// - `UnorderedHistory` when a supposedly newer entry predates its neighbor.
pub fn estimate_next_due(
    completed_at: DateTime<Utc>,
    recent_history: &[HistoryEntry],
) -> Result<DateTime<Utc>, EstimateError> {
    let window = &recent_history[..recent_history.len().min(ADAPTIVE_HISTORY_LIMIT)];

    let mut intervals_ms = Vec::with_capacity(window.len().saturating_sub(1));
    for pair in window.windows(2) {
        let newer = pair[0].completed_at;
        let older = pair[1].completed_at;
        let delta = newer.signed_duration_since(older);
        if delta < Duration::zero() {
            return Err(EstimateError::UnorderedHistory { newer, older });
        }
        intervals_ms.push(delta.num_milliseconds());
    }

    let interval_ms = if intervals_ms.is_empty() {
        DEFAULT_INTERVAL_MS
    } else {
        weighted_mean_ms(&intervals_ms)
    };

    Ok(completed_at + Duration::milliseconds(interval_ms.max(MIN_INTERVAL_MS)))
}

/// Weighted mean with linear age decay: the i-th newest of n intervals gets
/// weight n - i.
fn weighted_mean_ms(intervals_ms: &[i64]) -> i64 {
    let n = intervals_ms.len() as i64;
    let mut weighted_sum = 0i64;
    let mut weight_total = 0i64;
    for (age, &interval) in intervals_ms.iter().enumerate() {
        let weight = n - age as i64;
        weighted_sum += interval * weight;
        weight_total += weight;
    }
    weighted_sum / weight_total
}
