//! Assignee rotation.
//!
//! # Responsibility
//! - Pick the next responsible roster member after a completion.
//!
//! # Invariants
//! - Infallible: every roster state yields a rotation outcome.
//! - An empty roster degrades to "unassigned"; it is a valid terminal state.
//! - The returned cursor always indexes the roster when it is non-empty.

use crate::model::chore::{AssignStrategy, UserId};
use crate::model::history::HistoryEntry;
use chrono::{DateTime, Utc};
use rand::Rng;

/// Upper bound on the history window consulted by least-recently-done.
pub const ROTATION_HISTORY_LIMIT: usize = 50;

/// Outcome of one rotation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    pub next_assignee: Option<UserId>,
    /// New value for the chore's rotation cursor.
    pub cursor: usize,
}

/// Computes the next responsible assignee.
///
/// `recent_history` is only consulted by `LeastRecentlyDone`; other
/// strategies accept an empty slice.
///
/// # Contract
/// - Empty roster: unassigned, cursor reset to 0.
/// - Single-member roster: that member, regardless of strategy.
/// - Round-robin: the member after the completer in roster order; when the
///   completer has left the roster, advance from the stored cursor instead,
///   so rotation self-heals after roster edits.
/// - Least-recently-done: the member with the oldest (or no) completion in
///   the supplied window, the completer ranking as most recent; ties broken
///   by roster order.
/// - Random: uniform over the roster excluding the completer.
pub fn next_assignee(
    assignees: &[UserId],
    rotation_cursor: usize,
    completed_by: &str,
    strategy: AssignStrategy,
    recent_history: &[HistoryEntry],
) -> Rotation {
    if assignees.is_empty() {
        return Rotation {
            next_assignee: None,
            cursor: 0,
        };
    }
    if assignees.len() == 1 {
        return Rotation {
            next_assignee: Some(assignees[0].clone()),
            cursor: 0,
        };
    }

    let cursor = match strategy {
        AssignStrategy::RoundRobin => match assignees.iter().position(|a| a == completed_by) {
            Some(index) => (index + 1) % assignees.len(),
            None => (rotation_cursor + 1) % assignees.len(),
        },
        AssignStrategy::LeastRecentlyDone => {
            least_recently_done(assignees, completed_by, recent_history)
        }
        AssignStrategy::Random => {
            let candidates: Vec<usize> = (0..assignees.len())
                .filter(|&index| assignees[index] != completed_by)
                .collect();
            match candidates.as_slice() {
                // Roster of duplicates of the completer; nobody else to pick.
                [] => rotation_cursor % assignees.len(),
                _ => candidates[rand::thread_rng().gen_range(0..candidates.len())],
            }
        }
    };

    Rotation {
        next_assignee: Some(assignees[cursor].clone()),
        cursor,
    }
}

fn least_recently_done(
    assignees: &[UserId],
    completed_by: &str,
    recent_history: &[HistoryEntry],
) -> usize {
    let mut best_index = 0;
    let mut best_latest = latest_completion(&assignees[0], completed_by, recent_history);

    for (index, assignee) in assignees.iter().enumerate().skip(1) {
        let latest = latest_completion(assignee, completed_by, recent_history);
        if is_staler(latest, best_latest) {
            best_index = index;
            best_latest = latest;
        }
    }

    best_index
}

fn latest_completion(
    assignee: &str,
    completed_by: &str,
    history: &[HistoryEntry],
) -> Option<DateTime<Utc>> {
    // The in-flight completion is not yet in history; the completer counts
    // as most recent.
    if assignee == completed_by {
        return Some(DateTime::<Utc>::MAX_UTC);
    }
    history
        .iter()
        .filter(|entry| entry.completed_by == assignee)
        .map(|entry| entry.completed_at)
        .max()
}

/// Strictly staler wins, so roster order breaks ties.
fn is_staler(candidate: Option<DateTime<Utc>>, best: Option<DateTime<Utc>>) -> bool {
    match (candidate, best) {
        (None, Some(_)) => true,
        (Some(candidate), Some(best)) => candidate < best,
        _ => false,
    }
}
