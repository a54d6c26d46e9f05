//! Fixed-frequency recurrence rules.
//!
//! # Responsibility
//! - Compute the next due date for every calendar-driven frequency.
//!
//! # Invariants
//! - Results are strictly after the anchor for every recurring policy.
//! - Month arithmetic clamps to the target month's length (Jan 31 rolls to
//!   Feb 28, or Feb 29 in a leap year).
//! - Never consults history or storage.

use crate::model::chore::{Frequency, FrequencyError, IntervalUnit};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};

/// Computes the next occurrence of `frequency` after `anchor`.
///
/// The anchor is the completion timestamp; its time of day is preserved by
/// the date-targeting policies.
///
/// # Contract
/// - `Once` yields `Ok(None)`: no further occurrence.
/// - Every other policy yields a timestamp strictly after `anchor`.
///
/// # Errors
/// - Malformed configuration (zero interval, empty weekday set, out-of-range
///   day) and `Adaptive` reaching this engine fail with [`FrequencyError`].
pub fn next_occurrence(
    frequency: &Frequency,
    anchor: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, FrequencyError> {
    frequency.validate()?;

    match frequency {
        Frequency::Once => Ok(None),
        Frequency::Daily => Ok(Some(anchor + Duration::days(1))),
        Frequency::Weekly => Ok(Some(anchor + Duration::days(7))),
        Frequency::Monthly => Ok(Some(anchor + Months::new(1))),
        Frequency::Yearly => Ok(Some(anchor + Months::new(12))),
        Frequency::Interval { every, unit } => {
            let span = match unit {
                IntervalUnit::Hours => Duration::hours(i64::from(*every)),
                IntervalUnit::Days => Duration::days(i64::from(*every)),
                IntervalUnit::Weeks => Duration::weeks(i64::from(*every)),
            };
            Ok(Some(anchor + span))
        }
        Frequency::DaysOfWeek { days } => {
            let current = anchor.weekday().number_from_monday() as u8;
            let offset = days
                .iter()
                .map(|&day| {
                    // Same weekday means a full week ahead: the next due
                    // date must fall strictly after the anchor.
                    if day > current {
                        i64::from(day - current)
                    } else {
                        i64::from(7 - current + day)
                    }
                })
                .min()
                .ok_or(FrequencyError::EmptyWeekdaySet)?;
            Ok(Some(anchor + Duration::days(offset)))
        }
        Frequency::DayOfMonth { day } => {
            let day = u32::from(*day);
            let anchor_date = anchor.date_naive();
            let target = match date_at_day(anchor_date.year(), anchor_date.month(), day) {
                Some(date) if date > anchor_date => date,
                _ => {
                    let rolled = anchor_date + Months::new(1);
                    date_at_day(rolled.year(), rolled.month(), day)
                        .ok_or(FrequencyError::DayOfMonthOutOfRange(day as u8))?
                }
            };
            Ok(Some(target.and_time(anchor.time()).and_utc()))
        }
        Frequency::Adaptive => Err(FrequencyError::AdaptiveRequiresHistory),
    }
}

/// Resolves `day` within the given month, clamping to the month's last day
/// when the month is shorter.
fn date_at_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => Some(date),
        None => {
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            (first + Months::new(1)).pred_opt()
        }
    }
}
