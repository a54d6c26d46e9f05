use chorewheel_core::{
    check_completion_window, AssignStrategy, Chore, ChoreValidationError, Frequency,
    FrequencyError, IntervalUnit,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

#[test]
fn chore_new_sets_defaults() {
    let chore = Chore::new("take out the trash", Frequency::Weekly, None);

    assert!(!chore.id.is_nil());
    assert_eq!(chore.name, "take out the trash");
    assert_eq!(chore.frequency, Frequency::Weekly);
    assert_eq!(chore.next_due_date, None);
    assert_eq!(chore.completion_window_hours, None);
    assert!(chore.assignees.is_empty());
    assert_eq!(chore.assign_strategy, AssignStrategy::RoundRobin);
    assert_eq!(chore.rotation_cursor, 0);
    assert_eq!(chore.current_assignee(), None);
}

#[test]
fn with_id_rejects_nil_uuid() {
    let err = Chore::with_id(Uuid::nil(), "invalid", Frequency::Daily, None).unwrap_err();
    assert_eq!(err, ChoreValidationError::NilId);
}

#[test]
fn validate_rejects_cursor_past_the_roster() {
    let mut chore = Chore::new("dishes", Frequency::Daily, None);
    chore.assignees = vec!["ana".to_string(), "ben".to_string()];
    chore.rotation_cursor = 2;

    let err = chore.validate().unwrap_err();
    assert_eq!(
        err,
        ChoreValidationError::CursorOutOfRange {
            cursor: 2,
            roster_len: 2,
        }
    );
}

#[test]
fn any_cursor_is_accepted_on_an_empty_roster() {
    let mut chore = Chore::new("dishes", Frequency::Daily, None);
    chore.rotation_cursor = 7;

    chore.validate().unwrap();
}

#[test]
fn validate_rejects_malformed_frequency() {
    let mut chore = Chore::new("dishes", Frequency::Daily, None);

    chore.frequency = Frequency::Interval {
        every: 0,
        unit: IntervalUnit::Days,
    };
    assert_eq!(
        chore.validate().unwrap_err(),
        ChoreValidationError::Frequency(FrequencyError::ZeroInterval)
    );

    chore.frequency = Frequency::DaysOfWeek {
        days: BTreeSet::new(),
    };
    assert_eq!(
        chore.validate().unwrap_err(),
        ChoreValidationError::Frequency(FrequencyError::EmptyWeekdaySet)
    );

    chore.frequency = Frequency::DayOfMonth { day: 32 };
    assert_eq!(
        chore.validate().unwrap_err(),
        ChoreValidationError::Frequency(FrequencyError::DayOfMonthOutOfRange(32))
    );
}

#[test]
fn current_assignee_follows_the_cursor() {
    let mut chore = Chore::new("vacuum", Frequency::Weekly, None);
    chore.assignees = vec!["ana".to_string(), "ben".to_string()];
    chore.rotation_cursor = 1;

    assert_eq!(chore.current_assignee().map(String::as_str), Some("ben"));
}

#[test]
fn frequency_serialization_uses_expected_wire_fields() {
    let interval = Frequency::Interval {
        every: 2,
        unit: IntervalUnit::Days,
    };
    assert_eq!(
        serde_json::to_value(&interval).unwrap(),
        serde_json::json!({"type": "interval", "every": 2, "unit": "days"})
    );

    let weekdays = Frequency::DaysOfWeek {
        days: BTreeSet::from([1, 3]),
    };
    assert_eq!(
        serde_json::to_value(&weekdays).unwrap(),
        serde_json::json!({"type": "days_of_week", "days": [1, 3]})
    );

    assert_eq!(
        serde_json::to_value(Frequency::Adaptive).unwrap(),
        serde_json::json!({"type": "adaptive"})
    );

    let decoded: Frequency =
        serde_json::from_value(serde_json::json!({"type": "day_of_month", "day": 15})).unwrap();
    assert_eq!(decoded, Frequency::DayOfMonth { day: 15 });
}

#[test]
fn chore_roundtrips_through_json() {
    let mut chore = Chore::new("water the plants", Frequency::Monthly, Some(dt(2024, 1, 31)));
    chore.completion_window_hours = Some(48);
    chore.assignees = vec!["ana".to_string(), "ben".to_string()];
    chore.assign_strategy = AssignStrategy::LeastRecentlyDone;
    chore.rotation_cursor = 1;

    let json = serde_json::to_value(&chore).unwrap();
    let decoded: Chore = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, chore);
}

#[test]
fn completion_window_boundary_is_inclusive() {
    let due = dt(2024, 1, 1);
    let deadline = due + Duration::hours(24);

    check_completion_window(Some(due), Some(24), deadline).unwrap();

    let violation =
        check_completion_window(Some(due), Some(24), deadline + Duration::milliseconds(1))
            .unwrap_err();
    assert_eq!(violation.deadline, deadline);
    assert_eq!(violation.completed_at, deadline + Duration::milliseconds(1));
}

#[test]
fn unbounded_window_accepts_any_timestamp() {
    let due = dt(2024, 1, 1);

    check_completion_window(Some(due), None, due + Duration::days(365)).unwrap();
    check_completion_window(None, Some(24), due + Duration::days(365)).unwrap();
}

fn dt(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
}
