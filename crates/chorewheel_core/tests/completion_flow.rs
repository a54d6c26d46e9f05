use chorewheel_core::db::open_db_in_memory;
use chorewheel_core::{
    AssignStrategy, Chore, ChoreRepository, CompleteChoreRequest, CompletionError,
    CompletionService, Frequency, FrequencyError, HistoryEntry, RepoError, SqliteChoreRepository,
    SqliteHistoryRepository,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn weekly_completion_advances_due_date_and_rotation() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let due = dt(2024, 1, 1, 0, 0);
    let mut chore = Chore::new("laundry", Frequency::Weekly, Some(due));
    chore.completion_window_hours = Some(24);
    chore.assignees = vec!["ana".to_string(), "ben".to_string()];
    create(&conn, &chore);

    let completed_at = dt(2024, 1, 1, 12, 0);
    let updated = service
        .complete_chore(&request(chore.id, "ana", completed_at))
        .unwrap();

    assert_eq!(updated.next_due_date, Some(dt(2024, 1, 8, 12, 0)));
    assert_eq!(updated.current_assignee().map(String::as_str), Some("ben"));
    assert_eq!(updated.rotation_cursor, 1);

    let entries = service.recent_history(chore.id, 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].completed_by, "ana");
    assert_eq!(entries[0].due_date_at_completion, Some(due));
    assert_eq!(entries[0].completed_at, completed_at);
}

#[test]
fn completion_at_the_window_boundary_is_accepted() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let due = dt(2024, 1, 1, 0, 0);
    let mut chore = Chore::new("laundry", Frequency::Weekly, Some(due));
    chore.completion_window_hours = Some(24);
    create(&conn, &chore);

    let deadline = due + Duration::hours(24);
    service
        .complete_chore(&request(chore.id, "ana", deadline))
        .unwrap();
}

#[test]
fn completion_past_the_window_is_rejected_without_side_effects() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let due = dt(2024, 1, 1, 0, 0);
    let mut chore = Chore::new("laundry", Frequency::Weekly, Some(due));
    chore.completion_window_hours = Some(24);
    create(&conn, &chore);

    let too_late = due + Duration::hours(24) + Duration::milliseconds(1);
    let err = service
        .complete_chore(&request(chore.id, "ana", too_late))
        .unwrap_err();
    assert!(matches!(err, CompletionError::OutOfWindow { .. }));

    let current = service.get_chore(chore.id).unwrap().unwrap();
    assert_eq!(current.next_due_date, Some(due));
    assert!(service.recent_history(chore.id, 10).unwrap().is_empty());
}

#[test]
fn missing_window_accepts_arbitrarily_late_completions() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let due = dt(2024, 1, 1, 0, 0);
    let chore = Chore::new("laundry", Frequency::Weekly, Some(due));
    create(&conn, &chore);

    service
        .complete_chore(&request(chore.id, "ana", due + Duration::days(400)))
        .unwrap();
}

#[test]
fn unknown_chore_is_rejected_with_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .complete_chore(&request(Uuid::new_v4(), "ana", dt(2024, 1, 1, 0, 0)))
        .unwrap_err();
    assert!(matches!(err, CompletionError::NotFound(_)));
}

#[test]
fn once_chores_clear_their_due_date_and_stay_completable() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let chore = Chore::new("assemble shelf", Frequency::Once, Some(dt(2024, 1, 1, 0, 0)));
    create(&conn, &chore);

    let updated = service
        .complete_chore(&request(chore.id, "ana", dt(2024, 1, 1, 10, 0)))
        .unwrap();
    assert_eq!(updated.next_due_date, None);

    // A repeat completion is recorded, never rejected.
    let updated = service
        .complete_chore(&request(chore.id, "ben", dt(2024, 1, 2, 10, 0)))
        .unwrap();
    assert_eq!(updated.next_due_date, None);
    assert_eq!(service.recent_history(chore.id, 10).unwrap().len(), 2);
}

#[test]
fn adaptive_chores_learn_the_completion_spacing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let start = dt(2024, 1, 1, 9, 0);
    let chore = Chore::new("descale the kettle", Frequency::Adaptive, Some(start));
    create(&conn, &chore);

    // With no history the 7-day default applies.
    let updated = service
        .complete_chore(&request(chore.id, "ana", start))
        .unwrap();
    assert_eq!(updated.next_due_date, Some(start + Duration::days(7)));

    // Still only one entry: the estimator keeps falling back.
    let updated = service
        .complete_chore(&request(chore.id, "ana", start + Duration::days(10)))
        .unwrap();
    assert_eq!(
        updated.next_due_date,
        Some(start + Duration::days(17))
    );

    // Two entries spaced 10 days apart: the estimate follows the history.
    let updated = service
        .complete_chore(&request(chore.id, "ana", start + Duration::days(20)))
        .unwrap();
    assert_eq!(
        updated.next_due_date,
        Some(start + Duration::days(30))
    );
}

#[test]
fn early_completion_never_moves_the_due_date_backwards() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let due = dt(2024, 3, 1, 9, 0);
    let chore = Chore::new("clean gutters", Frequency::Weekly, Some(due));
    create(&conn, &chore);

    // Completed a month before the due date; a week from now would regress.
    let updated = service
        .complete_chore(&request(chore.id, "ana", dt(2024, 2, 1, 9, 0)))
        .unwrap();
    assert_eq!(updated.next_due_date, Some(due));
}

#[test]
fn least_recently_done_roster_rotation_through_the_service() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let start = dt(2024, 1, 1, 9, 0);
    let mut chore = Chore::new("mow the lawn", Frequency::Weekly, Some(start));
    chore.assignees = vec!["ana".to_string(), "ben".to_string(), "cleo".to_string()];
    chore.assign_strategy = AssignStrategy::LeastRecentlyDone;
    create(&conn, &chore);

    // Ana completes; ben and cleo are tied at "never", ben wins by order.
    let updated = service
        .complete_chore(&request(chore.id, "ana", start))
        .unwrap();
    assert_eq!(updated.current_assignee().map(String::as_str), Some("ben"));

    // Ben completes; cleo has still never done it.
    let updated = service
        .complete_chore(&request(chore.id, "ben", start + Duration::days(7)))
        .unwrap();
    assert_eq!(updated.current_assignee().map(String::as_str), Some("cleo"));

    // Cleo completes; ana's completion is now the oldest.
    let updated = service
        .complete_chore(&request(chore.id, "cleo", start + Duration::days(14)))
        .unwrap();
    assert_eq!(updated.current_assignee().map(String::as_str), Some("ana"));
}

#[test]
fn empty_roster_completions_stay_unassigned() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let chore = Chore::new("feed the cat", Frequency::Daily, Some(dt(2024, 1, 1, 9, 0)));
    create(&conn, &chore);

    let updated = service
        .complete_chore(&request(chore.id, "visitor", dt(2024, 1, 1, 9, 0)))
        .unwrap();
    assert_eq!(updated.current_assignee(), None);
    assert_eq!(updated.rotation_cursor, 0);
}

#[test]
fn stale_snapshot_loses_the_commit_race() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let repo = SqliteChoreRepository::try_new(&conn).unwrap();

    let due = dt(2024, 1, 1, 0, 0);
    let mut chore = Chore::new("laundry", Frequency::Weekly, Some(due));
    chore.assignees = vec!["ana".to_string(), "ben".to_string()];
    create(&conn, &chore);

    // Both requests read the same state; the service commits first.
    let snapshot = repo.get_chore(chore.id).unwrap().unwrap();
    service
        .complete_chore(&request(chore.id, "ana", dt(2024, 1, 1, 10, 0)))
        .unwrap();

    let entry = HistoryEntry::new(
        snapshot.id,
        snapshot.next_due_date,
        dt(2024, 1, 1, 10, 30),
        "ben",
    );
    let err = repo
        .complete_atomic(&snapshot, Some(dt(2024, 1, 8, 10, 30)), 0, &entry)
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(id) if id == chore.id));

    // Exactly one completion was recorded.
    assert_eq!(service.recent_history(chore.id, 10).unwrap().len(), 1);
    let current = service.get_chore(chore.id).unwrap().unwrap();
    assert_eq!(current.next_due_date, Some(dt(2024, 1, 8, 10, 0)));
}

#[test]
fn corrupt_recurrence_configuration_surfaces_as_invalid_frequency() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    // Bypass repository validation to simulate corrupt persisted state.
    let chore = Chore::new("broken", Frequency::Daily, Some(dt(2024, 1, 1, 9, 0)));
    create(&conn, &chore);
    conn.execute(
        "UPDATE chores SET frequency = '{\"type\":\"interval\",\"every\":0,\"unit\":\"days\"}'
         WHERE id = ?1;",
        [chore.id.to_string()],
    )
    .unwrap();

    let err = service
        .complete_chore(&request(chore.id, "ana", dt(2024, 1, 1, 9, 0)))
        .unwrap_err();
    assert!(matches!(
        err,
        CompletionError::InvalidFrequency(FrequencyError::ZeroInterval)
    ));
}

fn service(
    conn: &Connection,
) -> CompletionService<SqliteChoreRepository<'_>, SqliteHistoryRepository<'_>> {
    CompletionService::new(
        SqliteChoreRepository::try_new(conn).unwrap(),
        SqliteHistoryRepository::try_new(conn).unwrap(),
    )
}

fn create(conn: &Connection, chore: &Chore) {
    SqliteChoreRepository::try_new(conn)
        .unwrap()
        .create_chore(chore)
        .unwrap();
}

fn request(chore_id: Uuid, completed_by: &str, completed_at: DateTime<Utc>) -> CompleteChoreRequest {
    CompleteChoreRequest {
        chore_id,
        completed_by: completed_by.to_string(),
        completed_at,
    }
}

fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
}
