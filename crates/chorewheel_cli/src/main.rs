//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `chorewheel_core` wiring
//!   end-to-end against an in-memory database.
//! - Keep output deterministic for quick local sanity checks.

use chorewheel_core::db::open_db_in_memory;
use chorewheel_core::{
    Chore, ChoreRepository, CompleteChoreRequest, CompletionService, Frequency,
    SqliteChoreRepository, SqliteHistoryRepository,
};
use chrono::{Duration, TimeZone, Utc};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("chorewheel smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    println!("chorewheel_core version={}", chorewheel_core::core_version());

    let conn = open_db_in_memory()?;

    let due = Utc
        .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .ok_or("invalid seed date")?;
    let mut chore = Chore::new("water the plants", Frequency::Weekly, Some(due));
    chore.assignees = vec!["ana".to_string(), "ben".to_string()];
    SqliteChoreRepository::try_new(&conn)?.create_chore(&chore)?;

    let service = CompletionService::new(
        SqliteChoreRepository::try_new(&conn)?,
        SqliteHistoryRepository::try_new(&conn)?,
    );
    let updated = service.complete_chore(&CompleteChoreRequest {
        chore_id: chore.id,
        completed_by: "ana".to_string(),
        completed_at: due + Duration::hours(3),
    })?;

    println!(
        "completed chore={} next_due={} next_assignee={}",
        updated.name,
        updated
            .next_due_date
            .map_or_else(|| "none".to_string(), |date| date.to_rfc3339()),
        updated.current_assignee().map_or("none", String::as_str)
    );

    Ok(())
}
