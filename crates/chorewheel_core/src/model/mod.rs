//! Domain model for recurring shared chores.
//!
//! # Responsibility
//! - Define the canonical chore record and its recurrence configuration.
//! - Define the append-only completion history record.
//!
//! # Invariants
//! - Every chore is identified by a stable non-nil `ChoreId`.
//! - Recurrence configuration is a closed tagged variant validated at
//!   construction, not at use time.

pub mod chore;
pub mod history;
