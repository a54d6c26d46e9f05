//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate pure scheduling components against repository calls.
//! - Keep outer transport layers decoupled from storage details.

pub mod completion_service;
