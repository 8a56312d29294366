//! Scheduling use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and heaping-algorithm calls into the three core
//!   operations: the heap-move command and the due/unseen session selectors.
//! - Keep request handlers decoupled from storage and curve details.
//!
//! # Invariants
//! - Every operation accepts an injectable "now"; real time is only a
//!   default.
//! - Failed operations mutate nothing.

pub mod due_service;
pub mod move_service;
pub mod unseen_service;
