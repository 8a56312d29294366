//! Domain model for deck scheduling.
//!
//! # Responsibility
//! - Define the per-deck, per-card scheduling record and its move semantics.
//! - Define the minimal account/deck/tag headers the scheduling core consumes.
//!
//! # Invariants
//! - Every record is identified by stable UUIDs.
//! - Scheduling counters are only mutated through `CardScheduling::apply_move`.

pub mod deck;
pub mod scheduling;
