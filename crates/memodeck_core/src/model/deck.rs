//! Collaborator headers: accounts, decks, tags.
//!
//! # Responsibility
//! - Carry the minimal identity data the scheduling core consumes: deck
//!   ownership and the per-deck heaping algorithm selection.
//!
//! # Invariants
//! - Each deck has exactly one owner.
//! - `heaping_algorithm_id` is configuration consumed by id; this core never
//!   decides which algorithm a deck uses.

use crate::heaping::HeapingAlgorithmId;
use crate::model::scheduling::{DeckId, TagId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Learner account header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable account id.
    pub uuid: UserId,
    /// Display name, informational only.
    pub display_name: String,
}

impl User {
    /// Creates an account header with a generated stable id.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            display_name: display_name.into(),
        }
    }
}

/// Deck header: ownership plus scheduling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Stable deck id.
    pub uuid: DeckId,
    /// Owning account; moves are only accepted from this learner.
    pub owner_uuid: UserId,
    /// Deck name, informational only.
    pub name: String,
    /// Heaping algorithm selected for this deck, by registry id.
    pub heaping_algorithm_id: HeapingAlgorithmId,
}

impl Deck {
    /// Creates a deck header with a generated stable id.
    pub fn new(
        owner_uuid: UserId,
        name: impl Into<String>,
        heaping_algorithm_id: HeapingAlgorithmId,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            owner_uuid,
            name: name.into(),
            heaping_algorithm_id,
        }
    }
}

/// Tag header used for exclusion filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Stable tag id.
    pub uuid: TagId,
    /// Unique tag name.
    pub name: String,
}

impl Tag {
    /// Creates a tag header with a generated stable id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
