//! Spaced-repetition scheduling core for MemoDeck.
//! This crate is the single source of truth for heaping-state invariants.

pub mod clock;
pub mod db;
pub mod heaping;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::now_epoch_ms;
pub use heaping::curves::{
    AcceleratedHeaping, DefaultHeaping, ACCELERATED_HEAPING_ID, DEFAULT_HEAPING_ID,
};
pub use heaping::{
    HeapingAlgorithm, HeapingAlgorithmId, HeapingAlgorithmRegistry, HeapingRegistryError,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::deck::{Deck, Tag, User};
pub use model::scheduling::{
    CardId, CardScheduling, DeckId, SchedulingValidationError, TagId, UserId, MAX_HEAP,
    UNKNOWN_HEAP,
};
pub use repo::deck_repo::{DeckRepository, SqliteDeckRepository};
pub use repo::scheduling_repo::{
    DeckHeader, HeapListQuery, SchedulingRepository, SqliteSchedulingRepository, UnseenListQuery,
};
pub use repo::{RepoError, RepoResult};
pub use service::due_service::{DueCardsRequest, DueCardsService, SessionQueryError};
pub use service::move_service::{MoveCardsError, MoveCardsRequest, MoveCardsService};
pub use service::unseen_service::{UnseenCardsRequest, UnseenCardsService, UNSEEN_POOL_FACTOR};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
