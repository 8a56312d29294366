//! Due-card session selector.
//!
//! # Responsibility
//! - Select up to `count` previously-learned, now-expired cards of one deck,
//!   most-proficient heap first.
//!
//! # Invariants
//! - Heaps are scanned from `MAX_HEAP` down to 1; the unknown heap is never
//!   part of the due queue.
//! - Every heap segment is internally ordered oldest review first; the
//!   longest-overdue card of a heap always surfaces before fresher ones.
//! - The selector is read-only and deterministic for unchanged state.

use crate::clock::now_epoch_ms;
use crate::heaping::{HeapingAlgorithmId, HeapingAlgorithmRegistry};
use crate::model::scheduling::{CardId, CardScheduling, DeckId, TagId, MAX_HEAP};
use crate::repo::scheduling_repo::{HeapListQuery, SchedulingRepository};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Query options for one due-card selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCardsRequest {
    /// Deck to select from.
    pub deck_id: DeckId,
    /// Maximum number of cards to return.
    pub count: u32,
    /// Card ids to leave out.
    pub excluded_card_ids: Vec<CardId>,
    /// Cards carrying any of these tags are left out.
    pub excluded_tag_ids: Vec<TagId>,
}

/// Errors from the session selectors.
#[derive(Debug)]
pub enum SessionQueryError {
    /// Deck does not exist.
    DeckNotFound(DeckId),
    /// Deck configuration names an unregistered algorithm.
    UnknownAlgorithm(HeapingAlgorithmId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for SessionQueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeckNotFound(deck_id) => write!(f, "deck not found: {deck_id}"),
            Self::UnknownAlgorithm(id) => write!(f, "unknown heaping algorithm id: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionQueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SessionQueryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DeckNotFound(deck_id) => Self::DeckNotFound(deck_id),
            other => Self::Repo(other),
        }
    }
}

/// Read-only selector for expired cards.
pub struct DueCardsService<R: SchedulingRepository> {
    repo: R,
    algorithms: HeapingAlgorithmRegistry,
}

impl<R: SchedulingRepository> DueCardsService<R> {
    /// Creates the selector over a repository and an algorithm registry.
    pub fn new(repo: R, algorithms: HeapingAlgorithmRegistry) -> Self {
        Self { repo, algorithms }
    }

    /// Selects up to `request.count` expired cards.
    ///
    /// # Contract
    /// - All qualifying cards of a higher heap appear before any card of a
    ///   lower heap.
    /// - Scanning stops as soon as the requested count is reached; lower
    ///   heaps are not queried past that point.
    /// - `now_epoch_ms` defaults to the real clock; tests inject a fixed
    ///   value.
    pub fn run(
        &self,
        request: &DueCardsRequest,
        now_override_ms: Option<i64>,
    ) -> Result<Vec<CardScheduling>, SessionQueryError> {
        let header = self
            .repo
            .deck_header(request.deck_id)?
            .ok_or(SessionQueryError::DeckNotFound(request.deck_id))?;
        let algorithm = self
            .algorithms
            .from_id(header.heaping_algorithm_id)
            .map_err(|_| SessionQueryError::UnknownAlgorithm(header.heaping_algorithm_id))?;

        let mut due = Vec::new();
        if request.count == 0 {
            return Ok(due);
        }

        let now = now_override_ms.unwrap_or_else(now_epoch_ms);
        let mut query = HeapListQuery {
            deck_id: request.deck_id,
            heap: MAX_HEAP,
            excluded_card_ids: request.excluded_card_ids.clone(),
            excluded_tag_ids: request.excluded_tag_ids.clone(),
        };

        for heap in (1..=MAX_HEAP).rev() {
            query.heap = heap;
            for record in self.repo.list_heap(&query)? {
                if !algorithm.has_expired(heap, record.last_review_epoch_ms, now) {
                    continue;
                }
                due.push(record);
                if due.len() as u32 == request.count {
                    return Ok(due);
                }
            }
        }

        Ok(due)
    }
}
