//! Heap-move command.
//!
//! # Responsibility
//! - Transition a batch of cards (one deck, one target heap, one timestamp)
//!   to a new heap and persist the updated scheduling state atomically.
//! - Enforce ownership and move-direction preconditions before any write.
//!
//! # Invariants
//! - All preconditions are checked against every card before the batch is
//!   persisted; a single failing card rejects the whole batch.
//! - Without manual override, promotions are capped at one heap above the
//!   card's current heap (the unknown heap counts as a normal heap, so
//!   `0 -> 1` is the only non-override promotion out of unknown). Demotions
//!   of any depth are always allowed.
//! - Moving a card onto its current heap is a refresh: the review timestamp
//!   and cached expiry are recomputed.

use crate::clock::now_epoch_ms;
use crate::heaping::{HeapingAlgorithmId, HeapingAlgorithmRegistry};
use crate::model::scheduling::{CardId, CardScheduling, DeckId, UserId, MAX_HEAP, UNKNOWN_HEAP};
use crate::repo::scheduling_repo::SchedulingRepository;
use crate::repo::RepoError;
use log::info;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One batch move: same learner, deck, target heap, and timestamp for every
/// card in the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCardsRequest {
    /// Learner requesting the move; must own the deck.
    pub user_id: UserId,
    /// Deck whose cards move.
    pub deck_id: DeckId,
    /// Heap every card in the batch moves to.
    pub target_heap: u8,
    /// Cards to move; duplicates are collapsed.
    pub card_ids: Vec<CardId>,
    /// Administrative re-leveling flag: lifts the +1 promotion cap.
    pub manual_override: bool,
}

/// Errors from the heap-move command.
#[derive(Debug)]
pub enum MoveCardsError {
    /// The request carries no card ids.
    EmptyCardSet,
    /// Target heap is above `MAX_HEAP`.
    HeapOutOfRange(u8),
    /// Requesting account does not exist.
    UnknownUser(UserId),
    /// Deck does not exist.
    DeckNotFound(DeckId),
    /// Requesting account does not own the deck.
    NotDeckOwner { deck_id: DeckId, user_id: UserId },
    /// Deck configuration names an unregistered algorithm.
    UnknownAlgorithm(HeapingAlgorithmId),
    /// A card in the batch has no scheduling record in the deck.
    CardNotInDeck(CardId),
    /// Non-override promotion by more than one heap.
    PromotionTooSteep {
        card_id: CardId,
        current_heap: u8,
        target_heap: u8,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for MoveCardsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCardSet => write!(f, "card id set must not be empty"),
            Self::HeapOutOfRange(heap) => {
                write!(f, "target heap {heap} is outside [0, {MAX_HEAP}]")
            }
            Self::UnknownUser(user_id) => write!(f, "unknown learner account: {user_id}"),
            Self::DeckNotFound(deck_id) => write!(f, "deck not found: {deck_id}"),
            Self::NotDeckOwner { deck_id, user_id } => {
                write!(f, "learner {user_id} does not own deck {deck_id}")
            }
            Self::UnknownAlgorithm(id) => write!(f, "unknown heaping algorithm id: {id}"),
            Self::CardNotInDeck(card_id) => write!(f, "card not in deck: {card_id}"),
            Self::PromotionTooSteep {
                card_id,
                current_heap,
                target_heap,
            } => write!(
                f,
                "card {card_id} cannot be promoted from heap {current_heap} to {target_heap} without manual override"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MoveCardsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MoveCardsError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CardNotRegistered { card_id, .. } => Self::CardNotInDeck(card_id),
            RepoError::DeckNotFound(deck_id) => Self::DeckNotFound(deck_id),
            other => Self::Repo(other),
        }
    }
}

/// Command service applying heap moves.
pub struct MoveCardsService<R: SchedulingRepository> {
    repo: R,
    algorithms: HeapingAlgorithmRegistry,
}

impl<R: SchedulingRepository> MoveCardsService<R> {
    /// Creates the service over a repository and an algorithm registry.
    pub fn new(repo: R, algorithms: HeapingAlgorithmRegistry) -> Self {
        Self { repo, algorithms }
    }

    /// Moves every card in the request to the target heap.
    ///
    /// # Contract
    /// - `now_epoch_ms` defaults to the real clock; tests inject a fixed
    ///   value.
    /// - Returns the updated records in request order (duplicates collapsed
    ///   to their first occurrence).
    /// - On any error, no scheduling state changes.
    pub fn run(
        &mut self,
        request: &MoveCardsRequest,
        now_override_ms: Option<i64>,
    ) -> Result<Vec<CardScheduling>, MoveCardsError> {
        if request.card_ids.is_empty() {
            return Err(MoveCardsError::EmptyCardSet);
        }
        if request.target_heap > MAX_HEAP {
            return Err(MoveCardsError::HeapOutOfRange(request.target_heap));
        }
        if !self.repo.user_exists(request.user_id)? {
            return Err(MoveCardsError::UnknownUser(request.user_id));
        }

        let header = self
            .repo
            .deck_header(request.deck_id)?
            .ok_or(MoveCardsError::DeckNotFound(request.deck_id))?;
        if header.owner_id != request.user_id {
            return Err(MoveCardsError::NotDeckOwner {
                deck_id: request.deck_id,
                user_id: request.user_id,
            });
        }

        let algorithm = self
            .algorithms
            .from_id(header.heaping_algorithm_id)
            .map_err(|_| MoveCardsError::UnknownAlgorithm(header.heaping_algorithm_id))?;

        let now = now_override_ms.unwrap_or_else(now_epoch_ms);

        let mut seen = HashSet::new();
        let mut moved = Vec::new();
        for card_id in &request.card_ids {
            if !seen.insert(*card_id) {
                continue;
            }

            let mut record = self
                .repo
                .get_scheduling(request.deck_id, *card_id)?
                .ok_or(MoveCardsError::CardNotInDeck(*card_id))?;

            if !request.manual_override
                && request.target_heap > UNKNOWN_HEAP
                && request.target_heap > record.current_heap + 1
            {
                return Err(MoveCardsError::PromotionTooSteep {
                    card_id: *card_id,
                    current_heap: record.current_heap,
                    target_heap: request.target_heap,
                });
            }

            let expiry = (request.target_heap > UNKNOWN_HEAP)
                .then(|| algorithm.expiry_epoch_ms(request.target_heap, now));
            record.apply_move(request.target_heap, now, expiry);
            moved.push(record);
        }

        self.repo.save_batch(&moved)?;

        info!(
            "event=heap_move module=service status=ok deck={} target_heap={} cards={} manual_override={}",
            request.deck_id,
            request.target_heap,
            moved.len(),
            request.manual_override
        );

        Ok(moved)
    }
}
