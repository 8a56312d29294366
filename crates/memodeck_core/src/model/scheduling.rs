//! Per-deck card scheduling state.
//!
//! # Responsibility
//! - Define the `CardScheduling` record tracked for every card in a deck.
//! - Apply heap-move effects (counters, review timestamp, cached expiry).
//!
//! # Invariants
//! - `current_heap` stays within `[UNKNOWN_HEAP, MAX_HEAP]`.
//! - `biggest_heap_reached >= current_heap` at all times.
//! - `expiry_epoch_ms` is `None` exactly while the card sits in the unknown
//!   heap; for learned cards it is always recomputed on move, never carried
//!   over.
//! - `times_in_unknown_heap >= 1`: registering a card counts as its first
//!   entry into the unknown heap.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a card (content lives outside this core).
pub type CardId = Uuid;
/// Stable identifier of a learner-owned deck.
pub type DeckId = Uuid;
/// Stable identifier of a learner account.
pub type UserId = Uuid;
/// Stable identifier of a tag.
pub type TagId = Uuid;

/// Heap of cards that were never learned, or were demoted after a failed
/// review. Cards in this heap have no time-based expiry.
pub const UNKNOWN_HEAP: u8 = 0;

/// Highest proficiency heap a card can reach.
pub const MAX_HEAP: u8 = 15;

/// Invariant violations detectable on a scheduling record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingValidationError {
    /// `current_heap` exceeds `MAX_HEAP`.
    HeapOutOfRange(u8),
    /// Historical maximum fell below the current heap.
    BiggestHeapBelowCurrent { current: u8, biggest: u8 },
    /// A learned card is missing its cached expiry.
    MissingExpiry { heap: u8 },
    /// An unknown-heap card carries an expiry timestamp.
    UnexpectedExpiry { expiry_epoch_ms: i64 },
    /// The unknown-heap counter dropped below its registration baseline.
    ZeroUnknownHeapCount,
}

impl Display for SchedulingValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeapOutOfRange(heap) => {
                write!(f, "heap {heap} is outside [0, {MAX_HEAP}]")
            }
            Self::BiggestHeapBelowCurrent { current, biggest } => write!(
                f,
                "biggest heap reached ({biggest}) is below current heap ({current})"
            ),
            Self::MissingExpiry { heap } => {
                write!(f, "card at heap {heap} has no cached expiry")
            }
            Self::UnexpectedExpiry { expiry_epoch_ms } => write!(
                f,
                "unknown-heap card carries expiry {expiry_epoch_ms}; it must never expire"
            ),
            Self::ZeroUnknownHeapCount => {
                write!(f, "times_in_unknown_heap must be at least 1")
            }
        }
    }
}

impl Error for SchedulingValidationError {}

/// Scheduling state of one card within one deck.
///
/// Owned by the deck: the record is created when the card is registered in
/// the deck and disappears when the card is removed from it. All mutations
/// between those two points go through [`CardScheduling::apply_move`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardScheduling {
    /// Owning deck.
    pub deck_id: DeckId,
    /// Scheduled card.
    pub card_id: CardId,
    /// Current proficiency heap, `0 = unknown`.
    pub current_heap: u8,
    /// When the review that set `current_heap` happened (or when the card
    /// was registered, if never reviewed). Epoch milliseconds.
    pub last_review_epoch_ms: i64,
    /// Cached expiry instant for learned cards; `None` while in the unknown
    /// heap.
    pub expiry_epoch_ms: Option<i64>,
    /// Historical maximum of `current_heap`; monotonically non-decreasing.
    pub biggest_heap_reached: u8,
    /// How many times the card entered the unknown heap, registration
    /// included.
    pub times_in_unknown_heap: u32,
}

impl CardScheduling {
    /// Creates the state record for a card freshly registered in a deck.
    ///
    /// # Contract
    /// - Starts in the unknown heap with no expiry.
    /// - Registration counts as the first entry into the unknown heap.
    pub fn new_unseen(deck_id: DeckId, card_id: CardId, added_epoch_ms: i64) -> Self {
        Self {
            deck_id,
            card_id,
            current_heap: UNKNOWN_HEAP,
            last_review_epoch_ms: added_epoch_ms,
            expiry_epoch_ms: None,
            biggest_heap_reached: UNKNOWN_HEAP,
            times_in_unknown_heap: 1,
        }
    }

    /// Returns whether the card still sits in the unknown heap.
    pub fn is_unseen(&self) -> bool {
        self.current_heap == UNKNOWN_HEAP
    }

    /// Applies one heap move to this record.
    ///
    /// # Contract
    /// - `expiry_epoch_ms` must be `None` exactly when `target_heap` is the
    ///   unknown heap; the caller computes it through the deck's heaping
    ///   algorithm for learned targets.
    /// - Moving to the heap the card already occupies refreshes
    ///   `last_review_epoch_ms` and the expiry ("still remembered" reviews).
    /// - Entering the unknown heap increments `times_in_unknown_heap`.
    pub fn apply_move(&mut self, target_heap: u8, now_epoch_ms: i64, expiry_epoch_ms: Option<i64>) {
        debug_assert!(target_heap <= MAX_HEAP);
        debug_assert_eq!(expiry_epoch_ms.is_none(), target_heap == UNKNOWN_HEAP);

        if target_heap == UNKNOWN_HEAP {
            self.times_in_unknown_heap += 1;
        }
        self.biggest_heap_reached = self.biggest_heap_reached.max(target_heap);
        self.current_heap = target_heap;
        self.last_review_epoch_ms = now_epoch_ms;
        self.expiry_epoch_ms = expiry_epoch_ms;
    }

    /// Checks every record-level invariant.
    pub fn validate(&self) -> Result<(), SchedulingValidationError> {
        if self.current_heap > MAX_HEAP {
            return Err(SchedulingValidationError::HeapOutOfRange(self.current_heap));
        }
        if self.biggest_heap_reached < self.current_heap {
            return Err(SchedulingValidationError::BiggestHeapBelowCurrent {
                current: self.current_heap,
                biggest: self.biggest_heap_reached,
            });
        }
        match (self.current_heap, self.expiry_epoch_ms) {
            (UNKNOWN_HEAP, Some(expiry_epoch_ms)) => {
                return Err(SchedulingValidationError::UnexpectedExpiry { expiry_epoch_ms });
            }
            (heap, None) if heap > UNKNOWN_HEAP => {
                return Err(SchedulingValidationError::MissingExpiry { heap });
            }
            _ => {}
        }
        if self.times_in_unknown_heap == 0 {
            return Err(SchedulingValidationError::ZeroUnknownHeapCount);
        }
        Ok(())
    }
}
