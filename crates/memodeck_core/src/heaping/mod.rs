//! Heaping algorithm contract and id registry.
//!
//! # Responsibility
//! - Define the expiry-computation contract every curve variant satisfies.
//! - Resolve the per-deck algorithm id to a curve implementation.
//!
//! # Invariants
//! - Expiry computation is pure and monotonically increasing in the heap.
//! - Algorithm ids are fixed and never reused: changing the curve behind an
//!   existing id retroactively corrupts every cached expiry computed with it.
//! - The registry is an explicit constructed object; there is no global
//!   mutable algorithm table.

pub mod curves;

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::heaping::curves::{AcceleratedHeaping, DefaultHeaping};
use crate::model::scheduling::UNKNOWN_HEAP;

/// Small integer id a deck stores to select its algorithm.
pub type HeapingAlgorithmId = u32;

/// Expiry curve for one spaced-repetition strategy.
///
/// Implementations are stateless function bundles; decks select one by id.
pub trait HeapingAlgorithm: Send + Sync + std::fmt::Debug {
    /// Fixed registry id of this variant. Never reused across variants.
    fn id(&self) -> HeapingAlgorithmId;

    /// Short diagnostic name.
    fn name(&self) -> &'static str;

    /// Returns the instant (epoch milliseconds) a card reviewed at
    /// `last_review_epoch_ms` into `heap` becomes due again.
    ///
    /// Pure and deterministic; strictly increasing in `heap`.
    ///
    /// # Panics
    /// When `heap` is the unknown heap: heap-0 cards have no expiry concept,
    /// asking for one is a caller defect.
    fn expiry_epoch_ms(&self, heap: u8, last_review_epoch_ms: i64) -> i64;

    /// Returns whether a card at `heap` is due again at `now_epoch_ms`.
    ///
    /// # Panics
    /// When `heap` is the unknown heap, for the same reason as
    /// [`HeapingAlgorithm::expiry_epoch_ms`].
    fn has_expired(&self, heap: u8, last_review_epoch_ms: i64, now_epoch_ms: i64) -> bool {
        assert!(
            heap > UNKNOWN_HEAP,
            "has_expired called for the unknown heap"
        );
        now_epoch_ms >= self.expiry_epoch_ms(heap, last_review_epoch_ms)
    }
}

/// Registry lookup/registration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapingRegistryError {
    /// An algorithm with this id is already registered.
    DuplicateAlgorithmId(HeapingAlgorithmId),
    /// No algorithm carries this id.
    UnknownAlgorithmId(HeapingAlgorithmId),
}

impl Display for HeapingRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateAlgorithmId(id) => {
                write!(f, "heaping algorithm id already registered: {id}")
            }
            Self::UnknownAlgorithmId(id) => {
                write!(f, "unknown heaping algorithm id: {id}")
            }
        }
    }
}

impl Error for HeapingRegistryError {}

/// Explicit id-to-curve registry held by scheduling services.
#[derive(Clone, Default)]
pub struct HeapingAlgorithmRegistry {
    algorithms: BTreeMap<HeapingAlgorithmId, Arc<dyn HeapingAlgorithm>>,
}

impl HeapingAlgorithmRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry preloaded with the built-in curves (ids 1 and 2).
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(DefaultHeaping))
            .expect("built-in algorithm ids are distinct");
        registry
            .register(Arc::new(AcceleratedHeaping))
            .expect("built-in algorithm ids are distinct");
        registry
    }

    /// Registers one curve under its fixed id.
    pub fn register(
        &mut self,
        algorithm: Arc<dyn HeapingAlgorithm>,
    ) -> Result<(), HeapingRegistryError> {
        let id = algorithm.id();
        if self.algorithms.contains_key(&id) {
            return Err(HeapingRegistryError::DuplicateAlgorithmId(id));
        }
        self.algorithms.insert(id, algorithm);
        Ok(())
    }

    /// Resolves a deck's algorithm id to its curve.
    pub fn from_id(
        &self,
        id: HeapingAlgorithmId,
    ) -> Result<Arc<dyn HeapingAlgorithm>, HeapingRegistryError> {
        self.algorithms
            .get(&id)
            .cloned()
            .ok_or(HeapingRegistryError::UnknownAlgorithmId(id))
    }

    /// Returns registered ids in ascending order.
    pub fn algorithm_ids(&self) -> Vec<HeapingAlgorithmId> {
        self.algorithms.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{HeapingAlgorithm, HeapingAlgorithmRegistry, HeapingRegistryError};
    use crate::heaping::curves::{ACCELERATED_HEAPING_ID, DEFAULT_HEAPING_ID};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FlatCurve;

    impl HeapingAlgorithm for FlatCurve {
        fn id(&self) -> u32 {
            901
        }

        fn name(&self) -> &'static str {
            "flat"
        }

        fn expiry_epoch_ms(&self, _heap: u8, last_review_epoch_ms: i64) -> i64 {
            last_review_epoch_ms + 1
        }
    }

    #[test]
    fn builtin_registry_resolves_both_curves() {
        let registry = HeapingAlgorithmRegistry::with_builtin();
        assert_eq!(
            registry.algorithm_ids(),
            vec![DEFAULT_HEAPING_ID, ACCELERATED_HEAPING_ID]
        );
        assert_eq!(
            registry.from_id(DEFAULT_HEAPING_ID).unwrap().id(),
            DEFAULT_HEAPING_ID
        );
    }

    #[test]
    fn from_id_rejects_unknown_id() {
        let registry = HeapingAlgorithmRegistry::with_builtin();
        assert_eq!(
            registry.from_id(404).unwrap_err(),
            HeapingRegistryError::UnknownAlgorithmId(404)
        );
    }

    #[test]
    fn register_rejects_duplicate_id() {
        let mut registry = HeapingAlgorithmRegistry::new();
        registry.register(Arc::new(FlatCurve)).unwrap();
        assert_eq!(
            registry.register(Arc::new(FlatCurve)).unwrap_err(),
            HeapingRegistryError::DuplicateAlgorithmId(901)
        );
    }

    #[test]
    fn has_expired_is_inclusive_at_the_expiry_instant() {
        let curve = FlatCurve;
        assert!(!curve.has_expired(1, 1_000, 1_000));
        assert!(curve.has_expired(1, 1_000, 1_001));
        assert!(curve.has_expired(1, 1_000, 1_002));
    }

    #[test]
    #[should_panic(expected = "unknown heap")]
    fn has_expired_panics_for_unknown_heap() {
        FlatCurve.has_expired(0, 1_000, 2_000);
    }
}
