//! Built-in heaping curves.
//!
//! # Responsibility
//! - Provide the production expiry curve and the accelerated demo curve.
//!
//! # Invariants
//! - Curve ids are part of persisted deck configuration and of every cached
//!   expiry; they must never change or be reassigned. New curve shapes get
//!   new ids.

use crate::heaping::{HeapingAlgorithm, HeapingAlgorithmId};
use crate::model::scheduling::UNKNOWN_HEAP;

const MINUTE_MS: i64 = 60 * 1_000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Fixed id of [`DefaultHeaping`].
pub const DEFAULT_HEAPING_ID: HeapingAlgorithmId = 1;
/// Fixed id of [`AcceleratedHeaping`].
pub const ACCELERATED_HEAPING_ID: HeapingAlgorithmId = 2;

/// Production curve: the review interval doubles with every heap, in days.
///
/// A card reviewed into heap `h` comes due `2^h` days later (heap 1: two
/// days, heap 2: four days, ..., heap 15: roughly ninety years).
#[derive(Debug)]
pub struct DefaultHeaping;

impl HeapingAlgorithm for DefaultHeaping {
    fn id(&self) -> HeapingAlgorithmId {
        DEFAULT_HEAPING_ID
    }

    fn name(&self) -> &'static str {
        "default"
    }

    fn expiry_epoch_ms(&self, heap: u8, last_review_epoch_ms: i64) -> i64 {
        last_review_epoch_ms + interval_steps(heap) * DAY_MS
    }
}

/// Demo/testing curve: the same doubling shape compressed to minutes, so a
/// whole learning cycle can be exercised within one session.
#[derive(Debug)]
pub struct AcceleratedHeaping;

impl HeapingAlgorithm for AcceleratedHeaping {
    fn id(&self) -> HeapingAlgorithmId {
        ACCELERATED_HEAPING_ID
    }

    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn expiry_epoch_ms(&self, heap: u8, last_review_epoch_ms: i64) -> i64 {
        last_review_epoch_ms + interval_steps(heap) * MINUTE_MS
    }
}

/// `2^heap`, the shared doubling shape of both curves.
fn interval_steps(heap: u8) -> i64 {
    assert!(
        heap > UNKNOWN_HEAP,
        "expiry is undefined for the unknown heap"
    );
    1_i64 << heap
}

#[cfg(test)]
mod tests {
    use super::{AcceleratedHeaping, DefaultHeaping, DAY_MS, MINUTE_MS};
    use crate::heaping::HeapingAlgorithm;
    use crate::model::scheduling::MAX_HEAP;

    #[test]
    fn default_curve_doubles_days_per_heap() {
        let curve = DefaultHeaping;
        assert_eq!(curve.expiry_epoch_ms(1, 0), 2 * DAY_MS);
        assert_eq!(curve.expiry_epoch_ms(2, 0), 4 * DAY_MS);
        assert_eq!(curve.expiry_epoch_ms(3, 500), 500 + 8 * DAY_MS);
    }

    #[test]
    fn accelerated_curve_uses_minutes() {
        let curve = AcceleratedHeaping;
        assert_eq!(curve.expiry_epoch_ms(1, 0), 2 * MINUTE_MS);
        assert_eq!(curve.expiry_epoch_ms(4, 0), 16 * MINUTE_MS);
    }

    #[test]
    fn expiry_is_strictly_increasing_in_heap_for_every_curve() {
        let curves: [&dyn HeapingAlgorithm; 2] = [&DefaultHeaping, &AcceleratedHeaping];
        let last_review = 1_700_000_000_000;
        for curve in curves {
            for heap in 1..MAX_HEAP {
                assert!(
                    curve.expiry_epoch_ms(heap + 1, last_review)
                        > curve.expiry_epoch_ms(heap, last_review),
                    "{} curve must grow from heap {heap}",
                    curve.name()
                );
            }
        }
    }

    #[test]
    fn expiry_is_deterministic() {
        let curve = DefaultHeaping;
        assert_eq!(
            curve.expiry_epoch_ms(5, 1_234_567),
            curve.expiry_epoch_ms(5, 1_234_567)
        );
    }

    #[test]
    #[should_panic(expected = "unknown heap")]
    fn expiry_panics_for_unknown_heap() {
        DefaultHeaping.expiry_epoch_ms(0, 1_000);
    }
}
