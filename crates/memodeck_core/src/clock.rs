//! Process clock helper.
//!
//! # Responsibility
//! - Supply "now" as unix epoch milliseconds for scheduling computations.
//!
//! # Invariants
//! - Every service operation accepts an explicit `now` override; this helper
//!   is only the default source.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time as unix epoch milliseconds.
///
/// Clamps to `0` when the system clock reports a pre-epoch time instead of
/// failing: scheduling comparisons stay well-defined either way.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
