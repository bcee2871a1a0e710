//! Task identifier generation.
//!
//! Identifiers are random non-negative integers below 10^16 rendered in
//! base 10. They are opaque: nothing parses them back into numbers.

use rand::Rng;

use super::task::Task;

/// Exclusive upper bound for generated identifiers.
pub const ID_UPPER_BOUND: u64 = 10_u64.pow(16);

/// Draw an identifier that no task in `existing` already uses.
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R, existing: &[Task]) -> String {
    loop {
        let candidate = rng.gen_range(0..ID_UPPER_BOUND).to_string();
        if !existing.iter().any(|task| task.id == candidate) {
            return candidate;
        }
        tracing::debug!(%candidate, "generated id collides with an existing task, redrawing");
    }
}

/// [`generate_id`] using the thread-local RNG.
#[must_use]
pub fn new_id(existing: &[Task]) -> String {
    generate_id(&mut rand::thread_rng(), existing)
}
