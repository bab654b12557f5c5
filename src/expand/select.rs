//! Partial top-N selection over scored samples.

use super::ScoreIndex;
use crate::zorder::Address;
use core::cmp::Ordering;

/// Descending by score, NaN last.
#[inline]
pub(crate) fn rank_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Move the `n` highest-scoring samples into `samples[..n]` and return that prefix.
///
/// Order inside the prefix and among equal scores is unspecified.
pub(crate) fn select_top<I: Address>(samples: &mut [ScoreIndex<I>], n: usize) -> &[ScoreIndex<I>] {
    let n = n.min(samples.len());
    if n == 0 {
        return &[];
    }
    if n < samples.len() {
        let _ = samples.select_nth_unstable_by(n - 1, |a, b| rank_desc(a.score, b.score));
    }
    &samples[..n]
}
