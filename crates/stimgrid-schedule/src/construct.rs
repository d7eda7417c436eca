//! Banded-path construction: randomized greedy ordering over the grid.
//!
//! Builds a presentation order in which every consecutive pair of
//! patterns lies strictly inside a (min, max) grid-distance band, so
//! that temporally adjacent stimuli never land on spatially adjacent
//! locations. The search is a restarting greedy walk: grow the order
//! one uniformly random candidate at a time, abandon the pass when too
//! many candidates in a row fall outside the band, and start over.
//!
//! The stuck threshold equals the raster height and deliberately does
//! NOT scale with the number of unplaced ids; late passes with few ids
//! left reject more draws before giving up than a size-relative bound
//! would allow. Tuning knob, not a guarantee.

use rand::Rng;

use crate::grid::id_distance;
use crate::types::GridSpec;

/// Result of the banded-path construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructOutcome {
    /// Presentation order covering every id in `0..rows*cols` once.
    pub order: Vec<u32>,
    /// True when no attempt completed within the budget and the order
    /// is the grid-scan fallback.
    pub fallback: bool,
    /// Outer attempts consumed (equals the budget on fallback).
    pub attempts: u64,
}

/// The natural grid-scan order, `0..n`.
#[must_use]
pub fn scan_order(n: u32) -> Vec<u32> {
    (0..n).collect()
}

/// Build a separation-banded presentation order.
///
/// Starts from `start` and repeatedly draws a uniformly random
/// unplaced id, appending it when its distance from the last placed id
/// lies strictly inside `(min_distance, max_distance)`. A pass is
/// abandoned once consecutive rejections exceed the raster height;
/// each new attempt restarts from scratch. After `iterations` failed attempts
/// the grid-scan order is returned with the `fallback` flag raised --
/// callers that care must check it.
///
/// `start` must lie in `0..spec.pattern_count()` (validated by the
/// caller's configuration check).
pub fn build_separated_order<R: Rng + ?Sized>(
    spec: GridSpec,
    start: u32,
    min_distance: f64,
    max_distance: f64,
    iterations: u64,
    rng: &mut R,
) -> ConstructOutcome {
    let n = spec.pattern_count();
    let stuck_limit = u64::from(spec.raster_height());

    for attempt in 1..=iterations {
        let mut order = Vec::with_capacity(n as usize);
        order.push(start);
        let mut remaining: Vec<u32> = (0..n).filter(|&id| id != start).collect();
        let mut failures: u64 = 0;

        while !remaining.is_empty() {
            let pick = rng.random_range(0..remaining.len());
            let candidate = remaining[pick];
            let last = order.last().copied().unwrap_or(start);
            let distance = id_distance(last, candidate, spec.cols);

            if min_distance < distance && distance < max_distance {
                order.push(candidate);
                remaining.swap_remove(pick);
                failures = 0;
            } else {
                failures += 1;
                if failures > stuck_limit {
                    break;
                }
            }
        }

        if remaining.is_empty() {
            return ConstructOutcome {
                order,
                fallback: false,
                attempts: attempt,
            };
        }
    }

    ConstructOutcome {
        order: scan_order(n),
        fallback: true,
        attempts: iterations,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use super::*;
    use crate::grid::pair_distances;
    use crate::types::GridSpec;

    fn assert_is_permutation(order: &[u32], n: u32) {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        let expected: Vec<u32> = (0..n).collect();
        assert_eq!(sorted, expected, "order is not a permutation of 0..{n}");
    }

    #[test]
    fn permissive_band_succeeds_on_first_attempt() {
        // Any step fits inside (0, 1000), so one attempt must complete.
        let spec = GridSpec::new(2, 2, 1);
        let mut rng = SmallRng::seed_from_u64(7);
        let outcome = build_separated_order(spec, 0, 0.0, 1000.0, 1, &mut rng);
        assert!(!outcome.fallback);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.order.first(), Some(&0));
        assert_is_permutation(&outcome.order, 4);
    }

    #[test]
    fn adjacent_pairs_stay_inside_the_band() {
        let spec = GridSpec::new(8, 8, 1);
        let (min, max) = (1.5, 10.0);
        let mut rng = SmallRng::seed_from_u64(42);
        let outcome = build_separated_order(spec, 0, min, max, 100_000, &mut rng);
        assert!(!outcome.fallback, "band should be satisfiable on 8x8");
        assert_is_permutation(&outcome.order, 64);
        for gap in pair_distances(&outcome.order, spec.cols) {
            assert!(gap > min && gap < max, "gap {gap} escaped the band");
        }
    }

    #[test]
    fn zero_iterations_forces_scan_fallback() {
        let spec = GridSpec::new(4, 4, 1);
        let mut rng = SmallRng::seed_from_u64(1);
        let outcome = build_separated_order(spec, 5, 0.0, 1000.0, 0, &mut rng);
        assert!(outcome.fallback);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(outcome.order, scan_order(16));
    }

    #[test]
    fn unsatisfiable_band_falls_back_within_budget() {
        // No pair on a 3x3 grid is more than 100 apart.
        let spec = GridSpec::new(3, 3, 1);
        let mut rng = SmallRng::seed_from_u64(9);
        let outcome = build_separated_order(spec, 0, 100.0, 200.0, 50, &mut rng);
        assert!(outcome.fallback);
        assert_eq!(outcome.attempts, 50);
        assert_eq!(outcome.order, scan_order(9));
    }

    #[test]
    fn single_pattern_grid_is_trivially_complete() {
        let spec = GridSpec::new(1, 1, 1);
        let mut rng = SmallRng::seed_from_u64(3);
        let outcome = build_separated_order(spec, 0, 0.0, 10.0, 1, &mut rng);
        assert!(!outcome.fallback);
        assert_eq!(outcome.order, vec![0]);
    }

    #[test]
    fn order_always_starts_with_the_start_pattern() {
        let spec = GridSpec::new(5, 5, 2);
        for seed in 0..5 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let outcome = build_separated_order(spec, 12, 0.5, 8.0, 10_000, &mut rng);
            assert_eq!(outcome.order.first(), Some(&12));
        }
    }

    #[test]
    fn scan_order_enumerates_all_ids() {
        assert_eq!(scan_order(4), vec![0, 1, 2, 3]);
        assert!(scan_order(0).is_empty());
    }
}
