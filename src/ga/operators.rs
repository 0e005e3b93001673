//! Permutation-level genetic operators.
//!
//! These operate on `&[usize]` city orders and know nothing about cities or
//! costs. [`Population`](super::Population) composes them into the
//! generation pipeline.
//!
//! # Crossover
//!
//! - [`splice`]: single-point crossover producing two children whose
//!   duplicates and omissions are then repaired by [`normalize`]
//!
//! # Mutation
//!
//! - [`swap_pairs`]: swap disjoint random position pairs
//! - [`mutation_swap_count`]: how many pairs a mutation rate translates to

use rand::seq::index;
use rand::Rng;

// ============================================================================
// Crossover
// ============================================================================

/// Single-point splice of two parents at `split`.
///
/// Returns `(a[..split] ++ b[split..], b[..split] ++ a[split..])`. The
/// children are generally not permutations; see [`normalize`].
///
/// `split` is clamped to the shorter parent.
pub fn splice(a: &[usize], b: &[usize], split: usize) -> (Vec<usize>, Vec<usize>) {
    let split = split.min(a.len()).min(b.len());

    let mut ab = Vec::with_capacity(b.len());
    ab.extend_from_slice(&a[..split]);
    ab.extend_from_slice(&b[split..]);

    let mut ba = Vec::with_capacity(a.len());
    ba.extend_from_slice(&b[..split]);
    ba.extend_from_slice(&a[split..]);

    (ab, ba)
}

/// [`splice`] at a split point drawn uniformly from `0..len`.
pub fn random_splice<R: Rng>(a: &[usize], b: &[usize], rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let n = a.len().min(b.len());
    if n == 0 {
        return (b.to_vec(), a.to_vec());
    }
    let split = rng.random_range(0..n);
    splice(a, b, split)
}

/// Repairs a sequence into a permutation of `0..seq.len()`.
///
/// For each missing value, in ascending order, a value that still occurs
/// more than once is picked at random and one of its occurrences, also
/// picked at random, is overwritten with the missing value. Positions that
/// hold a unique value are never touched. Out-of-range values are replaced
/// before any duplicate.
///
/// # Complexity
/// O(n) time, O(n) space
pub fn normalize<R: Rng>(seq: &mut [usize], rng: &mut R) {
    let n = seq.len();
    let mut occurrences: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut stray = Vec::new();

    for (pos, &value) in seq.iter().enumerate() {
        match occurrences.get_mut(value) {
            Some(positions) => positions.push(pos),
            None => stray.push(pos),
        }
    }

    let missing: Vec<usize> = (0..n).filter(|&v| occurrences[v].is_empty()).collect();
    let mut duplicated: Vec<Vec<usize>> = occurrences
        .into_iter()
        .filter(|positions| positions.len() > 1)
        .collect();

    // Every missing value is matched by exactly one stray or surplus
    // occurrence, so neither pool runs dry before `missing` does.
    for value in missing {
        if let Some(pos) = stray.pop() {
            seq[pos] = value;
            continue;
        }
        if duplicated.is_empty() {
            break;
        }
        let row = rng.random_range(0..duplicated.len());
        let positions = &mut duplicated[row];
        let pos = positions.swap_remove(rng.random_range(0..positions.len()));
        seq[pos] = value;
        if positions.len() < 2 {
            duplicated.swap_remove(row);
        }
    }
}

// ============================================================================
// Mutation
// ============================================================================

/// Samples an effective mutation rate `mean + uniform(-1, 1) * deviation`.
pub fn sample_mutation_rate<R: Rng>(mean: f64, deviation: f64, rng: &mut R) -> f64 {
    mean + rng.random_range(-1.0f64..1.0) * deviation
}

/// Number of position pairs to swap for a mutation `rate` over
/// `city_count` cities.
///
/// `round(rate * (city_count / 2))`, clamped to `[0, city_count / 2]`.
pub fn mutation_swap_count(rate: f64, city_count: usize) -> usize {
    let half = city_count / 2;
    let count = (rate * half as f64).round();
    if count >= 1.0 {
        (count as usize).min(half)
    } else {
        0
    }
}

/// Swaps `swap_count` disjoint pairs of random positions.
///
/// Positions come from a random sample without replacement consumed two at
/// a time, so no position takes part in more than one swap. The count is
/// clamped to `perm.len() / 2`.
pub fn swap_pairs<R: Rng>(perm: &mut [usize], swap_count: usize, rng: &mut R) {
    let swap_count = swap_count.min(perm.len() / 2);
    if swap_count == 0 {
        return;
    }
    let positions = index::sample(rng, perm.len(), swap_count * 2).into_vec();
    for pair in positions.chunks_exact(2) {
        perm.swap(pair[0], pair[1]);
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Whether `perm` is a permutation of `0..n`.
pub fn is_permutation(perm: &[usize], n: usize) -> bool {
    if perm.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &v in perm {
        if v >= n || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    // ---- Splice ----

    #[test]
    fn test_splice_halves() {
        let a = vec![0, 1, 2, 3, 4, 5];
        let b = vec![5, 4, 3, 2, 1, 0];
        let (ab, ba) = splice(&a, &b, 2);
        assert_eq!(ab, vec![0, 1, 3, 2, 1, 0]);
        assert_eq!(ba, vec![5, 4, 2, 3, 4, 5]);
    }

    #[test]
    fn test_splice_at_zero_swaps_parents() {
        let a = vec![0, 1, 2];
        let b = vec![2, 0, 1];
        let (ab, ba) = splice(&a, &b, 0);
        assert_eq!(ab, b);
        assert_eq!(ba, a);
    }

    #[test]
    fn test_random_splice_lengths() {
        let mut rng = create_rng(42);
        let a: Vec<usize> = (0..9).collect();
        let b: Vec<usize> = (0..9).rev().collect();
        for _ in 0..50 {
            let (ab, ba) = random_splice(&a, &b, &mut rng);
            assert_eq!(ab.len(), 9);
            assert_eq!(ba.len(), 9);
        }
    }

    // ---- Normalize ----

    #[test]
    fn test_normalize_table() {
        let mut rng = create_rng(42);
        let table = [
            vec![0, 1, 2, 3, 4, 5],
            vec![5, 4, 3, 2, 1, 0],
            vec![1, 2, 3, 2, 5, 0],
            vec![1, 1, 1, 1, 1, 1],
            vec![2, 3, 1, 4, 5, 1],
        ];
        for row in table {
            let mut repaired = row.clone();
            normalize(&mut repaired, &mut rng);
            assert!(
                is_permutation(&repaired, row.len()),
                "{row:?} -> {repaired:?}"
            );
        }
    }

    #[test]
    fn test_normalize_keeps_unique_positions() {
        let mut rng = create_rng(7);
        for _ in 0..20 {
            let mut seq = vec![2, 1, 3, 3];
            normalize(&mut seq, &mut rng);
            assert_eq!(&seq[..2], &[2, 1]);
            assert!(seq == vec![2, 1, 0, 3] || seq == vec![2, 1, 3, 0]);
        }
    }

    #[test]
    fn test_normalize_permutation_untouched() {
        let mut rng = create_rng(1);
        let mut seq = vec![3, 0, 2, 1];
        normalize(&mut seq, &mut rng);
        assert_eq!(seq, vec![3, 0, 2, 1]);
    }

    #[test]
    fn test_normalize_out_of_range_values() {
        let mut rng = create_rng(3);
        let mut seq = vec![0, 9, 1, 7];
        normalize(&mut seq, &mut rng);
        assert!(is_permutation(&seq, 4), "{seq:?}");
        assert_eq!(seq[0], 0);
        assert_eq!(seq[2], 1);
    }

    #[test]
    fn test_normalize_empty() {
        let mut rng = create_rng(3);
        let mut seq: Vec<usize> = Vec::new();
        normalize(&mut seq, &mut rng);
        assert!(seq.is_empty());
    }

    // ---- Mutation ----

    #[test]
    fn test_swap_count_rounding_and_clamp() {
        assert_eq!(mutation_swap_count(0.0, 10), 0);
        assert_eq!(mutation_swap_count(0.5, 10), 3); // round(2.5)
        assert_eq!(mutation_swap_count(1.0, 10), 5);
        assert_eq!(mutation_swap_count(1.8, 10), 5);
        assert_eq!(mutation_swap_count(-0.4, 10), 0);
        assert_eq!(mutation_swap_count(0.05, 10), 0);
        assert_eq!(mutation_swap_count(1.0, 7), 3);
    }

    #[test]
    fn test_zero_rate_zero_deviation_swaps_nothing() {
        let mut rng = create_rng(42);
        for _ in 0..20 {
            let rate = sample_mutation_rate(0.0, 0.0, &mut rng);
            assert_eq!(mutation_swap_count(rate, 16), 0);
        }
    }

    #[test]
    fn test_sample_rate_within_deviation() {
        let mut rng = create_rng(42);
        for _ in 0..1000 {
            let rate = sample_mutation_rate(0.5, 0.25, &mut rng);
            assert!((0.25..0.75).contains(&rate), "{rate}");
        }
    }

    #[test]
    fn test_swap_pairs_changes_exact_positions() {
        let mut rng = create_rng(42);
        for swaps in 1..=5 {
            let mut perm: Vec<usize> = (0..10).collect();
            swap_pairs(&mut perm, swaps, &mut rng);
            assert!(is_permutation(&perm, 10));
            let moved = perm.iter().enumerate().filter(|&(i, &v)| i != v).count();
            assert_eq!(moved, swaps * 2, "disjoint swaps move 2 positions each");
        }
    }

    #[test]
    fn test_swap_pairs_zero_is_noop() {
        let mut rng = create_rng(42);
        let mut perm: Vec<usize> = (0..6).collect();
        swap_pairs(&mut perm, 0, &mut rng);
        assert_eq!(perm, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_swap_pairs_clamped() {
        let mut rng = create_rng(42);
        let mut perm = vec![0, 1, 2];
        swap_pairs(&mut perm, 10, &mut rng);
        assert!(is_permutation(&perm, 3));
    }

    // ---- Helpers ----

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(!is_permutation(&[2, 0, 0], 3));
        assert!(!is_permutation(&[2, 0, 3], 3));
        assert!(!is_permutation(&[0, 1], 3));
        assert!(is_permutation(&[], 0));
    }

    // ---- Properties ----

    proptest! {
        #[test]
        fn prop_normalize_yields_permutation(
            seq in (1usize..40).prop_flat_map(|n| prop::collection::vec(0..n, n)),
            seed in any::<u64>(),
        ) {
            let mut rng = create_rng(seed);
            let mut repaired = seq.clone();
            normalize(&mut repaired, &mut rng);
            prop_assert!(is_permutation(&repaired, seq.len()));

            // Values that occurred exactly once stay where they were.
            for (pos, &v) in seq.iter().enumerate() {
                if seq.iter().filter(|&&w| w == v).count() == 1 {
                    prop_assert_eq!(repaired[pos], v);
                }
            }
        }

        #[test]
        fn prop_spliced_children_repair_to_permutations(
            n in 1usize..30,
            seed in any::<u64>(),
        ) {
            let mut rng = create_rng(seed);
            let mut a: Vec<usize> = (0..n).collect();
            let mut b: Vec<usize> = (0..n).collect();
            rand::seq::SliceRandom::shuffle(a.as_mut_slice(), &mut rng);
            rand::seq::SliceRandom::shuffle(b.as_mut_slice(), &mut rng);

            let (mut ab, mut ba) = random_splice(&a, &b, &mut rng);
            normalize(&mut ab, &mut rng);
            normalize(&mut ba, &mut rng);
            prop_assert!(is_permutation(&ab, n));
            prop_assert!(is_permutation(&ba, n));
        }
    }
}
