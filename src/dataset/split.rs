use std::collections::BTreeMap;

use rand::seq::{index, SliceRandom};
use rand::Rng;

use super::Label;
use crate::error::{Error, Result};

/// Distribute `n_draws` over the classes proportional to `class_counts`
///
/// Every class first receives the floor of its share. The remaining draws go to the classes
/// with the largest remainders; classes tied on a remainder are picked at random.
fn approximate_mode<R: Rng>(class_counts: &[usize], n_draws: usize, rng: &mut R) -> Vec<usize> {
    let total = class_counts.iter().sum::<usize>() as f64;
    let continuous = class_counts
        .iter()
        .map(|c| *c as f64 * n_draws as f64 / total)
        .collect::<Vec<_>>();

    let mut floored = continuous.iter().map(|x| x.floor() as usize).collect::<Vec<_>>();
    let mut need_to_add = n_draws.saturating_sub(floored.iter().sum());

    let remainder = continuous
        .iter()
        .zip(floored.iter())
        .map(|(c, f)| c - *f as f64)
        .collect::<Vec<_>>();

    let mut values = remainder.clone();
    values.sort_by(|a, b| b.total_cmp(a));
    values.dedup();

    for value in values {
        if need_to_add == 0 {
            break;
        }

        let candidates = remainder
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == value)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();

        let add_now = candidates.len().min(need_to_add);
        for pos in index::sample(rng, candidates.len(), add_now) {
            floored[candidates[pos]] += 1;
        }
        need_to_add -= add_now;
    }

    floored
}

/// Split sample indices into a training and a test partition, preserving class proportions
///
/// The test partition holds `ceil(test_fraction * n)` samples, the training partition the rest.
/// Per-class training counts are allocated first by largest remainder, test counts are then
/// allocated from what is left of each class. Within each class the rows are shuffled, and both
/// partitions are shuffled once more before returning.
///
/// Fails if a class has a single member or if either partition is smaller than the number of
/// classes.
pub fn stratified_split_indices<L: Label, R: Rng>(
    labels: &[L],
    test_fraction: f64,
    rng: &mut R,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::Parameters(format!(
            "test fraction should be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n_samples = labels.len();
    let n_test = (test_fraction * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);

    // sorted classes, rows of every class kept in original order
    let mut class_indices: BTreeMap<&L, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        class_indices.entry(label).or_default().push(idx);
    }
    let class_indices = class_indices.into_values().collect::<Vec<_>>();
    let class_counts = class_indices.iter().map(|x| x.len()).collect::<Vec<_>>();
    let n_classes = class_counts.len();

    if class_counts.iter().any(|c| *c < 2) {
        return Err(Error::NotEnoughSamples(
            "the least populated class has only one member, at least two are needed to stratify"
                .into(),
        ));
    }
    if n_train < n_classes {
        return Err(Error::NotEnoughSamples(format!(
            "training partition of {} samples is smaller than the number of classes {}",
            n_train, n_classes
        )));
    }
    if n_test < n_classes {
        return Err(Error::NotEnoughSamples(format!(
            "test partition of {} samples is smaller than the number of classes {}",
            n_test, n_classes
        )));
    }

    let n_i = approximate_mode(&class_counts, n_train, rng);
    let remaining = class_counts
        .iter()
        .zip(n_i.iter())
        .map(|(c, n)| c - n)
        .collect::<Vec<_>>();
    let t_i = approximate_mode(&remaining, n_test, rng);

    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (mut rows, (n, t)) in class_indices.into_iter().zip(n_i.into_iter().zip(t_i)) {
        rows.shuffle(rng);
        train.extend_from_slice(&rows[..n]);
        test.extend_from_slice(&rows[n..n + t]);
    }

    train.shuffle(rng);
    test.shuffle(rng);

    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn largest_remainder_allocation() {
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(approximate_mode(&[70, 30], 80, &mut rng), vec![56, 24]);
        assert_eq!(approximate_mode(&[5, 5], 3, &mut rng).iter().sum::<usize>(), 3);
        // remainders of 1/3 and 2/3, the larger one receives the extra draw
        assert_eq!(approximate_mode(&[6, 3], 5, &mut rng), vec![3, 2]);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let mut rng = StdRng::seed_from_u64(13);
        let labels = (0..57).map(|i| i % 3).collect::<Vec<usize>>();

        let (train, test) = stratified_split_indices(&labels, 0.2, &mut rng).unwrap();
        assert_eq!(test.len(), 12);
        assert_eq!(train.len(), 45);

        let mut all = train.iter().chain(test.iter()).copied().collect::<Vec<_>>();
        all.sort_unstable();
        assert_eq!(all, (0..57).collect::<Vec<_>>());
    }

    #[test]
    fn deterministic_for_seed() {
        let labels = (0..40).map(|i| i % 4 == 0).collect::<Vec<_>>();

        let a = stratified_split_indices(&labels, 0.25, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = stratified_split_indices(&labels, 0.25, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn singleton_class_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let labels = vec![0usize, 0, 0, 0, 1];

        assert!(stratified_split_indices(&labels, 0.2, &mut rng).is_err());
    }

    #[test]
    fn invalid_fraction() {
        let mut rng = StdRng::seed_from_u64(0);
        let labels = vec![0usize, 1, 0, 1];

        assert!(matches!(
            stratified_split_indices(&labels, 1.5, &mut rng),
            Err(Error::Parameters(_))
        ));
    }
}
