//! Seeded stratified train/test split
//!
//! Groups row indices by class, shuffles each group with the fixed seed,
//! and slices a test partition per class so both partitions keep the
//! label balance of the whole dataset.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Split row indices into (train, test) stratified by label.
///
/// Each class contributes `max(1, round(len * test_ratio))` rows to the
/// test partition, capped so at least one row per class stays in train.
/// Returned index lists are sorted; the same seed reproduces the same
/// split.
pub fn stratified_split(labels: &[u8], test_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for indices in by_class.values() {
        let mut indices = indices.clone();
        indices.shuffle(&mut rng);

        let want = ((indices.len() as f64) * test_ratio).round().max(1.0) as usize;
        let take = want.min(indices.len().saturating_sub(1));
        let split_point = indices.len() - take;
        train.extend_from_slice(&indices[..split_point]);
        test.extend_from_slice(&indices[split_point..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
