// ============================================================
// Layer 4 — Seeded Splitters
// ============================================================
// Two ways of cutting a shuffled list in two:
//
//   split_heldout    — first `n` items after shuffling are held
//                      out, the rest are training data
//                      (articles for the `split` command)
//   split_train_val  — the first floor(len * val_fraction)
//                      items are validation, the rest training
//                      (whole hypothesis records for `train`, so
//                      the tokens of one record never straddle
//                      the split)
//
// Both shuffle with StdRng::seed_from_u64(seed), so a given
// seed always selects the same items.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom
// which is the standard unbiased shuffle algorithm.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle in place with a deterministic RNG
pub fn shuffle_seeded<T>(items: &mut [T], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
}

/// Shuffle `items` and split off the first `n` (clamped to the length).
///
/// # Returns
/// A tuple (heldout, rest)
pub fn split_heldout<T>(mut items: Vec<T>, n: usize, seed: u64) -> (Vec<T>, Vec<T>) {
    shuffle_seeded(&mut items, seed);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let n = n.min(items.len());
    let rest = items.split_off(n);

    tracing::debug!("Held out {} items, {} remain", items.len(), rest.len());
    (items, rest)
}

/// Shuffle `samples` and split into (train, validation).
///
/// # Arguments
/// * `samples`      - All available samples (consumed by this function)
/// * `val_fraction` - Proportion for validation, e.g. 0.2 = 20%
/// * `seed`         - Shuffle seed
pub fn split_train_val<T>(samples: Vec<T>, val_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let total = samples.len();
    // floor, like int(len * 0.2)
    let val_len = ((total as f64) * val_fraction).floor() as usize;

    let (val, train) = split_heldout(samples, val_len, seed);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        train.len(),
        val.len(),
        (train.len() * 100) / total.max(1),
        (val.len() * 100) / total.max(1),
    );

    (train, val)
}
