use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::model::RawRecord;

// ---------------------------------------------------------------------------
// Deterministic fixed-fraction sampling, applied per source partition
// ---------------------------------------------------------------------------

/// Default fraction of each region's records drawn for regression
/// (targets roughly 2.5M of 18M nationwide rows).
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.14;

/// Default RNG seed, shared by every partition so reruns are reproducible.
pub const DEFAULT_SEED: u64 = 42;

/// Draw `round(n * fraction)` records without replacement, ties to even
/// (the rounding pandas' fractional `sample` applies).
///
/// The RNG is seeded fresh per call, so sampling the same partition with the
/// same seed always selects the same rows. Input order is preserved.
pub fn sample_fraction(records: Vec<RawRecord>, fraction: f64, seed: u64) -> Vec<RawRecord> {
    let take = (records.len() as f64 * fraction.clamp(0.0, 1.0)).round_ties_even() as usize;
    if take >= records.len() {
        return records;
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut keep = vec![false; records.len()];
    for idx in rand::seq::index::sample(&mut rng, records.len(), take) {
        keep[idx] = true;
    }
    records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, kept)| kept.then_some(record))
        .collect()
}
