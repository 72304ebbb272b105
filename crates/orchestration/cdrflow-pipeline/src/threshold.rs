//! Per-worker randomized rotation thresholds.

use rand::Rng;

/// Draws the rotation threshold for one worker.
///
/// The threshold is the nominal `section_size` plus a jitter of up to
/// `spread` (as a fraction of the section size). Workers with even ids
/// subtract the jitter and workers with odd ids add it, so with the
/// default spread half the fleet rotates early and half rotates late,
/// spreading durable writes out in time instead of having every worker
/// flush in lockstep.
///
/// The draw happens once per worker at startup; the threshold is fixed for
/// the worker's lifetime. A `spread` of 0.0 disables the jitter entirely,
/// which is what deterministic tests use.
pub fn randomized_threshold<R: Rng + ?Sized>(
    section_size: usize,
    spread: f64,
    worker_id: usize,
    rng: &mut R,
) -> usize {
    let max_cut = (section_size as f64 * spread) as i64;
    if max_cut == 0 {
        return section_size.max(1);
    }

    let min_cut = max_cut / 10;
    let mut cut = rng.random_range(min_cut..=max_cut);
    if worker_id % 2 == 0 {
        cut = -cut;
    }
    (section_size as i64 + cut).max(1) as usize
}
