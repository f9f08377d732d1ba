use rand::Rng;

/// Draws an index with probability proportional to its weight.
///
/// Returns `None` when the weights do not sum to a finite positive total;
/// callers decide their own fallback for that case.
#[expect(
    clippy::float_arithmetic,
    reason = "weights are real-valued by contract"
)]
pub(crate) fn weighted_index<R>(weights: &[f64], rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let target = rng.gen_range(0.0..total);
    cumulative_pick(weights, target)
}

/// Index of the first weight whose running sum reaches `target`.
///
/// Floating-point rounding can leave `target` above the final running sum;
/// the last index is returned in that case.
#[expect(
    clippy::float_arithmetic,
    reason = "weights are real-valued by contract"
)]
pub(super) fn cumulative_pick(weights: &[f64], target: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative >= target {
            return Some(index);
        }
    }
    weights.len().checked_sub(1)
}
