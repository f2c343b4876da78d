//! Magnitude pruning for non-terminal parameter-net layers.
//!
//! Ranks the raw signed weight values ascending and zeroes the mask at
//! the `round(s · rows · cols)` lowest entries. Note the ranking is by
//! *value*, not |value| — the most negative weights die first. This
//! reproduces the behavior of the system this crate reimplements and is
//! intentionally not "smallest magnitude" literally; revisit if a true
//! magnitude criterion is ever wanted.
//!
//! The ranking reads the raw weights (never the masked product), so
//! repeating a prune at the same sparsity reselects the same entries and
//! the mask is unchanged — the operation is idempotent per sparsity
//! level and monotone as sparsity grows.

use std::cmp::Ordering;

use crate::nn::MaskedDense;

use super::error::PruningError;
use super::PruneReport;

/// Zero the mask at the `round(s · numel)` lowest-valued weight entries.
///
/// Fails before touching the mask if `sparsity` is outside `[0, 1]`.
pub fn prune_low_magnitude(
    layer: &mut MaskedDense,
    sparsity: f32,
) -> Result<PruneReport, PruningError> {
    super::validate_sparsity(sparsity)?;

    let weight: Vec<f32> = layer.weight().data().to_vec();
    let numel = weight.len();
    let k = (f64::from(sparsity) * numel as f64).round() as usize;

    // Ascending by signed value; index-stable for ties.
    let mut order: Vec<usize> = (0..numel).collect();
    order.sort_by(|&a, &b| {
        weight[a]
            .partial_cmp(&weight[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    layer.mask_mut().disable(&order[..k])?;

    let mask = layer.mask();
    Ok(PruneReport {
        zeroed: mask.num_zeros(),
        total: numel,
        sparsity: mask.sparsity(),
        mask_version: mask.version(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;

    fn layer_with_weights(data: &[f32], rows: usize, cols: usize) -> MaskedDense {
        MaskedDense::from_parts(
            Tensor::new(data, &[rows, cols]),
            Tensor::zeros(&[cols]),
            None,
        )
    }

    #[test]
    fn test_zero_count_matches_round() {
        let mut layer = layer_with_weights(&[0.4, -0.1, 0.3, 0.2, -0.5, 0.6], 2, 3);
        let report = prune_low_magnitude(&mut layer, 0.5).unwrap();
        // round(0.5 * 6) = 3
        assert_eq!(report.zeroed, 3);
        assert_eq!(report.total, 6);
        assert!((report.sparsity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_most_negative_die_first() {
        // A large-magnitude positive weight survives while small negative
        // ones die: the ranking is by signed value.
        let mut layer = layer_with_weights(&[9.0, -0.1, -0.2, 0.05], 2, 2);
        prune_low_magnitude(&mut layer, 0.5).unwrap();

        let mask = layer.mask().snapshot().data().to_vec();
        assert_eq!(mask[0], 1.0); // 9.0 kept
        assert_eq!(mask[1], 0.0); // -0.1 pruned
        assert_eq!(mask[2], 0.0); // -0.2 pruned
        assert_eq!(mask[3], 1.0); // 0.05 kept
    }

    #[test]
    fn test_idempotent_at_fixed_sparsity() {
        let mut layer = layer_with_weights(&[0.4, -0.1, 0.3, 0.2, -0.5, 0.6], 2, 3);
        let first = prune_low_magnitude(&mut layer, 0.5).unwrap();
        let snapshot = layer.mask().snapshot().data().to_vec();

        let second = prune_low_magnitude(&mut layer, 0.5).unwrap();
        assert_eq!(second.zeroed, first.zeroed);
        assert_eq!(layer.mask().snapshot().data(), snapshot.as_slice());
        // The version still advances: a prune happened, it just changed
        // nothing.
        assert_eq!(second.mask_version, first.mask_version + 1);
    }

    #[test]
    fn test_monotone_in_sparsity() {
        let mut layer = layer_with_weights(&[0.4, -0.1, 0.3, 0.2, -0.5, 0.6], 2, 3);
        prune_low_magnitude(&mut layer, 0.3).unwrap();
        let before: Vec<f32> = layer.mask().snapshot().data().to_vec();

        prune_low_magnitude(&mut layer, 0.7).unwrap();
        let after = layer.mask().snapshot().data();

        // Every previously pruned entry stays pruned.
        for (b, a) in before.iter().zip(after) {
            if *b == 0.0 {
                assert_eq!(*a, 0.0);
            }
        }
        assert!(layer.mask().num_zeros() > before.iter().filter(|&&v| v == 0.0).count());
    }

    #[test]
    fn test_sparsity_out_of_range() {
        let mut layer = layer_with_weights(&[1.0, 2.0], 1, 2);
        assert!(prune_low_magnitude(&mut layer, 1.5).is_err());
        assert!(prune_low_magnitude(&mut layer, -0.1).is_err());
        // Failed prune left the mask untouched.
        assert_eq!(layer.mask().num_zeros(), 0);
        assert_eq!(layer.mask().version(), 0);
    }

    #[test]
    fn test_full_sparsity_zeroes_everything() {
        let mut layer = layer_with_weights(&[1.0, -1.0, 2.0, -2.0], 2, 2);
        let report = prune_low_magnitude(&mut layer, 1.0).unwrap();
        assert_eq!(report.zeroed, 4);
        assert!((report.sparsity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_sparsity_is_noop() {
        let mut layer = layer_with_weights(&[1.0, -1.0], 1, 2);
        let report = prune_low_magnitude(&mut layer, 0.0).unwrap();
        assert_eq!(report.zeroed, 0);
    }
}
