//! Shape-unit pruning for the terminal hyper layer.
//!
//! The terminal layer's weight matrix is `[latent, po_dim]`: each column
//! generates one scalar of the flat parameter vector, so a column inside
//! the weight-slice block feeds exactly one shape-net connection. Pruning
//! therefore operates on whole columns — scoring is restricted to the
//! weight-slice block `[0, weight_cols)` (bias columns are never
//! touched), each column is scored by its mean raw value across rows, and
//! the `round(s · weight_cols)` lowest columns are zeroed across *all*
//! rows.
//!
//! As with magnitude pruning, the score is the signed mean, not mean
//! |value| — the most negative columns die first, mirroring the original
//! system; flagged in the design notes alongside the signed magnitude
//! ranking.

use std::cmp::Ordering;

use crate::layout::ParameterLayout;
use crate::nn::MaskedDense;

use super::error::PruningError;
use super::PruneReport;

/// Zero whole weight-slice columns of the terminal layer.
///
/// Fails before touching the mask if `sparsity` is outside `[0, 1]` or
/// the layer's output width disagrees with the layout's `po_dim`.
pub fn prune_shape_units(
    layer: &mut MaskedDense,
    layout: &ParameterLayout,
    sparsity: f32,
) -> Result<PruneReport, PruningError> {
    super::validate_sparsity(sparsity)?;

    let (rows, cols) = (layer.in_features(), layer.out_features());
    if cols != layout.po_dim() {
        return Err(PruningError::LayoutMismatch {
            expected: layout.po_dim(),
            actual: cols,
        });
    }

    let weight_cols = layout.weight_cols();
    let k = (f64::from(sparsity) * weight_cols as f64).round() as usize;

    // Mean raw value per column, weight-slice block only.
    let data = layer.weight().data();
    let mut scores: Vec<(usize, f32)> = (0..weight_cols)
        .map(|c| {
            let sum: f32 = (0..rows).map(|r| data[r * cols + c]).sum();
            (c, sum / rows as f32)
        })
        .collect();
    scores.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    // Broadcast the column choice to every row.
    let mut indices = Vec::with_capacity(k * rows);
    for &(col, _) in scores.iter().take(k) {
        for r in 0..rows {
            indices.push(r * cols + col);
        }
    }
    layer.mask_mut().disable(&indices)?;

    let mask = layer.mask();
    Ok(PruneReport {
        zeroed: mask.num_zeros(),
        total: rows * cols,
        sparsity: mask.sparsity(),
        mask_version: mask.version(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Connectivity, ShapeNetConfig};
    use crate::tensor::Tensor;

    fn layout() -> ParameterLayout {
        // si=1, so=1, n=2, l=0, plain: po = (1+1+1)*2 + 1 = 7, weight_cols = 4
        ParameterLayout::new(&ShapeNetConfig {
            input_dim: 1,
            output_dim: 1,
            units: 2,
            nlayers: 0,
            activation: "sine".to_string(),
            use_resblock: false,
            connectivity: Connectivity::Full,
            omega_0: 30.0,
        })
        .unwrap()
    }

    fn terminal_layer(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f32) -> MaskedDense {
        let data: Vec<f32> = (0..rows * cols)
            .map(|i| f(i / cols, i % cols))
            .collect();
        MaskedDense::from_parts(
            Tensor::new(&data, &[rows, cols]),
            Tensor::zeros(&[cols]),
            None,
        )
    }

    #[test]
    fn test_columns_die_whole() {
        let layout = layout();
        // Column c has constant value c - 1 (so column 0 is most negative).
        let mut layer = terminal_layer(3, 7, |_, c| c as f32 - 1.0);
        prune_shape_units(&mut layer, &layout, 0.5).unwrap();

        // k = round(0.5 * 4) = 2 → columns 0 and 1 die in every row.
        let mask = layer.mask().snapshot();
        for r in 0..3 {
            assert_eq!(mask.data()[r * 7], 0.0);
            assert_eq!(mask.data()[r * 7 + 1], 0.0);
            assert_eq!(mask.data()[r * 7 + 2], 1.0);
        }
    }

    #[test]
    fn test_bias_columns_never_pruned() {
        let layout = layout();
        // Make the bias columns (4..7) the most negative of all; they
        // must still survive because scoring stops at weight_cols.
        let mut layer = terminal_layer(2, 7, |_, c| if c >= 4 { -100.0 } else { c as f32 });
        prune_shape_units(&mut layer, &layout, 1.0).unwrap();

        let mask = layer.mask().snapshot();
        for r in 0..2 {
            // Entire weight block gone...
            for c in 0..4 {
                assert_eq!(mask.data()[r * 7 + c], 0.0);
            }
            // ...bias columns intact.
            for c in 4..7 {
                assert_eq!(mask.data()[r * 7 + c], 1.0);
            }
        }
    }

    #[test]
    fn test_column_mean_decides() {
        let layout = layout();
        // Column 2 has the lowest mean even though one of its entries is
        // large: [-10, 4] → mean -3.
        let mut layer = terminal_layer(2, 7, |r, c| match (r, c) {
            (0, 2) => -10.0,
            (1, 2) => 4.0,
            _ => 1.0,
        });
        prune_shape_units(&mut layer, &layout, 0.25).unwrap();

        // k = round(0.25 * 4) = 1 → exactly column 2.
        let mask = layer.mask().snapshot();
        for r in 0..2 {
            for c in 0..7 {
                let expected = if c == 2 { 0.0 } else { 1.0 };
                assert_eq!(mask.data()[r * 7 + c], expected, "row {r} col {c}");
            }
        }
    }

    #[test]
    fn test_nested_under_growing_sparsity() {
        let layout = layout();
        let mut layer = terminal_layer(3, 7, |r, c| (c as f32) * 0.5 - (r as f32) * 0.01);
        prune_shape_units(&mut layer, &layout, 0.25).unwrap();
        let before: Vec<usize> = pruned_columns(&layer, 7);

        prune_shape_units(&mut layer, &layout, 0.75).unwrap();
        let after: Vec<usize> = pruned_columns(&layer, 7);

        for col in &before {
            assert!(after.contains(col), "column {col} resurrected");
        }
        assert!(after.len() > before.len());
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let layout = layout();
        let mut layer = terminal_layer(2, 9, |_, _| 1.0);
        let err = prune_shape_units(&mut layer, &layout, 0.5).unwrap_err();
        assert!(matches!(
            err,
            PruningError::LayoutMismatch {
                expected: 7,
                actual: 9
            }
        ));
        assert_eq!(layer.mask().num_zeros(), 0);
    }

    #[test]
    fn test_sparsity_out_of_range() {
        let layout = layout();
        let mut layer = terminal_layer(2, 7, |_, _| 1.0);
        assert!(prune_shape_units(&mut layer, &layout, 2.0).is_err());
        assert_eq!(layer.mask().version(), 0);
    }

    fn pruned_columns(layer: &MaskedDense, cols: usize) -> Vec<usize> {
        let mask = layer.mask().snapshot();
        (0..cols)
            .filter(|&c| mask.data()[c] == 0.0)
            .collect()
    }
}
