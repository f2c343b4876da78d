//! Shared-weight SIREN layers.
//!
//! Sine-activated affine layers with frequency-aware initialization,
//! used where weights are ordinary (shared across the batch): the basis
//! network of the factorized variant and the sine path of the parameter
//! net. The per-sample shape net never instantiates these — its weights
//! come out of the flat parameter vector.
//!
//! # References
//!
//! - Sitzmann, V., et al. (2020). Implicit neural representations with
//!   periodic activation functions. `NeurIPS`.

use crate::tensor::Tensor;

use super::init::{siren_first_uniform, siren_uniform, truncated_normal};

/// Position of a SIREN layer in its stack; decides the initialization
/// scheme and whether the sine fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirenRole {
    /// First layer: U(-1/fan_in, 1/fan_in), sine-activated.
    First,
    /// Hidden layer: U(-sqrt(6/fan_in)/omega_0, ...), sine-activated.
    Hidden,
    /// Bottleneck: same init as hidden, linear output.
    Bottleneck,
}

/// Sine-activated affine layer: y = sin(omega_0 * (xW) + b)
///
/// The `Bottleneck` role skips the sine and returns the affine map.
pub struct Siren {
    weight: Tensor,
    bias: Tensor,
    omega_0: f32,
    role: SirenRole,
    in_features: usize,
    out_features: usize,
}

impl Siren {
    /// Create a SIREN layer for the given role.
    #[must_use]
    pub fn new(
        in_features: usize,
        out_features: usize,
        role: SirenRole,
        omega_0: f32,
        seed: Option<u64>,
    ) -> Self {
        let shape = [in_features, out_features];
        let weight = match role {
            SirenRole::First => siren_first_uniform(&shape, in_features, seed),
            SirenRole::Hidden | SirenRole::Bottleneck => {
                siren_uniform(&shape, in_features, omega_0, seed)
            }
        };
        let bias = truncated_normal(&[out_features], 0.1, seed.map(|s| s.wrapping_add(1)));

        Self {
            weight,
            bias,
            omega_0,
            role,
            in_features,
            out_features,
        }
    }

    /// Get the input feature dimension.
    #[must_use]
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Get the output feature dimension.
    #[must_use]
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Forward pass.
    #[must_use]
    pub fn forward(&self, input: &Tensor) -> Tensor {
        match self.role {
            SirenRole::Bottleneck => input.matmul(&self.weight).broadcast_add(&self.bias),
            _ => input
                .matmul(&self.weight)
                .mul_scalar(self.omega_0)
                .broadcast_add(&self.bias)
                .sin(),
        }
    }
}

impl std::fmt::Debug for Siren {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Siren")
            .field("in_features", &self.in_features)
            .field("out_features", &self.out_features)
            .field("role", &self.role)
            .field("omega_0", &self.omega_0)
            .finish_non_exhaustive()
    }
}

/// Residual pair of sine layers combined by midpoint averaging:
///
/// ```text
/// h = sin(omega_0 * (uW1) + b1)
/// u ← 0.5 * (u + sin(omega_0 * (hW2) + b2))
/// ```
///
/// Width is preserved so the average is well-formed.
pub struct SirenResBlock {
    first: Siren,
    second: Siren,
    width: usize,
}

impl SirenResBlock {
    /// Create a residual block of the given width.
    #[must_use]
    pub fn new(width: usize, omega_0: f32, seed: Option<u64>) -> Self {
        Self {
            first: Siren::new(width, width, SirenRole::Hidden, omega_0, seed),
            second: Siren::new(
                width,
                width,
                SirenRole::Hidden,
                omega_0,
                seed.map(|s| s.wrapping_add(100)),
            ),
            width,
        }
    }

    /// Get the block width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Forward pass with midpoint residual.
    #[must_use]
    pub fn forward(&self, input: &Tensor) -> Tensor {
        let h = self.first.forward(input);
        input.add(&self.second.forward(&h)).mul_scalar(0.5)
    }
}

impl std::fmt::Debug for SirenResBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SirenResBlock")
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_shape() {
        let layer = Siren::new(2, 8, SirenRole::First, 30.0, Some(42));
        let x = Tensor::ones(&[5, 2]);
        assert_eq!(layer.forward(&x).shape(), &[5, 8]);
    }

    #[test]
    fn test_sine_output_bounded() {
        let layer = Siren::new(3, 16, SirenRole::Hidden, 30.0, Some(42));
        let x = Tensor::new(&[10.0, -20.0, 3.5], &[1, 3]);
        let y = layer.forward(&x);
        for &v in y.data() {
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_bottleneck_is_linear() {
        // A bottleneck layer's output is affine, hence unbounded for a
        // large enough input.
        let layer = Siren::new(1, 4, SirenRole::Bottleneck, 30.0, Some(42));
        let small = layer.forward(&Tensor::new(&[1.0], &[1, 1]));
        let large = layer.forward(&Tensor::new(&[1000.0], &[1, 1]));
        let grew = small
            .data()
            .iter()
            .zip(large.data())
            .any(|(s, l)| l.abs() > s.abs() + 1.0);
        assert!(grew, "bottleneck output should scale with input");
    }

    #[test]
    fn test_resblock_preserves_width() {
        let block = SirenResBlock::new(6, 30.0, Some(42));
        let x = Tensor::ones(&[4, 6]);
        assert_eq!(block.forward(&x).shape(), &[4, 6]);
        assert_eq!(block.width(), 6);
    }

    #[test]
    fn test_resblock_midpoint_bound() {
        // The update is a midpoint: |u_new - u| <= 0.5 * (1 + |u|) since
        // the sine branch is bounded by 1.
        let block = SirenResBlock::new(3, 30.0, Some(42));
        let x = Tensor::new(&[0.5, -0.25, 0.0], &[1, 3]);
        let y = block.forward(&x);
        for (&u_old, &u_new) in x.data().iter().zip(y.data()) {
            assert!((u_new - u_old).abs() <= 0.5 * (1.0 + u_old.abs()) + 1e-6);
        }
    }
}
