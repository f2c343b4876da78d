//! Fully connected layer with a persistent sparsity mask.
//!
//! Implements y = act(x(W ∘ M) + b) with weight shape `[in, out]`, so a
//! weight *column* is one output unit. The mask M starts all-ones and is
//! narrowed only by the pruning operations; the forward pass always reads
//! the current snapshot, so pruned connections contribute exactly zero.

use crate::pruning::Mask;
use crate::tensor::Tensor;

use super::init::truncated_normal;
use super::Activation;

/// Masked dense layer: y = act(x(W ∘ M) + b)
///
/// # Shape
///
/// - Input: `[batch, in_features]`
/// - Output: `[batch, out_features]`
///
/// # Example
///
/// ```
/// use flujo::nn::{Activation, MaskedDense};
/// use flujo::tensor::Tensor;
///
/// let layer = MaskedDense::new(4, 8, Some(Activation::Swish), Some(42));
/// let x = Tensor::ones(&[3, 4]);
/// let y = layer.forward(&x);
/// assert_eq!(y.shape(), &[3, 8]);
/// ```
pub struct MaskedDense {
    /// Weight matrix, shape: [in_features, out_features]
    weight: Tensor,

    /// Bias vector, shape: [out_features]
    bias: Tensor,

    /// Persistent sparsity mask, shape: [in_features, out_features]
    mask: Mask,

    /// Optional nonlinearity (the bottleneck and terminal layers are linear)
    activation: Option<Activation>,

    in_features: usize,
    out_features: usize,
}

impl MaskedDense {
    /// Create a masked dense layer with truncated-normal initialization
    /// (stddev 0.1), the hypernetwork default.
    #[must_use]
    pub fn new(
        in_features: usize,
        out_features: usize,
        activation: Option<Activation>,
        seed: Option<u64>,
    ) -> Self {
        let weight = truncated_normal(&[in_features, out_features], 0.1, seed);
        let bias = truncated_normal(&[out_features], 0.1, seed.map(|s| s.wrapping_add(1)));

        Self {
            weight,
            bias,
            mask: Mask::dense(&[in_features, out_features]),
            activation,
            in_features,
            out_features,
        }
    }

    /// Create a layer with externally supplied weight and bias.
    ///
    /// # Panics
    ///
    /// Panics if the weight is not `[in, out]` 2-D or the bias length
    /// doesn't match the weight's column count.
    #[must_use]
    pub fn from_parts(weight: Tensor, bias: Tensor, activation: Option<Activation>) -> Self {
        assert_eq!(weight.ndim(), 2, "weight must be [in, out]");
        let (in_features, out_features) = (weight.shape()[0], weight.shape()[1]);
        assert_eq!(
            bias.numel(),
            out_features,
            "bias length {} must match weight columns {}",
            bias.numel(),
            out_features
        );

        Self {
            mask: Mask::dense(&[in_features, out_features]),
            weight,
            bias,
            activation,
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

    /// Get reference to the weight tensor.
    #[must_use]
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Get reference to the bias tensor.
    #[must_use]
    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    /// Replace the weight tensor (shape must match).
    pub fn set_weight(&mut self, weight: Tensor) {
        assert_eq!(
            weight.shape(),
            &[self.in_features, self.out_features],
            "weight shape must stay [{}, {}]",
            self.in_features,
            self.out_features
        );
        self.weight = weight;
    }

    /// Replace the bias tensor (length must match).
    pub fn set_bias(&mut self, bias: Tensor) {
        assert_eq!(bias.numel(), self.out_features);
        self.bias = bias;
    }

    /// Current mask snapshot.
    #[must_use]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub(crate) fn mask_mut(&mut self) -> &mut Mask {
        &mut self.mask
    }

    /// Forward pass with the mask applied to the weight.
    #[must_use]
    pub fn forward(&self, input: &Tensor) -> Tensor {
        let masked = self.weight.mul(self.mask.snapshot());
        let z = input.matmul(&masked).broadcast_add(&self.bias);
        match self.activation {
            Some(act) => act.apply(&z),
            None => z,
        }
    }
}

impl std::fmt::Debug for MaskedDense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskedDense")
            .field("in_features", &self.in_features)
            .field("out_features", &self.out_features)
            .field("activation", &self.activation)
            .field("mask_sparsity", &self.mask.sparsity())
            .finish_non_exhaustive()
    }
}
