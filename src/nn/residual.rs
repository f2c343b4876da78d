//! Residual layers for the parameter net's MLP path.
//!
//! Two forms, both width-preserving:
//! - [`MlpShortcut`]: identity shortcut, `u + act(dense(u))`
//! - [`MlpResBlock`]: two-layer midpoint residual mirroring the sine
//!   variant's resblock
//!
//! Both are built on [`MaskedDense`], so their weight matrices carry
//! masks and participate in magnitude pruning.

use crate::tensor::Tensor;

use super::{Activation, MaskedDense};

/// Identity-shortcut dense layer: u ← u + act(dense(u))
pub struct MlpShortcut {
    inner: MaskedDense,
    width: usize,
}

impl MlpShortcut {
    /// Create a shortcut layer of the given width.
    #[must_use]
    pub fn new(width: usize, activation: Activation, seed: Option<u64>) -> Self {
        Self {
            inner: MaskedDense::new(width, width, Some(activation), seed),
            width,
        }
    }

    /// Get the layer width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The masked dense layer inside the shortcut.
    #[must_use]
    pub fn dense(&self) -> &MaskedDense {
        &self.inner
    }

    pub(crate) fn dense_mut(&mut self) -> &mut MaskedDense {
        &mut self.inner
    }

    /// Forward pass.
    #[must_use]
    pub fn forward(&self, input: &Tensor) -> Tensor {
        input.add(&self.inner.forward(input))
    }
}

impl std::fmt::Debug for MlpShortcut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlpShortcut")
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// Two-layer midpoint residual block:
///
/// ```text
/// h = act(first(u))
/// u ← 0.5 * (u + act(second(h)))
/// ```
pub struct MlpResBlock {
    first: MaskedDense,
    second: MaskedDense,
    width: usize,
}

impl MlpResBlock {
    /// Create a residual block of the given width.
    #[must_use]
    pub fn new(width: usize, activation: Activation, seed: Option<u64>) -> Self {
        Self {
            first: MaskedDense::new(width, width, Some(activation), seed),
            second: MaskedDense::new(
                width,
                width,
                Some(activation),
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

    /// The two masked dense layers inside the block.
    #[must_use]
    pub fn dense_pair(&self) -> (&MaskedDense, &MaskedDense) {
        (&self.first, &self.second)
    }

    pub(crate) fn dense_pair_mut(&mut self) -> (&mut MaskedDense, &mut MaskedDense) {
        (&mut self.first, &mut self.second)
    }

    /// Forward pass with midpoint residual.
    #[must_use]
    pub fn forward(&self, input: &Tensor) -> Tensor {
        let h = self.first.forward(input);
        input.add(&self.second.forward(&h)).mul_scalar(0.5)
    }
}

impl std::fmt::Debug for MlpResBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlpResBlock")
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}
