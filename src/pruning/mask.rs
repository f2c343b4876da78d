//! Sparsity mask owned by a prunable layer.
//!
//! A mask is a float tensor shaped exactly like its layer's weight matrix,
//! initialized all-ones. Pruning operations only ever clear entries —
//! a cleared entry never re-enables — and each successful prune bumps the
//! mask version so consumers can tell snapshots apart. Gradient descent
//! never touches the mask; it changes only through the operations in this
//! module's siblings.

use crate::tensor::Tensor;

use super::error::PruningError;

/// Versioned binary mask over a weight matrix.
///
/// # Invariants
///
/// - All values are exactly 0.0 or 1.0
/// - Shape equals the owning layer's weight shape `[in, out]`
/// - Updates are monotone: entries go 1 → 0, never back
#[derive(Debug, Clone)]
pub struct Mask {
    /// Binary mask tensor (1 = keep, 0 = pruned)
    values: Tensor,
    /// Incremented on every successful prune operation
    version: u64,
}

impl Mask {
    /// Create an all-ones (dense) mask for a weight matrix shape.
    #[must_use]
    pub fn dense(shape: &[usize]) -> Self {
        Self {
            values: Tensor::ones(shape),
            version: 0,
        }
    }

    /// Current mask snapshot.
    ///
    /// Forward evaluation multiplies the weight matrix by this snapshot;
    /// pruned entries contribute exactly zero.
    #[must_use]
    pub fn snapshot(&self) -> &Tensor {
        &self.values
    }

    /// Shape of the mask (equals the weight shape).
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// Version counter; bumped on every successful prune.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of pruned (zero) entries.
    #[must_use]
    pub fn num_zeros(&self) -> usize {
        self.values.data().iter().filter(|&&v| v < 0.5).count()
    }

    /// Fraction of pruned entries.
    #[must_use]
    pub fn sparsity(&self) -> f32 {
        let n = self.values.numel();
        if n == 0 {
            return 0.0;
        }
        self.num_zeros() as f32 / n as f32
    }

    /// Clear the given flat indices (monotone update) and bump the
    /// version.
    ///
    /// Indices already cleared stay cleared; repeating a clear is a no-op
    /// apart from the version bump.
    pub(crate) fn disable(&mut self, indices: &[usize]) -> Result<(), PruningError> {
        let numel = self.values.numel();
        if let Some(&bad) = indices.iter().find(|&&i| i >= numel) {
            return Err(PruningError::IndexOutOfRange {
                index: bad,
                numel,
            });
        }
        let data = self.values.data_mut();
        for &i in indices {
            data[i] = 0.0;
        }
        self.version += 1;
        Ok(())
    }
}
