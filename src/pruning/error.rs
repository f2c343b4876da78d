//! Pruning-specific error types.
//!
//! Every variant fires *before* any mask is mutated: a failed prune
//! leaves the model exactly as it was.

use std::fmt;

/// Pruning operation errors with detailed context.
///
/// Each variant carries enough to identify the offending argument or
/// layer without reproducing the call.
#[derive(Debug, Clone)]
pub enum PruningError {
    /// Sparsity target outside `[0, 1]`.
    InvalidSparsity {
        /// Provided value
        value: f32,
    },

    /// The addressed layer does not support the requested pruning mode.
    ///
    /// Magnitude pruning is defined on non-terminal layers; the terminal
    /// hyper layer is pruned by whole shape-net units instead.
    WrongLayerRole {
        /// Index of the addressed layer
        layer: usize,
        /// The mode that was requested
        requested: &'static str,
        /// The mode this layer supports
        supported: &'static str,
    },

    /// The addressed layer carries no mask (SIREN-path layers).
    NotMaskable {
        /// Index of the addressed layer
        layer: usize,
    },

    /// Shape-unit pruning requested but the parameter vector has no
    /// weight-slice structure (`last_layer` connectivity).
    NoSliceBlock,

    /// A mask index fell outside the mask extent.
    IndexOutOfRange {
        /// Offending flat index
        index: usize,
        /// Mask element count
        numel: usize,
    },

    /// A layer index fell outside the parameter net.
    LayerOutOfRange {
        /// Offending layer index
        layer: usize,
        /// Number of layers (terminal included)
        count: usize,
    },

    /// The terminal layer's width disagrees with the layout it is pruned
    /// against.
    LayoutMismatch {
        /// Layout's `po_dim`
        expected: usize,
        /// Layer output width
        actual: usize,
    },
}

impl fmt::Display for PruningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruningError::InvalidSparsity { value } => {
                write!(f, "invalid sparsity {value}: must be within [0, 1]")
            }
            PruningError::WrongLayerRole {
                layer,
                requested,
                supported,
            } => {
                write!(
                    f,
                    "layer {layer} does not support {requested} pruning (use {supported})"
                )
            }
            PruningError::NotMaskable { layer } => {
                write!(f, "layer {layer} carries no mask and cannot be pruned")
            }
            PruningError::NoSliceBlock => {
                write!(
                    f,
                    "shape-unit pruning requires full connectivity (the coefficient vector has no weight-slice block)"
                )
            }
            PruningError::IndexOutOfRange { index, numel } => {
                write!(f, "mask index {index} out of range for {numel} entries")
            }
            PruningError::LayerOutOfRange { layer, count } => {
                write!(f, "layer index {layer} out of range for {count} layers")
            }
            PruningError::LayoutMismatch { expected, actual } => {
                write!(
                    f,
                    "terminal layer width {actual} does not match layout po_dim {expected}"
                )
            }
        }
    }
}

impl std::error::Error for PruningError {}
