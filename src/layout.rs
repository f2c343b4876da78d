//! Flat parameter vector layout.
//!
//! A hypernetwork emits one flat vector of length `po_dim` per sample;
//! this module is the deterministic index arithmetic that interprets it.
//! The slice order is fixed: all weights first (input → hidden → output),
//! then all biases in the same order. Consecutive cumulative offsets tile
//! `[0, po_dim)` exactly, so decoding is pure slicing — no searching, no
//! padding.
//!
//! Layout is deliberately separate from evaluation: it is a stateless
//! description computed once per model, while [`decode`](ParameterLayout::decode)
//! runs per forward call and materializes each per-sample weight tensor
//! exactly once.

use std::fmt;

use crate::config::{Connectivity, ShapeNetConfig};
use crate::error::{ConfigError, ShapeError};
use crate::tensor::Tensor;

/// Shape-net hidden-layer structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeVariant {
    /// One weight/bias pair per hidden layer.
    Plain,
    /// Two pairs per hidden layer, combined by midpoint residual.
    Resblock,
}

/// Name of one slice of the flat parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceId {
    /// First-layer weight, per-sample `[si, n]`.
    InputWeight,
    /// Hidden weight; `branch` is 0 for plain, 0|1 inside a resblock.
    HiddenWeight {
        /// Hidden layer index
        layer: usize,
        /// Branch within a residual pair
        branch: usize,
    },
    /// Output-layer weight, per-sample `[n, so]`.
    OutputWeight,
    /// First-layer bias, per-sample `[n]`.
    InputBias,
    /// Hidden bias; `branch` as for `HiddenWeight`.
    HiddenBias {
        /// Hidden layer index
        layer: usize,
        /// Branch within a residual pair
        branch: usize,
    },
    /// Output-layer bias, per-sample `[so]`.
    OutputBias,
}

impl fmt::Display for SliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceId::InputWeight => write!(f, "w_1"),
            SliceId::HiddenWeight { layer, branch } => write!(f, "w_hidden[{layer}].{branch}"),
            SliceId::OutputWeight => write!(f, "w_l"),
            SliceId::InputBias => write!(f, "b_1"),
            SliceId::HiddenBias { layer, branch } => write!(f, "b_hidden[{layer}].{branch}"),
            SliceId::OutputBias => write!(f, "b_l"),
        }
    }
}

/// One named slice: where it sits in the flat vector and the per-sample
/// shape it reshapes to.
#[derive(Debug, Clone)]
pub struct Slice {
    /// Which tensor this slice is
    pub id: SliceId,
    /// Start column in the flat vector
    pub offset: usize,
    /// Width in scalars
    pub len: usize,
    /// Per-sample shape (`[in, out]` for weights, `[out]` for biases)
    pub dims: Vec<usize>,
}

/// Per-sample weight set decoded from a flat parameter vector.
///
/// Recomputed on every forward call; never cached across calls.
#[derive(Debug)]
pub struct ShapeWeights {
    /// `[batch, si, n]`
    pub w_in: Tensor,
    /// One block per hidden layer
    pub hidden: Vec<HiddenBlock>,
    /// `[batch, n, so]`
    pub w_out: Tensor,
    /// `[batch, n]`
    pub b_in: Tensor,
    /// `[batch, so]`
    pub b_out: Tensor,
}

/// Weights of one hidden layer.
#[derive(Debug)]
pub enum HiddenBlock {
    /// Single weight/bias pair.
    Plain {
        /// `[batch, n, n]`
        w: Tensor,
        /// `[batch, n]`
        b: Tensor,
    },
    /// Residual pair.
    Residual {
        /// `[batch, n, n]`
        w1: Tensor,
        /// `[batch, n]`
        b1: Tensor,
        /// `[batch, n, n]`
        w2: Tensor,
        /// `[batch, n]`
        b2: Tensor,
    },
}

/// Deterministic decomposition of a length-`po_dim` vector into the
/// shape net's weight and bias tensors.
///
/// Only defined for full connectivity; under `last_layer` the flat
/// vector is a coefficient vector and is never sliced.
#[derive(Debug, Clone)]
pub struct ParameterLayout {
    si_dim: usize,
    so_dim: usize,
    units: usize,
    nlayers: usize,
    variant: ShapeVariant,
    slices: Vec<Slice>,
    po_dim: usize,
    weight_cols: usize,
}

impl ParameterLayout {
    /// Build the layout for a validated full-connectivity config.
    pub fn new(cfg: &ShapeNetConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if cfg.connectivity != Connectivity::Full {
            return Err(ConfigError::UnsupportedOperation {
                operation: "ParameterLayout::new".to_string(),
                reason: "last_layer connectivity emits coefficients, not weight slices"
                    .to_string(),
            });
        }

        let variant = if cfg.use_resblock {
            ShapeVariant::Resblock
        } else {
            ShapeVariant::Plain
        };
        let (si, so, n, l) = (cfg.input_dim, cfg.output_dim, cfg.units, cfg.nlayers);
        let branches = match variant {
            ShapeVariant::Plain => 1,
            ShapeVariant::Resblock => 2,
        };

        let mut slices = Vec::with_capacity(2 * (2 + branches * l));
        let mut offset = 0;
        let push = |id: SliceId, dims: Vec<usize>, offset: &mut usize, out: &mut Vec<Slice>| {
            let len: usize = dims.iter().product();
            out.push(Slice {
                id,
                offset: *offset,
                len,
                dims,
            });
            *offset += len;
        };

        // Weights: input, hidden (branch pairs interleaved), output.
        push(SliceId::InputWeight, vec![si, n], &mut offset, &mut slices);
        for layer in 0..l {
            for branch in 0..branches {
                push(
                    SliceId::HiddenWeight { layer, branch },
                    vec![n, n],
                    &mut offset,
                    &mut slices,
                );
            }
        }
        push(SliceId::OutputWeight, vec![n, so], &mut offset, &mut slices);
        let weight_cols = offset;

        // Biases, same order.
        push(SliceId::InputBias, vec![n], &mut offset, &mut slices);
        for layer in 0..l {
            for branch in 0..branches {
                push(
                    SliceId::HiddenBias { layer, branch },
                    vec![n],
                    &mut offset,
                    &mut slices,
                );
            }
        }
        push(SliceId::OutputBias, vec![so], &mut offset, &mut slices);

        let po_dim = offset;
        debug_assert_eq!(
            po_dim,
            Self::closed_form_po_dim(si, so, n, l, cfg.use_resblock)
        );

        Ok(Self {
            si_dim: si,
            so_dim: so,
            units: n,
            nlayers: l,
            variant,
            slices,
            po_dim,
            weight_cols,
        })
    }

    /// Closed-form flat-vector width:
    /// `k·l·n² + (si + so + 1 + k·l)·n + so`, with `k = 2` for resblock.
    #[must_use]
    pub fn closed_form_po_dim(si: usize, so: usize, n: usize, l: usize, resblock: bool) -> usize {
        let k = if resblock { 2 } else { 1 };
        k * l * n * n + (si + so + 1 + k * l) * n + so
    }

    /// Total flat-vector width.
    #[must_use]
    pub fn po_dim(&self) -> usize {
        self.po_dim
    }

    /// Width of the weight-slice block (bias columns excluded).
    ///
    /// Columns `[0, weight_cols)` of the terminal hyper layer feed
    /// shape-net *weights*; structured pruning is restricted to them.
    #[must_use]
    pub fn weight_cols(&self) -> usize {
        self.weight_cols
    }

    /// Ordered slice table.
    #[must_use]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Hidden-layer structure.
    #[must_use]
    pub fn variant(&self) -> ShapeVariant {
        self.variant
    }

    /// Spatial input width.
    #[must_use]
    pub fn si_dim(&self) -> usize {
        self.si_dim
    }

    /// Field output width.
    #[must_use]
    pub fn so_dim(&self) -> usize {
        self.so_dim
    }

    /// Hidden width.
    #[must_use]
    pub fn units(&self) -> usize {
        self.units
    }

    /// Hidden layer count.
    #[must_use]
    pub fn nlayers(&self) -> usize {
        self.nlayers
    }

    /// Slice a batch of flat parameter vectors into per-sample weight
    /// tensors.
    ///
    /// `params` must be `[batch, po_dim]`; each weight slice reshapes to
    /// `[batch, in, out]` and each bias to `[batch, out]`. A width
    /// mismatch reports the first slice offset that falls outside the
    /// vector.
    pub fn decode(&self, params: &Tensor) -> Result<ShapeWeights, ShapeError> {
        self.check_width(params)?;
        let batch = params.shape()[0];

        let take = |slice: &Slice| -> Tensor {
            let t = params.slice_cols(slice.offset, slice.offset + slice.len);
            let mut dims = Vec::with_capacity(1 + slice.dims.len());
            dims.push(batch);
            dims.extend_from_slice(&slice.dims);
            t.view(&dims)
        };

        let mut w_in = None;
        let mut w_out = None;
        let mut b_in = None;
        let mut b_out = None;
        let mut hidden_w: Vec<Tensor> = Vec::with_capacity(self.nlayers * 2);
        let mut hidden_b: Vec<Tensor> = Vec::with_capacity(self.nlayers * 2);

        for slice in &self.slices {
            match slice.id {
                SliceId::InputWeight => w_in = Some(take(slice)),
                SliceId::HiddenWeight { .. } => hidden_w.push(take(slice)),
                SliceId::OutputWeight => w_out = Some(take(slice)),
                SliceId::InputBias => b_in = Some(take(slice)),
                SliceId::HiddenBias { .. } => hidden_b.push(take(slice)),
                SliceId::OutputBias => b_out = Some(take(slice)),
            }
        }

        let hidden = match self.variant {
            ShapeVariant::Plain => hidden_w
                .into_iter()
                .zip(hidden_b)
                .map(|(w, b)| HiddenBlock::Plain { w, b })
                .collect(),
            ShapeVariant::Resblock => {
                let mut blocks = Vec::with_capacity(self.nlayers);
                let mut ws = hidden_w.into_iter();
                let mut bs = hidden_b.into_iter();
                for _ in 0..self.nlayers {
                    blocks.push(HiddenBlock::Residual {
                        w1: ws.next().expect("layout emits paired hidden weights"),
                        b1: bs.next().expect("layout emits paired hidden biases"),
                        w2: ws.next().expect("layout emits paired hidden weights"),
                        b2: bs.next().expect("layout emits paired hidden biases"),
                    });
                }
                blocks
            }
        };

        Ok(ShapeWeights {
            w_in: w_in.expect("layout always emits w_1"),
            hidden,
            w_out: w_out.expect("layout always emits w_l"),
            b_in: b_in.expect("layout always emits b_1"),
            b_out: b_out.expect("layout always emits b_l"),
        })
    }

    /// Pack a per-sample weight set back into flat vectors — the exact
    /// inverse of [`decode`](Self::decode), bit-exact for f32 values.
    pub fn encode(&self, weights: &ShapeWeights) -> Result<Tensor, ShapeError> {
        let batch = weights.w_in.shape()[0];
        if weights.hidden.len() != self.nlayers {
            return Err(ShapeError::DimensionMismatch {
                dimension: "hidden block count".to_string(),
                expected: self.nlayers,
                actual: weights.hidden.len(),
            });
        }

        let mut data = vec![0.0f32; batch * self.po_dim];
        let mut write = |slice: &Slice, tensor: &Tensor| -> Result<(), ShapeError> {
            if tensor.shape()[0] != batch {
                return Err(ShapeError::BatchMismatch {
                    left: batch,
                    right: tensor.shape()[0],
                });
            }
            if tensor.numel() != batch * slice.len {
                return Err(ShapeError::DimensionMismatch {
                    dimension: format!("slice {} width", slice.id),
                    expected: slice.len,
                    actual: tensor.numel() / batch.max(1),
                });
            }
            for a in 0..batch {
                let src = &tensor.data()[a * slice.len..(a + 1) * slice.len];
                let dst_start = a * self.po_dim + slice.offset;
                data[dst_start..dst_start + slice.len].copy_from_slice(src);
            }
            Ok(())
        };

        for slice in &self.slices {
            match slice.id {
                SliceId::InputWeight => write(slice, &weights.w_in)?,
                SliceId::OutputWeight => write(slice, &weights.w_out)?,
                SliceId::InputBias => write(slice, &weights.b_in)?,
                SliceId::OutputBias => write(slice, &weights.b_out)?,
                SliceId::HiddenWeight { layer, branch } => {
                    let t = match (&weights.hidden[layer], branch) {
                        (HiddenBlock::Plain { w, .. }, 0) => w,
                        (HiddenBlock::Residual { w1, .. }, 0) => w1,
                        (HiddenBlock::Residual { w2, .. }, 1) => w2,
                        _ => {
                            return Err(ShapeError::DimensionMismatch {
                                dimension: format!("hidden block {layer} branch count"),
                                expected: branch + 1,
                                actual: 1,
                            })
                        }
                    };
                    write(slice, t)?;
                }
                SliceId::HiddenBias { layer, branch } => {
                    let t = match (&weights.hidden[layer], branch) {
                        (HiddenBlock::Plain { b, .. }, 0) => b,
                        (HiddenBlock::Residual { b1, .. }, 0) => b1,
                        (HiddenBlock::Residual { b2, .. }, 1) => b2,
                        _ => {
                            return Err(ShapeError::DimensionMismatch {
                                dimension: format!("hidden block {layer} branch count"),
                                expected: branch + 1,
                                actual: 1,
                            })
                        }
                    };
                    write(slice, t)?;
                }
            }
        }

        Ok(Tensor::new(&data, &[batch, self.po_dim]))
    }

    /// Validate the flat vector's width, reporting the first slice offset
    /// that would fall outside it.
    fn check_width(&self, params: &Tensor) -> Result<(), ShapeError> {
        if params.ndim() != 2 {
            return Err(ShapeError::DimensionMismatch {
                dimension: "parameter vector rank".to_string(),
                expected: 2,
                actual: params.ndim(),
            });
        }
        let actual = params.shape()[1];
        if actual != self.po_dim {
            let offset = self
                .slices
                .iter()
                .find(|s| s.offset + s.len > actual)
                .map_or(self.po_dim, |s| s.offset);
            return Err(ShapeError::ParameterWidth {
                po_dim: self.po_dim,
                actual,
                offset,
            });
        }
        Ok(())
    }
}
