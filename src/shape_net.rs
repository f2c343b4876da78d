//! Shape-net evaluation under full connectivity.
//!
//! The shape net has no layer objects and no stored weights: every
//! forward call decodes the per-sample weight set from the flat parameter
//! vector (exactly once) and applies it with batched contractions —
//! sample `a`'s spatial input meets sample `a`'s own weight matrices.
//! Memory therefore scales as `batch × po_dim`, which is the central
//! performance consideration of the whole crate.

use crate::config::ShapeNetConfig;
use crate::error::{ConfigError, ShapeError};
use crate::layout::{HiddenBlock, ParameterLayout, ShapeWeights};
use crate::nn::Activation;
use crate::tensor::{MixedPolicy, Tensor};

/// Batched evaluator for the hyper-parameterized shape net.
///
/// # Example
///
/// ```
/// use flujo::config::{Connectivity, ShapeNetConfig};
/// use flujo::shape_net::ShapeNetEvaluator;
/// use flujo::tensor::{MixedPolicy, Tensor};
///
/// let cfg = ShapeNetConfig {
///     input_dim: 2,
///     output_dim: 1,
///     units: 4,
///     nlayers: 1,
///     activation: "sine".to_string(),
///     use_resblock: false,
///     connectivity: Connectivity::Full,
///     omega_0: 30.0,
/// };
/// let eval = ShapeNetEvaluator::new(&cfg, MixedPolicy::float32()).unwrap();
/// let x = Tensor::zeros(&[3, 2]);
/// let p = Tensor::zeros(&[3, eval.layout().po_dim()]);
/// let u = eval.evaluate(&x, &p).unwrap();
/// assert_eq!(u.shape(), &[3, 1]);
/// ```
pub struct ShapeNetEvaluator {
    layout: ParameterLayout,
    activation: Activation,
    omega_0: f32,
    policy: MixedPolicy,
}

impl ShapeNetEvaluator {
    /// Build an evaluator from a full-connectivity config.
    pub fn new(cfg: &ShapeNetConfig, policy: MixedPolicy) -> Result<Self, ConfigError> {
        let layout = ParameterLayout::new(cfg)?;
        let activation = cfg.parsed_activation()?;
        Ok(Self {
            layout,
            activation,
            omega_0: cfg.omega_0,
            policy,
        })
    }

    /// The layout this evaluator slices with.
    #[must_use]
    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Pre-activation scale: omega_0 on the sine path, 1 otherwise.
    fn scale(&self) -> f32 {
        if self.activation.is_sine() {
            self.omega_0
        } else {
            1.0
        }
    }

    /// Evaluate the field at `x:[batch, si]` given flat parameter vectors
    /// `params:[batch, po_dim]`.
    ///
    /// All shape checks run before any per-sample weight tensor is
    /// materialized.
    pub fn evaluate(&self, x: &Tensor, params: &Tensor) -> Result<Tensor, ShapeError> {
        self.check_inputs(x, params)?;

        let x = self.policy.cast_to_compute(x);
        let weights = self.layout.decode(params)?;
        let u = self.contract(&x, &weights);
        Ok(self.policy.cast_to_variable(&u))
    }

    fn check_inputs(&self, x: &Tensor, params: &Tensor) -> Result<(), ShapeError> {
        if x.ndim() != 2 {
            return Err(ShapeError::DimensionMismatch {
                dimension: "spatial input rank".to_string(),
                expected: 2,
                actual: x.ndim(),
            });
        }
        if x.shape()[1] != self.layout.si_dim() {
            return Err(ShapeError::DimensionMismatch {
                dimension: "spatial input width (si_dim)".to_string(),
                expected: self.layout.si_dim(),
                actual: x.shape()[1],
            });
        }
        if params.ndim() != 2 {
            return Err(ShapeError::DimensionMismatch {
                dimension: "parameter vector rank".to_string(),
                expected: 2,
                actual: params.ndim(),
            });
        }
        if params.shape()[0] != x.shape()[0] {
            return Err(ShapeError::BatchMismatch {
                left: x.shape()[0],
                right: params.shape()[0],
            });
        }
        Ok(())
    }

    /// The batched forward pass proper.
    fn contract(&self, x: &Tensor, weights: &ShapeWeights) -> Tensor {
        let act = self.activation;
        let scale = self.scale();

        // First layer
        let mut u = act.apply(
            &x.batched_vecmat(&weights.w_in)
                .mul_scalar(scale)
                .add(&weights.b_in),
        );

        // Hidden layers
        for block in &weights.hidden {
            u = match block {
                HiddenBlock::Plain { w, b } => {
                    act.apply(&u.batched_vecmat(w).mul_scalar(scale).add(b))
                }
                HiddenBlock::Residual { w1, b1, w2, b2 } => {
                    let h = act.apply(&u.batched_vecmat(w1).mul_scalar(scale).add(b1));
                    let second = act.apply(&h.batched_vecmat(w2).mul_scalar(scale).add(b2));
                    u.add(&second).mul_scalar(0.5)
                }
            };
        }

        // Output layer: affine, no nonlinearity
        u.batched_vecmat(&weights.w_out).add(&weights.b_out)
    }
}

impl std::fmt::Debug for ShapeNetEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeNetEvaluator")
            .field("po_dim", &self.layout.po_dim())
            .field("activation", &self.activation)
            .field("omega_0", &self.omega_0)
            .finish_non_exhaustive()
    }
}
