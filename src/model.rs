//! The neural implicit flow model.
//!
//! [`Nif`] ties the hypernetwork to a field evaluator chosen once at
//! construction: full connectivity slices the flat parameter vector into
//! a complete per-sample network, `last_layer` contracts it as
//! coefficients against a shared basis. The choice is a closed variant —
//! there is no runtime subclassing, and everything downstream of the
//! config split is statically dispatched.

use crate::basis::FactorizedEvaluator;
use crate::config::{Connectivity, ParameterNetConfig, ShapeNetConfig};
use crate::error::{ConfigError, NifError, ShapeError};
use crate::layout::ParameterLayout;
use crate::parameter_net::ParameterNet;
use crate::pruning::{PruneReport, PruningError};
use crate::shape_net::ShapeNetEvaluator;
use crate::tensor::{MixedPolicy, Tensor};

/// Field evaluator variant, fixed at construction.
enum FieldEvaluator {
    /// All shape-net layers are hyper-parameterized.
    Full(ShapeNetEvaluator),
    /// Only the last layer is; earlier layers are a shared basis.
    Factorized(FactorizedEvaluator),
}

/// Neural implicit flow: conditioning input + spatial coordinate →
/// field value, with the spatial network's weights generated per sample.
///
/// # Example
///
/// ```
/// use flujo::config::{ParameterNetConfig, ShapeNetConfig};
/// use flujo::model::Nif;
/// use flujo::tensor::{MixedPolicy, Tensor};
///
/// let cfg_s = ShapeNetConfig::from_json(r#"{
///     "input_dim": 2, "output_dim": 1, "units": 4, "nlayers": 1,
///     "activation": "sine", "use_resblock": false, "connectivity": "full"
/// }"#).unwrap();
/// let cfg_p = ParameterNetConfig::from_json(r#"{
///     "input_dim": 1, "latent_dim": 3, "units": 8, "nlayers": 2,
///     "activation": "swish"
/// }"#).unwrap();
///
/// let model = Nif::with_seed(&cfg_s, &cfg_p, MixedPolicy::float32(), Some(42)).unwrap();
/// // One conditioning column, two spatial columns per row.
/// let inputs = Tensor::ones(&[3, 3]);
/// let u = model.forward(&inputs).unwrap();
/// assert_eq!(u.shape(), &[3, 1]);
/// ```
pub struct Nif {
    pnet: ParameterNet,
    evaluator: FieldEvaluator,
    pi_dim: usize,
    si_dim: usize,
}

impl Nif {
    /// Build a model with entropy-seeded initialization.
    pub fn new(
        cfg_shape: &ShapeNetConfig,
        cfg_param: &ParameterNetConfig,
        policy: MixedPolicy,
    ) -> Result<Self, ConfigError> {
        Self::with_seed(cfg_shape, cfg_param, policy, None)
    }

    /// Build a model with a fixed random seed.
    ///
    /// Validates both configs, derives `po_dim`, and cross-checks it
    /// against the parameter net's terminal width — all before any
    /// forward pass.
    pub fn with_seed(
        cfg_shape: &ShapeNetConfig,
        cfg_param: &ParameterNetConfig,
        policy: MixedPolicy,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        cfg_shape.validate()?;
        cfg_param.validate()?;

        let (po_dim, evaluator) = match cfg_shape.connectivity {
            Connectivity::Full => {
                let eval = ShapeNetEvaluator::new(cfg_shape, policy)?;
                (eval.layout().po_dim(), FieldEvaluator::Full(eval))
            }
            Connectivity::LastLayer => {
                let eval = FactorizedEvaluator::new(
                    cfg_shape,
                    cfg_param.latent_dim,
                    policy,
                    seed.map(|s| s.wrapping_add(77)),
                )?;
                (cfg_param.latent_dim, FieldEvaluator::Factorized(eval))
            }
        };

        let pnet = ParameterNet::new(cfg_param, cfg_shape, po_dim, seed)?;
        if pnet.po_dim() != po_dim {
            return Err(ConfigError::PoDimMismatch {
                expected: po_dim,
                actual: pnet.po_dim(),
            });
        }

        Ok(Self {
            pnet,
            evaluator,
            pi_dim: cfg_param.input_dim,
            si_dim: cfg_shape.input_dim,
        })
    }

    /// Flat parameter vector width (latent width under `last_layer`).
    #[must_use]
    pub fn po_dim(&self) -> usize {
        self.pnet.po_dim()
    }

    /// The hypernetwork.
    #[must_use]
    pub fn parameter_net(&self) -> &ParameterNet {
        &self.pnet
    }

    /// The slicing layout (full connectivity only).
    #[must_use]
    pub fn layout(&self) -> Option<&ParameterLayout> {
        match &self.evaluator {
            FieldEvaluator::Full(eval) => Some(eval.layout()),
            FieldEvaluator::Factorized(_) => None,
        }
    }

    /// Full forward pass over combined rows
    /// `[conditioning | spatial]:[batch, pi_dim + si_dim]`.
    pub fn forward(&self, inputs: &Tensor) -> Result<Tensor, ShapeError> {
        if inputs.ndim() != 2 {
            return Err(ShapeError::DimensionMismatch {
                dimension: "combined input rank".to_string(),
                expected: 2,
                actual: inputs.ndim(),
            });
        }
        let expected = self.pi_dim + self.si_dim;
        if inputs.shape()[1] != expected {
            return Err(ShapeError::DimensionMismatch {
                dimension: "combined input width (pi_dim + si_dim)".to_string(),
                expected,
                actual: inputs.shape()[1],
            });
        }

        let input_p = inputs.slice_cols(0, self.pi_dim);
        let input_s = inputs.slice_cols(self.pi_dim, expected);

        let (params, _latent) = self.pnet.forward(&input_p)?;
        self.field_given_params(&input_s, &params)
    }

    /// Sub-model: conditioning input → latent code.
    pub fn latent(&self, input_p: &Tensor) -> Result<Tensor, ShapeError> {
        self.pnet.latent(input_p)
    }

    /// Sub-model: latent code → flat parameter vector.
    ///
    /// Under `last_layer` connectivity the coefficient vector *is* the
    /// hypernetwork output, so this mapping does not exist separately.
    pub fn params_from_latent(&self, latent: &Tensor) -> Result<Tensor, NifError> {
        if matches!(self.evaluator, FieldEvaluator::Factorized(_)) {
            return Err(ConfigError::UnsupportedOperation {
                operation: "params_from_latent".to_string(),
                reason: "under last_layer connectivity the parameter vector is the latent-width coefficient output".to_string(),
            }
            .into());
        }
        Ok(self.pnet.params_from_latent(latent)?)
    }

    /// Sub-model: (spatial input, flat parameter vector) → field value.
    pub fn field_given_params(&self, x: &Tensor, params: &Tensor) -> Result<Tensor, ShapeError> {
        match &self.evaluator {
            FieldEvaluator::Full(eval) => eval.evaluate(x, params),
            FieldEvaluator::Factorized(eval) => eval.evaluate(x, params),
        }
    }

    /// Sub-model: spatial input → basis tensor (factorized variant only).
    pub fn basis(&self, x: &Tensor) -> Result<Tensor, NifError> {
        match &self.evaluator {
            FieldEvaluator::Factorized(eval) => Ok(eval.basis(x)?),
            FieldEvaluator::Full(_) => Err(ConfigError::UnsupportedOperation {
                operation: "basis".to_string(),
                reason: "full connectivity has no shared basis network".to_string(),
            }
            .into()),
        }
    }

    /// Magnitude-prune one non-terminal parameter-net layer.
    pub fn prune_magnitude_layer(
        &mut self,
        layer: usize,
        sparsity: f32,
    ) -> Result<Vec<PruneReport>, PruningError> {
        self.pnet.prune_magnitude_layer(layer, sparsity)
    }

    /// Shape-unit-prune the terminal layer (full connectivity only).
    pub fn prune_shape_units(&mut self, sparsity: f32) -> Result<PruneReport, PruningError> {
        let layout = match &self.evaluator {
            FieldEvaluator::Full(eval) => eval.layout().clone(),
            FieldEvaluator::Factorized(_) => return Err(PruningError::NoSliceBlock),
        };
        self.pnet.prune_shape_units(&layout, sparsity)
    }

    /// Prune the whole hypernetwork: magnitude on every non-terminal
    /// layer, then shape units on the terminal layer.
    pub fn prune(&mut self, sparsity: f32) -> Result<Vec<PruneReport>, PruningError> {
        let mut reports = self.pnet.prune_magnitude_all(sparsity)?;
        reports.push(self.prune_shape_units(sparsity)?);
        Ok(reports)
    }
}

impl std::fmt::Debug for Nif {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nif")
            .field("pi_dim", &self.pi_dim)
            .field("si_dim", &self.si_dim)
            .field("po_dim", &self.po_dim())
            .field(
                "connectivity",
                &match self.evaluator {
                    FieldEvaluator::Full(_) => "full",
                    FieldEvaluator::Factorized(_) => "last_layer",
                },
            )
            .finish_non_exhaustive()
    }
}
