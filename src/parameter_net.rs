//! The hypernetwork: conditioning input → latent code → flat parameter
//! vector.
//!
//! Stack (both paths): first layer, `nlayers` hidden layers, a bottleneck
//! down to `latent_dim`, and a terminal hyper layer up to `po_dim`. The
//! `"sine"` activation selects a SIREN stack; anything else builds the
//! MLP path out of masked dense layers, which is the path structured
//! pruning operates on.
//!
//! The latent code and the terminal layer are exposed separately so
//! downstream consumers can run `conditioning → latent` and
//! `latent → parameters` without the full model.

use crate::config::{Connectivity, ParameterNetConfig, ShapeNetConfig};
use crate::error::{ConfigError, ShapeError};
use crate::layout::ParameterLayout;
use crate::nn::init::{siren_uniform, truncated_normal};
use crate::nn::{
    Activation, MaskedDense, MlpResBlock, MlpShortcut, Siren, SirenResBlock, SirenRole,
};
use crate::pruning::{
    prune_low_magnitude, prune_shape_units, PruneReport, PruningError,
};
use crate::tensor::Tensor;

/// One body layer of the parameter net.
enum PnetLayer {
    Dense(MaskedDense),
    Shortcut(MlpShortcut),
    Residual(MlpResBlock),
    Siren(Siren),
    SirenResidual(SirenResBlock),
}

impl PnetLayer {
    fn forward(&self, input: &Tensor) -> Tensor {
        match self {
            PnetLayer::Dense(l) => l.forward(input),
            PnetLayer::Shortcut(l) => l.forward(input),
            PnetLayer::Residual(l) => l.forward(input),
            PnetLayer::Siren(l) => l.forward(input),
            PnetLayer::SirenResidual(l) => l.forward(input),
        }
    }

    /// Masked weight matrices inside this layer, if any.
    fn dense_layers_mut(&mut self) -> Option<Vec<&mut MaskedDense>> {
        match self {
            PnetLayer::Dense(l) => Some(vec![l]),
            PnetLayer::Shortcut(l) => Some(vec![l.dense_mut()]),
            PnetLayer::Residual(l) => {
                let (a, b) = l.dense_pair_mut();
                Some(vec![a, b])
            }
            PnetLayer::Siren(_) | PnetLayer::SirenResidual(_) => None,
        }
    }
}

/// Feed-forward hypernetwork emitting one flat parameter vector per
/// sample.
pub struct ParameterNet {
    /// First layer through bottleneck.
    body: Vec<PnetLayer>,
    /// Terminal hyper layer, `latent_dim → po_dim`.
    last: MaskedDense,
    pi_dim: usize,
    latent_dim: usize,
    po_dim: usize,
}

impl ParameterNet {
    /// Build the parameter net for a shape net requiring `po_dim`
    /// parameters.
    ///
    /// The terminal initializer is connectivity-aware: under full
    /// connectivity with a sine shape net it uses the SIREN-scaled
    /// uniform so generated weights start in the frequency-stable range;
    /// otherwise a truncated normal (stddev 0.1).
    pub fn new(
        cfg: &ParameterNetConfig,
        cfg_shape: &ShapeNetConfig,
        po_dim: usize,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let act = cfg.parsed_activation()?;
        let (pi, n, l, latent) = (cfg.input_dim, cfg.units, cfg.nlayers, cfg.latent_dim);
        let bump = |k: u64| seed.map(|s| s.wrapping_add(k));

        let mut body = Vec::with_capacity(l + 2);
        if act == Activation::Sine {
            body.push(PnetLayer::Siren(Siren::new(
                pi,
                n,
                SirenRole::First,
                cfg.omega_0,
                seed,
            )));
            for i in 0..l {
                let layer_seed = bump(10 + i as u64);
                body.push(if cfg.use_resblock {
                    PnetLayer::SirenResidual(SirenResBlock::new(n, cfg.omega_0, layer_seed))
                } else {
                    PnetLayer::Siren(Siren::new(n, n, SirenRole::Hidden, cfg.omega_0, layer_seed))
                });
            }
            body.push(PnetLayer::Siren(Siren::new(
                n,
                latent,
                SirenRole::Bottleneck,
                cfg.omega_0,
                bump(500),
            )));
        } else {
            body.push(PnetLayer::Dense(MaskedDense::new(pi, n, Some(act), seed)));
            for i in 0..l {
                let layer_seed = bump(10 + i as u64);
                body.push(if cfg.use_resblock {
                    PnetLayer::Residual(MlpResBlock::new(n, act, layer_seed))
                } else {
                    PnetLayer::Shortcut(MlpShortcut::new(n, act, layer_seed))
                });
            }
            // Bottleneck is linear: the latent code is unconstrained.
            body.push(PnetLayer::Dense(MaskedDense::new(n, latent, None, bump(500))));
        }

        let last = Self::hyper_layer(latent, po_dim, cfg_shape, bump(900))?;

        Ok(Self {
            body,
            last,
            pi_dim: pi,
            latent_dim: latent,
            po_dim,
        })
    }

    /// Terminal hyper layer with a connectivity-aware initializer.
    fn hyper_layer(
        latent: usize,
        po_dim: usize,
        cfg_shape: &ShapeNetConfig,
        seed: Option<u64>,
    ) -> Result<MaskedDense, ConfigError> {
        let sine_shape = cfg_shape.parsed_activation()? == Activation::Sine;
        let weight = if cfg_shape.connectivity == Connectivity::Full && sine_shape {
            siren_uniform(&[latent, po_dim], latent, cfg_shape.omega_0, seed)
        } else {
            truncated_normal(&[latent, po_dim], 0.1, seed)
        };
        let bias = truncated_normal(&[po_dim], 0.1, seed.map(|s| s.wrapping_add(1)));
        Ok(MaskedDense::from_parts(weight, bias, None))
    }

    /// Conditioning input width.
    #[must_use]
    pub fn pi_dim(&self) -> usize {
        self.pi_dim
    }

    /// Latent code width.
    #[must_use]
    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    /// Terminal output width — must equal the layout's `po_dim`.
    #[must_use]
    pub fn po_dim(&self) -> usize {
        self.po_dim
    }

    /// Layer count, terminal included.
    #[must_use]
    pub fn num_layers(&self) -> usize {
        self.body.len() + 1
    }

    /// Index of the terminal hyper layer.
    #[must_use]
    pub fn terminal_index(&self) -> usize {
        self.body.len()
    }

    /// The terminal hyper layer.
    #[must_use]
    pub fn terminal(&self) -> &MaskedDense {
        &self.last
    }

    /// Full pass: conditioning input → (flat parameters, latent code).
    pub fn forward(&self, input_p: &Tensor) -> Result<(Tensor, Tensor), ShapeError> {
        let latent = self.latent(input_p)?;
        let params = self.last.forward(&latent);
        Ok((params, latent))
    }

    /// Conditioning input → latent code (terminal layer not run).
    pub fn latent(&self, input_p: &Tensor) -> Result<Tensor, ShapeError> {
        if input_p.ndim() != 2 {
            return Err(ShapeError::DimensionMismatch {
                dimension: "conditioning input rank".to_string(),
                expected: 2,
                actual: input_p.ndim(),
            });
        }
        if input_p.shape()[1] != self.pi_dim {
            return Err(ShapeError::DimensionMismatch {
                dimension: "conditioning input width (pi_dim)".to_string(),
                expected: self.pi_dim,
                actual: input_p.shape()[1],
            });
        }

        let mut u = input_p.clone();
        for layer in &self.body {
            u = layer.forward(&u);
        }
        Ok(u)
    }

    /// Latent code → flat parameter vector (terminal layer only).
    pub fn params_from_latent(&self, latent: &Tensor) -> Result<Tensor, ShapeError> {
        if latent.ndim() != 2 {
            return Err(ShapeError::DimensionMismatch {
                dimension: "latent code rank".to_string(),
                expected: 2,
                actual: latent.ndim(),
            });
        }
        if latent.shape()[1] != self.latent_dim {
            return Err(ShapeError::DimensionMismatch {
                dimension: "latent code width (latent_dim)".to_string(),
                expected: self.latent_dim,
                actual: latent.shape()[1],
            });
        }
        Ok(self.last.forward(latent))
    }

    /// Magnitude-prune one non-terminal layer.
    ///
    /// Residual layers carry two weight matrices, hence up to two
    /// reports. Addressing the terminal layer or a SIREN-path layer is a
    /// usage error; the mask is untouched on any error.
    pub fn prune_magnitude_layer(
        &mut self,
        layer: usize,
        sparsity: f32,
    ) -> Result<Vec<PruneReport>, PruningError> {
        if layer >= self.num_layers() {
            return Err(PruningError::LayerOutOfRange {
                layer,
                count: self.num_layers(),
            });
        }
        if layer == self.terminal_index() {
            return Err(PruningError::WrongLayerRole {
                layer,
                requested: "magnitude",
                supported: "shape-unit",
            });
        }
        let Some(dense_layers) = self.body[layer].dense_layers_mut() else {
            return Err(PruningError::NotMaskable { layer });
        };

        let mut reports = Vec::with_capacity(dense_layers.len());
        for dense in dense_layers {
            reports.push(prune_low_magnitude(dense, sparsity)?);
        }
        Ok(reports)
    }

    /// Magnitude-prune every non-terminal layer.
    ///
    /// Fails on the first non-maskable layer (SIREN path), in which case
    /// earlier layers in the stack have already been pruned — callers on
    /// the sine path should not use pruning at all.
    pub fn prune_magnitude_all(
        &mut self,
        sparsity: f32,
    ) -> Result<Vec<PruneReport>, PruningError> {
        crate::pruning::validate_sparsity(sparsity)?;
        let mut reports = Vec::with_capacity(self.body.len());
        for layer in 0..self.body.len() {
            reports.extend(self.prune_magnitude_layer(layer, sparsity)?);
        }
        Ok(reports)
    }

    /// Shape-unit-prune the terminal layer against a layout.
    pub fn prune_shape_units(
        &mut self,
        layout: &ParameterLayout,
        sparsity: f32,
    ) -> Result<PruneReport, PruningError> {
        prune_shape_units(&mut self.last, layout, sparsity)
    }
}

impl std::fmt::Debug for ParameterNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterNet")
            .field("pi_dim", &self.pi_dim)
            .field("latent_dim", &self.latent_dim)
            .field("po_dim", &self.po_dim)
            .field("num_layers", &self.num_layers())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pnet_cfg(act: &str, nlayers: usize) -> ParameterNetConfig {
        ParameterNetConfig {
            input_dim: 1,
            latent_dim: 3,
            units: 6,
            nlayers,
            activation: act.to_string(),
            use_resblock: false,
            omega_0: 30.0,
        }
    }

    fn shape_cfg() -> ShapeNetConfig {
        ShapeNetConfig {
            input_dim: 2,
            output_dim: 1,
            units: 4,
            nlayers: 1,
            activation: "sine".to_string(),
            use_resblock: false,
            connectivity: Connectivity::Full,
            omega_0: 30.0,
        }
    }

    fn net(act: &str) -> ParameterNet {
        ParameterNet::new(&pnet_cfg(act, 2), &shape_cfg(), 37, Some(42)).unwrap()
    }

    #[test]
    fn test_forward_shapes() {
        let net = net("swish");
        let p_in = Tensor::ones(&[5, 1]);
        let (params, latent) = net.forward(&p_in).unwrap();
        assert_eq!(params.shape(), &[5, 37]);
        assert_eq!(latent.shape(), &[5, 3]);
    }

    #[test]
    fn test_siren_path_forward() {
        let net = net("sine");
        let p_in = Tensor::ones(&[2, 1]);
        let (params, latent) = net.forward(&p_in).unwrap();
        assert_eq!(params.shape(), &[2, 37]);
        assert_eq!(latent.shape(), &[2, 3]);
    }

    #[test]
    fn test_submodels_compose_to_forward() {
        let net = net("swish");
        let p_in = Tensor::new(&[0.5, -1.0], &[2, 1]);

        let (params, latent) = net.forward(&p_in).unwrap();
        let latent2 = net.latent(&p_in).unwrap();
        let params2 = net.params_from_latent(&latent2).unwrap();

        assert_eq!(latent.data(), latent2.data());
        assert_eq!(params.data(), params2.data());
    }

    #[test]
    fn test_wrong_pi_dim_rejected() {
        let net = net("swish");
        let err = net.latent(&Tensor::ones(&[2, 3])).unwrap_err();
        assert!(err.to_string().contains("pi_dim"));
    }

    #[test]
    fn test_wrong_latent_dim_rejected() {
        let net = net("swish");
        let err = net.params_from_latent(&Tensor::ones(&[2, 5])).unwrap_err();
        assert!(err.to_string().contains("latent_dim"));
    }

    #[test]
    fn test_terminal_width_is_po_dim() {
        let net = net("swish");
        assert_eq!(net.terminal().out_features(), 37);
        assert_eq!(net.po_dim(), 37);
    }

    #[test]
    fn test_magnitude_prune_body_layer() {
        let mut net = net("swish");
        let reports = net.prune_magnitude_layer(0, 0.5).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].zeroed > 0);
    }

    #[test]
    fn test_magnitude_prune_terminal_is_usage_error() {
        let mut net = net("swish");
        let terminal = net.terminal_index();
        let err = net.prune_magnitude_layer(terminal, 0.5).unwrap_err();
        assert!(matches!(err, PruningError::WrongLayerRole { .. }));
    }

    #[test]
    fn test_magnitude_prune_out_of_range() {
        let mut net = net("swish");
        let err = net.prune_magnitude_layer(99, 0.5).unwrap_err();
        assert!(matches!(err, PruningError::LayerOutOfRange { .. }));
    }

    #[test]
    fn test_siren_layers_not_maskable() {
        let mut net = net("sine");
        let err = net.prune_magnitude_layer(0, 0.5).unwrap_err();
        assert!(matches!(err, PruningError::NotMaskable { layer: 0 }));
    }

    #[test]
    fn test_prune_all_then_shape_units() {
        let mut net = net("swish");
        let layout = ParameterLayout::new(&shape_cfg()).unwrap();

        let reports = net.prune_magnitude_all(0.25).unwrap();
        // first + 2 shortcut layers + bottleneck = 4 weight matrices
        assert_eq!(reports.len(), 4);

        let report = net.prune_shape_units(&layout, 0.5).unwrap();
        assert!(report.zeroed > 0);

        // Forward still runs with pruned masks.
        let (params, _) = net.forward(&Tensor::ones(&[1, 1])).unwrap();
        assert_eq!(params.shape(), &[1, 37]);
    }

    #[test]
    fn test_residual_layer_produces_two_reports() {
        let mut cfg = pnet_cfg("swish", 1);
        cfg.use_resblock = true;
        let mut net = ParameterNet::new(&cfg, &shape_cfg(), 37, Some(42)).unwrap();
        let reports = net.prune_magnitude_layer(1, 0.5).unwrap();
        assert_eq!(reports.len(), 2);
    }
}
