//! Factorized last-layer evaluation.
//!
//! Under `last_layer` connectivity only the final layer is
//! hyper-parameterized. A shared-weight SIREN network maps the spatial
//! coordinate to a per-sample basis matrix `Φ(x):[batch, so, latent]`;
//! the hypernetwork's output is reinterpreted as a coefficient vector
//! `c:[batch, latent]`, and the field is `Φ(x)·c + bias` with a learned,
//! non-hyper-networked bias. This trades weight-count growth (`po_dim`
//! no longer depends on the output width) for per-channel expressivity.

use crate::config::{Connectivity, ShapeNetConfig};
use crate::error::{ConfigError, ShapeError};
use crate::nn::{Siren, SirenResBlock, SirenRole};
use crate::tensor::{MixedPolicy, Tensor};

use crate::nn::init::truncated_normal;

/// Hidden layer of the basis network.
enum BasisHidden {
    Plain(Siren),
    Residual(SirenResBlock),
}

impl BasisHidden {
    fn forward(&self, input: &Tensor) -> Tensor {
        match self {
            BasisHidden::Plain(layer) => layer.forward(input),
            BasisHidden::Residual(block) => block.forward(input),
        }
    }
}

/// Shared-weight basis network: spatial coordinate → basis matrix.
///
/// Ordinary feed-forward SIREN (plain or resblock hidden layers); its
/// weights are shared across the batch, unlike everything the
/// full-connectivity evaluator touches.
pub struct BasisNet {
    first: Siren,
    hidden: Vec<BasisHidden>,
    bottleneck: Siren,
    si_dim: usize,
    so_dim: usize,
    latent_dim: usize,
}

impl BasisNet {
    /// Build the basis network for a `last_layer` config.
    pub fn new(
        cfg: &ShapeNetConfig,
        latent_dim: usize,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if cfg.connectivity != Connectivity::LastLayer {
            return Err(ConfigError::UnsupportedOperation {
                operation: "BasisNet::new".to_string(),
                reason: "basis networks exist only under last_layer connectivity".to_string(),
            });
        }

        let (si, n, l) = (cfg.input_dim, cfg.units, cfg.nlayers);
        let omega = cfg.omega_0;
        let bump = |k: u64| seed.map(|s| s.wrapping_add(k));

        let first = Siren::new(si, n, SirenRole::First, omega, seed);
        let mut hidden = Vec::with_capacity(l);
        for i in 0..l {
            let layer_seed = bump(1000 + i as u64);
            hidden.push(if cfg.use_resblock {
                BasisHidden::Residual(SirenResBlock::new(n, omega, layer_seed))
            } else {
                BasisHidden::Plain(Siren::new(n, n, SirenRole::Hidden, omega, layer_seed))
            });
        }
        let bottleneck = Siren::new(
            n,
            cfg.output_dim * latent_dim,
            SirenRole::Bottleneck,
            omega,
            bump(2000),
        );

        Ok(Self {
            first,
            hidden,
            bottleneck,
            si_dim: si,
            so_dim: cfg.output_dim,
            latent_dim,
        })
    }

    /// Spatial input width.
    #[must_use]
    pub fn si_dim(&self) -> usize {
        self.si_dim
    }

    /// Evaluate the basis matrix `Φ(x):[batch, so, latent]`.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor, ShapeError> {
        if x.ndim() != 2 {
            return Err(ShapeError::DimensionMismatch {
                dimension: "spatial input rank".to_string(),
                expected: 2,
                actual: x.ndim(),
            });
        }
        if x.shape()[1] != self.si_dim {
            return Err(ShapeError::DimensionMismatch {
                dimension: "spatial input width (si_dim)".to_string(),
                expected: self.si_dim,
                actual: x.shape()[1],
            });
        }

        let mut u = self.first.forward(x);
        for layer in &self.hidden {
            u = layer.forward(&u);
        }
        let flat = self.bottleneck.forward(&u);
        Ok(flat.view(&[x.shape()[0], self.so_dim, self.latent_dim]))
    }
}

impl std::fmt::Debug for BasisNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasisNet")
            .field("si_dim", &self.si_dim)
            .field("so_dim", &self.so_dim)
            .field("latent_dim", &self.latent_dim)
            .field("nlayers", &self.hidden.len())
            .finish_non_exhaustive()
    }
}

/// Field evaluator for the factorized variant: `u = Φ(x)·c + bias`.
pub struct FactorizedEvaluator {
    basis: BasisNet,
    /// Learned output bias, `[so]`; not hyper-networked.
    bias: Tensor,
    latent_dim: usize,
    policy: MixedPolicy,
}

impl FactorizedEvaluator {
    /// Build the evaluator (basis network plus learned bias).
    pub fn new(
        cfg: &ShapeNetConfig,
        latent_dim: usize,
        policy: MixedPolicy,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let basis = BasisNet::new(cfg, latent_dim, seed)?;
        let bias = truncated_normal(&[cfg.output_dim], 0.1, seed.map(|s| s.wrapping_add(3000)));
        Ok(Self {
            basis,
            bias,
            latent_dim,
            policy,
        })
    }

    /// The shared basis network (exposed sub-model).
    #[must_use]
    pub fn basis_net(&self) -> &BasisNet {
        &self.basis
    }

    /// Coefficient width (`latent_dim`, the degenerate `po_dim`).
    #[must_use]
    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    /// Basis matrix at `x`, cast to the variable dtype.
    pub fn basis(&self, x: &Tensor) -> Result<Tensor, ShapeError> {
        let phi = self.basis.forward(&self.policy.cast_to_compute(x))?;
        Ok(self.policy.cast_to_variable(&phi))
    }

    /// Evaluate the field at `x:[batch, si]` given per-sample
    /// coefficients `coeffs:[batch, latent_dim]`.
    pub fn evaluate(&self, x: &Tensor, coeffs: &Tensor) -> Result<Tensor, ShapeError> {
        if coeffs.ndim() != 2 {
            return Err(ShapeError::DimensionMismatch {
                dimension: "coefficient vector rank".to_string(),
                expected: 2,
                actual: coeffs.ndim(),
            });
        }
        if coeffs.shape()[1] != self.latent_dim {
            return Err(ShapeError::DimensionMismatch {
                dimension: "coefficient width (latent_dim)".to_string(),
                expected: self.latent_dim,
                actual: coeffs.shape()[1],
            });
        }
        if coeffs.shape()[0] != x.shape()[0] {
            return Err(ShapeError::BatchMismatch {
                left: x.shape()[0],
                right: coeffs.shape()[0],
            });
        }

        let phi = self.basis.forward(&self.policy.cast_to_compute(x))?;
        let u = phi.batched_matvec(coeffs).broadcast_add(&self.bias);
        Ok(self.policy.cast_to_variable(&u))
    }
}

impl std::fmt::Debug for FactorizedEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorizedEvaluator")
            .field("latent_dim", &self.latent_dim)
            .field("basis", &self.basis)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(si: usize, so: usize, n: usize, l: usize, resblock: bool) -> ShapeNetConfig {
        ShapeNetConfig {
            input_dim: si,
            output_dim: so,
            units: n,
            nlayers: l,
            activation: "sine".to_string(),
            use_resblock: resblock,
            connectivity: Connectivity::LastLayer,
            omega_0: 30.0,
        }
    }

    #[test]
    fn test_basis_shape_spec_scenario() {
        // latent_dim = 5, output_dim = 2 → basis [batch, 2, 5]
        let net = BasisNet::new(&cfg(2, 2, 8, 1, false), 5, Some(42)).unwrap();
        let x = Tensor::ones(&[4, 2]);
        let phi = net.forward(&x).unwrap();
        assert_eq!(phi.shape(), &[4, 2, 5]);
    }

    #[test]
    fn test_evaluate_shape_spec_scenario() {
        let eval =
            FactorizedEvaluator::new(&cfg(2, 2, 8, 1, false), 5, MixedPolicy::float32(), Some(42))
                .unwrap();
        let x = Tensor::ones(&[3, 2]);
        let c = Tensor::ones(&[3, 5]);
        let u = eval.evaluate(&x, &c).unwrap();
        assert_eq!(u.shape(), &[3, 2]);
    }

    #[test]
    fn test_basis_shared_across_batch() {
        // Same spatial coordinate in two batch rows must yield the same
        // basis rows — the basis weights are not per-sample.
        let net = BasisNet::new(&cfg(1, 1, 4, 1, true), 3, Some(7)).unwrap();
        let x = Tensor::new(&[0.25, 0.25], &[2, 1]);
        let phi = net.forward(&x).unwrap();
        let (a, b) = phi.data().split_at(3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_coefficients_give_bias() {
        let eval =
            FactorizedEvaluator::new(&cfg(1, 2, 4, 0, false), 3, MixedPolicy::float32(), Some(9))
                .unwrap();
        let x = Tensor::ones(&[1, 1]);
        let c = Tensor::zeros(&[1, 3]);
        let u = eval.evaluate(&x, &c).unwrap();
        // Φ·0 = 0, so the output is exactly the learned bias.
        assert_eq!(u.data(), eval.bias.data());
    }

    #[test]
    fn test_coefficient_width_checked() {
        let eval =
            FactorizedEvaluator::new(&cfg(2, 2, 8, 1, false), 5, MixedPolicy::float32(), Some(42))
                .unwrap();
        let x = Tensor::ones(&[3, 2]);
        let c = Tensor::ones(&[3, 4]);
        let err = eval.evaluate(&x, &c).unwrap_err();
        assert!(err.to_string().contains("latent_dim"));
    }

    #[test]
    fn test_full_connectivity_rejected() {
        let mut c = cfg(2, 2, 8, 1, false);
        c.connectivity = Connectivity::Full;
        assert!(BasisNet::new(&c, 5, None).is_err());
    }

    #[test]
    fn test_linearity_in_coefficients() {
        // evaluate(x, 2c) - bias == 2 * (evaluate(x, c) - bias)
        let eval =
            FactorizedEvaluator::new(&cfg(1, 1, 4, 1, false), 2, MixedPolicy::float32(), Some(3))
                .unwrap();
        let x = Tensor::new(&[0.4], &[1, 1]);
        let c1 = Tensor::new(&[0.3, -0.2], &[1, 2]);
        let c2 = c1.mul_scalar(2.0);

        let u1 = eval.evaluate(&x, &c1).unwrap();
        let u2 = eval.evaluate(&x, &c2).unwrap();
        let b = eval.bias.data()[0];
        assert!(((u2.data()[0] - b) - 2.0 * (u1.data()[0] - b)).abs() < 1e-5);
    }
}
