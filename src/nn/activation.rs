//! Nonlinearities.
//!
//! The configuration contract selects an activation by string, so the
//! crate models them as a closed enum resolved once at construction time
//! rather than as trait objects dispatched per call.
//!
//! # References
//!
//! - Sitzmann, V., et al. (2020). Implicit neural representations with
//!   periodic activation functions. `NeurIPS`.
//! - Ramachandran, P., et al. (2017). Searching for activation functions.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::tensor::Tensor;

/// A shape-net or parameter-net nonlinearity.
///
/// `Sine` is the implicit-representation activation: callers scale the
/// pre-activation by `omega_0` *before* applying it; `apply` itself is the
/// bare elementwise function for every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// max(0, x)
    Relu,
    /// Hyperbolic tangent.
    Tanh,
    /// Logistic sigmoid.
    Sigmoid,
    /// x * sigmoid(x)
    Swish,
    /// Gaussian error linear unit.
    Gelu,
    /// sin(x) — the SIREN nonlinearity.
    Sine,
}

impl Activation {
    /// Apply the nonlinearity elementwise.
    #[must_use]
    pub fn apply(&self, input: &Tensor) -> Tensor {
        match self {
            Activation::Relu => input.relu(),
            Activation::Tanh => input.tanh_(),
            Activation::Sigmoid => input.sigmoid(),
            Activation::Swish => input.mul(&input.sigmoid()),
            Activation::Gelu => input.gelu(),
            Activation::Sine => input.sin(),
        }
    }

    /// Whether this is the omega_0-scaled implicit-representation path.
    #[must_use]
    pub fn is_sine(&self) -> bool {
        matches!(self, Activation::Sine)
    }
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            "swish" => Ok(Activation::Swish),
            "gelu" => Ok(Activation::Gelu),
            "sine" => Ok(Activation::Sine),
            other => Err(ConfigError::UnknownActivation {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Relu => "relu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::Swish => "swish",
            Activation::Gelu => "gelu",
            Activation::Sine => "sine",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_roundtrip() {
        for name in ["relu", "tanh", "sigmoid", "swish", "gelu", "sine"] {
            let act = Activation::from_str(name).unwrap();
            assert_eq!(act.to_string(), name);
        }
    }

    #[test]
    fn test_unknown_activation() {
        let err = Activation::from_str("softplus").unwrap_err();
        assert!(err.to_string().contains("softplus"));
    }

    #[test]
    fn test_relu_apply() {
        let t = Tensor::from_slice(&[-2.0, 3.0]);
        assert_eq!(Activation::Relu.apply(&t).data(), &[0.0, 3.0]);
    }

    #[test]
    fn test_swish_zero() {
        let t = Tensor::from_slice(&[0.0]);
        assert_eq!(Activation::Swish.apply(&t).data(), &[0.0]);
    }

    #[test]
    fn test_sine_apply() {
        let t = Tensor::from_slice(&[0.0]);
        assert_eq!(Activation::Sine.apply(&t).data(), &[0.0]);
        assert!(Activation::Sine.is_sine());
        assert!(!Activation::Tanh.is_sine());
    }
}
