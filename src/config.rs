//! Model configuration.
//!
//! Two config dictionaries drive construction: one for the shape net
//! (the per-sample field network) and one for the parameter net (the
//! hypernetwork that generates its weights). Both deserialize from the
//! JSON dictionary contract and are validated eagerly — a model that
//! constructs has internally consistent dimensions, and every validation
//! failure names the offending key.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::nn::Activation;

/// Default SIREN frequency scale (Sitzmann et al., 2020).
const DEFAULT_OMEGA_0: f32 = 30.0;

fn default_omega_0() -> f32 {
    DEFAULT_OMEGA_0
}

/// Which shape-net layers the hypernetwork parameterizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Every shape-net layer receives per-sample weights.
    Full,
    /// Only the last layer is per-sample; earlier layers form a shared
    /// basis network and the parameter vector degenerates to a
    /// coefficient vector of latent width.
    LastLayer,
}

/// Shape-net configuration (`cfg_shape_net`).
///
/// # Example
///
/// ```
/// use flujo::config::{Connectivity, ShapeNetConfig};
///
/// let cfg = ShapeNetConfig::from_json(
///     r#"{
///         "input_dim": 2,
///         "output_dim": 1,
///         "units": 4,
///         "nlayers": 1,
///         "activation": "sine",
///         "use_resblock": false,
///         "connectivity": "full",
///         "omega_0": 30.0
///     }"#,
/// ).unwrap();
/// assert_eq!(cfg.connectivity, Connectivity::Full);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeNetConfig {
    /// Spatial input width (`si_dim`).
    pub input_dim: usize,
    /// Field output width (`so_dim`).
    pub output_dim: usize,
    /// Hidden width (`n_sx`).
    pub units: usize,
    /// Hidden layer count (`l_sx`).
    pub nlayers: usize,
    /// Nonlinearity name; `"sine"` selects the omega_0-scaled path.
    pub activation: String,
    /// Residual hidden blocks instead of plain hidden layers.
    pub use_resblock: bool,
    /// Connectivity mode.
    pub connectivity: Connectivity,
    /// Frequency scale for the sine path.
    #[serde(default = "default_omega_0")]
    pub omega_0: f32,
}

impl ShapeNetConfig {
    /// Parse from the JSON dictionary contract and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            section: "cfg_shape_net".to_string(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate dimension and activation constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_positive("input_dim", self.input_dim)?;
        validate_positive("output_dim", self.output_dim)?;
        validate_positive("units", self.units)?;
        let act = self.parsed_activation()?;
        if act == Activation::Sine && self.omega_0 <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "omega_0".to_string(),
                value: self.omega_0.to_string(),
                constraint: "must be positive for sine activation".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the activation string.
    pub fn parsed_activation(&self) -> Result<Activation, ConfigError> {
        Activation::from_str(&self.activation)
    }
}

/// Parameter-net configuration (`cfg_parameter_net`).
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterNetConfig {
    /// Conditioning input width (`pi_dim`).
    pub input_dim: usize,
    /// Latent code width.
    pub latent_dim: usize,
    /// Hidden width (`n_st`).
    pub units: usize,
    /// Hidden layer count (`l_st`).
    pub nlayers: usize,
    /// Nonlinearity name; `"sine"` selects the SIREN layer stack.
    pub activation: String,
    /// Residual hidden blocks instead of identity-shortcut layers.
    #[serde(default)]
    pub use_resblock: bool,
    /// Frequency scale for the sine path.
    #[serde(default = "default_omega_0")]
    pub omega_0: f32,
}

impl ParameterNetConfig {
    /// Parse from the JSON dictionary contract and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            section: "cfg_parameter_net".to_string(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate dimension and activation constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_positive("input_dim", self.input_dim)?;
        validate_positive("latent_dim", self.latent_dim)?;
        validate_positive("units", self.units)?;
        let act = self.parsed_activation()?;
        if act == Activation::Sine && self.omega_0 <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "omega_0".to_string(),
                value: self.omega_0.to_string(),
                constraint: "must be positive for sine activation".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the activation string.
    pub fn parsed_activation(&self) -> Result<Activation, ConfigError> {
        Activation::from_str(&self.activation)
    }
}

fn validate_positive(key: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            constraint: "must be positive".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape_json(connectivity: &str) -> String {
        format!(
            r#"{{
                "input_dim": 2,
                "output_dim": 1,
                "units": 4,
                "nlayers": 1,
                "activation": "sine",
                "use_resblock": false,
                "connectivity": "{connectivity}"
            }}"#
        )
    }

    #[test]
    fn test_shape_config_parses() {
        let cfg = ShapeNetConfig::from_json(&shape_json("full")).unwrap();
        assert_eq!(cfg.input_dim, 2);
        assert_eq!(cfg.connectivity, Connectivity::Full);
        // omega_0 defaulted
        assert!((cfg.omega_0 - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_last_layer_connectivity_parses() {
        let cfg = ShapeNetConfig::from_json(&shape_json("last_layer")).unwrap();
        assert_eq!(cfg.connectivity, Connectivity::LastLayer);
    }

    #[test]
    fn test_invalid_connectivity_rejected() {
        let err = ShapeNetConfig::from_json(&shape_json("diagonal")).unwrap_err();
        assert!(err.to_string().contains("cfg_shape_net"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let err = ShapeNetConfig::from_json(r#"{"input_dim": 2}"#).unwrap_err();
        let msg = err.to_string();
        // serde names the first missing field
        assert!(msg.contains("missing field"), "got: {msg}");
    }

    #[test]
    fn test_use_resblock_must_be_bool() {
        let json = shape_json("full").replace("false", "\"no\"");
        assert!(ShapeNetConfig::from_json(&json).is_err());
    }

    #[test]
    fn test_zero_units_rejected() {
        let json = shape_json("full").replace("\"units\": 4", "\"units\": 0");
        let err = ShapeNetConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("units"));
    }

    #[test]
    fn test_unknown_activation_rejected() {
        let json = shape_json("full").replace("sine", "wavelet");
        let err = ShapeNetConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("wavelet"));
    }

    #[test]
    fn test_parameter_config_parses() {
        let cfg = ParameterNetConfig::from_json(
            r#"{
                "input_dim": 1,
                "latent_dim": 3,
                "units": 8,
                "nlayers": 2,
                "activation": "swish"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.latent_dim, 3);
        assert!(!cfg.use_resblock);
    }

    #[test]
    fn test_negative_omega_rejected_for_sine() {
        let json = shape_json("full").replace(
            "\"connectivity\": \"full\"",
            "\"connectivity\": \"full\", \"omega_0\": -3.0",
        );
        let err = ShapeNetConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("omega_0"));
    }
}
