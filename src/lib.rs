//! Flujo: neural implicit flow in pure Rust.
//!
//! A *parameter network* consumes a low-dimensional conditioning input
//! (time, case index) and emits one flat weight vector per sample; a
//! *shape network* consumes a spatial coordinate and evaluates a field
//! value using those per-sample weights. Flujo implements the
//! deterministic slicing protocol between the two, the batched
//! per-sample evaluation, and the structured pruning that stays
//! consistent with the slicing.
//!
//! # Quick Start
//!
//! ```
//! use flujo::prelude::*;
//!
//! let cfg_shape = ShapeNetConfig::from_json(r#"{
//!     "input_dim": 2, "output_dim": 1, "units": 4, "nlayers": 1,
//!     "activation": "sine", "use_resblock": false, "connectivity": "full"
//! }"#).unwrap();
//! let cfg_param = ParameterNetConfig::from_json(r#"{
//!     "input_dim": 1, "latent_dim": 3, "units": 8, "nlayers": 2,
//!     "activation": "swish"
//! }"#).unwrap();
//!
//! let model = Nif::with_seed(&cfg_shape, &cfg_param, MixedPolicy::float32(), Some(7)).unwrap();
//!
//! // Rows are [conditioning | spatial]: one time column, two coordinates.
//! let inputs = Tensor::new(&[0.0, 0.1, 0.2, 0.5, 0.4, 0.8], &[2, 3]);
//! let field = model.forward(&inputs).unwrap();
//! assert_eq!(field.shape(), &[2, 1]);
//! ```
//!
//! # Modules
//!
//! - [`tensor`]: dense `f32` tensor with the batched contractions and
//!   the numeric precision boundary
//! - [`config`]: the two config dictionaries and their validation
//! - [`layout`]: flat-parameter-vector slicing (the index arithmetic)
//! - [`shape_net`]: batched per-sample evaluation, full connectivity
//! - [`basis`]: shared basis network and factorized last-layer evaluation
//! - [`parameter_net`]: the hypernetwork stack
//! - [`pruning`]: monotone masks, magnitude and shape-unit pruning
//! - [`model`]: the [`model::Nif`] facade and its exposed sub-models
//! - [`nn`]: shared-weight layer primitives
//! - [`error`]: configuration, shape, and umbrella error types

pub mod basis;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod nn;
pub mod parameter_net;
pub mod prelude;
pub mod pruning;
pub mod shape_net;
pub mod tensor;
