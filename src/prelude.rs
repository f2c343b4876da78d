//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use flujo::prelude::*;
//! ```

pub use crate::config::{Connectivity, ParameterNetConfig, ShapeNetConfig};
pub use crate::error::{ConfigError, NifError, ShapeError};
pub use crate::layout::ParameterLayout;
pub use crate::model::Nif;
pub use crate::pruning::{PruneReport, PruningError};
pub use crate::tensor::{DType, MixedPolicy, Tensor};
