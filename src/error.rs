//! Error types for flujo operations.
//!
//! Provides rich error context for library consumers. Every error names
//! the offending configuration key or dimension; nothing is silently
//! recovered or retried — evaluation here is deterministic pure
//! computation, not I/O.
//!
//! Three families, matching where in the lifecycle they can occur:
//! - [`ConfigError`] — construction/layout time, before any tensor exists
//! - [`ShapeError`] — first forward pass, with a diagnosable offset
//! - [`crate::pruning::PruningError`] — before any mask mutation

use std::fmt;

/// Configuration errors raised at construction or layout time.
///
/// These fire before any forward pass: a model that constructs
/// successfully has internally consistent dimensions.
///
/// # Examples
///
/// ```
/// use flujo::error::ConfigError;
///
/// let err = ConfigError::InvalidValue {
///     key: "units".to_string(),
///     value: "0".to_string(),
///     constraint: "must be positive".to_string(),
/// };
/// assert!(err.to_string().contains("units"));
/// ```
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// A required configuration key is missing.
    MissingKey {
        /// The missing key
        key: String,
        /// Which config dictionary it belongs to
        section: String,
    },

    /// A configuration value violates its constraint.
    InvalidValue {
        /// Offending key
        key: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// The activation string does not name a known nonlinearity.
    UnknownActivation {
        /// Provided activation name
        name: String,
    },

    /// Declared parameter-vector width disagrees with the layout.
    PoDimMismatch {
        /// Width the layout requires
        expected: usize,
        /// Width actually configured/produced
        actual: usize,
    },

    /// Operation not defined for the configured connectivity.
    UnsupportedOperation {
        /// Operation that was requested
        operation: String,
        /// Why the current configuration excludes it
        reason: String,
    },

    /// A config dictionary failed to deserialize.
    ///
    /// The message is the deserializer's own diagnostic, which names the
    /// missing or mistyped field.
    Parse {
        /// Which config dictionary failed
        section: String,
        /// Deserializer diagnostic
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingKey { key, section } => {
                write!(f, "missing required key `{key}` in {section}")
            }
            ConfigError::InvalidValue {
                key,
                value,
                constraint,
            } => {
                write!(f, "invalid value `{value}` for key `{key}`: {constraint}")
            }
            ConfigError::UnknownActivation { name } => {
                write!(f, "unknown activation `{name}`")
            }
            ConfigError::PoDimMismatch { expected, actual } => {
                write!(
                    f,
                    "parameter vector width mismatch: layout requires po_dim = {expected}, got {actual}"
                )
            }
            ConfigError::UnsupportedOperation { operation, reason } => {
                write!(f, "operation `{operation}` not available: {reason}")
            }
            ConfigError::Parse { section, message } => {
                write!(f, "failed to parse {section}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Shape errors raised at the first forward pass.
///
/// Always diagnosable: each variant carries the dimension (or slice
/// offset) that failed, so a mismatch points straight at the tensor that
/// caused it. Never a silent broadcast.
#[derive(Debug, Clone)]
pub enum ShapeError {
    /// A tensor dimension disagrees with the configured value.
    DimensionMismatch {
        /// Which dimension (human-readable, e.g. "spatial input width")
        dimension: String,
        /// Expected extent
        expected: usize,
        /// Actual extent
        actual: usize,
    },

    /// The flat parameter vector is not `po_dim` wide.
    ///
    /// Carries the first slice offset that would fall outside the vector,
    /// so the failing slice is identifiable.
    ParameterWidth {
        /// Required width
        po_dim: usize,
        /// Actual width
        actual: usize,
        /// First out-of-range slice offset
        offset: usize,
    },

    /// Batch sizes of paired inputs disagree.
    BatchMismatch {
        /// Batch of the first operand
        left: usize,
        /// Batch of the second operand
        right: usize,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::DimensionMismatch {
                dimension,
                expected,
                actual,
            } => {
                write!(f, "{dimension}: expected {expected}, got {actual}")
            }
            ShapeError::ParameterWidth {
                po_dim,
                actual,
                offset,
            } => {
                write!(
                    f,
                    "flat parameter vector must be {po_dim} wide, got {actual} (slice at offset {offset} out of range)"
                )
            }
            ShapeError::BatchMismatch { left, right } => {
                write!(f, "batch size mismatch: {left} vs {right}")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

/// Umbrella error for model-level operations.
///
/// Model methods can fail at any of the three lifecycle stages; this
/// wraps the stage-specific errors so callers get one `?`-friendly type.
#[derive(Debug, Clone)]
pub enum NifError {
    /// Construction/layout-time failure.
    Config(ConfigError),
    /// Forward-pass shape failure.
    Shape(ShapeError),
    /// Pruning usage failure.
    Pruning(crate::pruning::PruningError),
}

impl fmt::Display for NifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NifError::Config(e) => write!(f, "{e}"),
            NifError::Shape(e) => write!(f, "{e}"),
            NifError::Pruning(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for NifError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NifError::Config(e) => Some(e),
            NifError::Shape(e) => Some(e),
            NifError::Pruning(e) => Some(e),
        }
    }
}

impl From<ConfigError> for NifError {
    fn from(e: ConfigError) -> Self {
        NifError::Config(e)
    }
}

impl From<ShapeError> for NifError {
    fn from(e: ShapeError) -> Self {
        NifError::Shape(e)
    }
}

impl From<crate::pruning::PruningError> for NifError {
    fn from(e: crate::pruning::PruningError) -> Self {
        NifError::Pruning(e)
    }
}
