//! Layer primitives for the parameter and basis networks.
//!
//! These are the *shared-weight* building blocks: the hypernetwork and
//! the factorized variant's basis network are ordinary feed-forward
//! stacks built from them. The per-sample shape net has no layer objects
//! at all — its weights are decoded from the flat parameter vector and
//! applied by the evaluators in [`crate::shape_net`] and
//! [`crate::basis`].
//!
//! - [`MaskedDense`]: affine + optional nonlinearity, with a persistent
//!   pruning mask
//! - [`Siren`], [`SirenResBlock`]: sine-activated layers for the
//!   implicit-representation path
//! - [`MlpShortcut`], [`MlpResBlock`]: width-preserving residual layers
//!   for the MLP path

mod activation;
mod dense;
pub mod init;
mod residual;
mod siren;

pub use activation::Activation;
pub use dense::MaskedDense;
pub use residual::{MlpResBlock, MlpShortcut};
pub use siren::{Siren, SirenResBlock, SirenRole};
