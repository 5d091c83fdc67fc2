//! Homotopies from an easy system at `t = 0` to equilibrium conditions.
//!
//! - [`Homotopy`]: the interface the tracker drives
//! - [`Expectation`]: action values and their derivatives, shared by both variants
//! - [`QRE`]: logit quantal response, `t` is the precision λ
//! - [`LogTracing`]: logarithmic tracing procedure anchored at a prior
mod expectation;
mod homotopy;
mod qre;
mod tracing;

pub use expectation::*;
pub use homotopy::*;
pub use qre::*;
pub use tracing::*;
