//! Stochastic game description.
//!
//! [`StochasticGame`] is the validated, immutable model every homotopy reads.
//! [`Layout`] owns the index arithmetic of the `(σ, V, t)` state vector.
//! [`GameDescription`] and [`Table`] are the JSON and tabular exchange forms.
mod description;
mod discount;
mod game;
mod labels;
mod layout;
mod random;
mod table;
mod tensor;

pub use description::*;
pub use discount::*;
pub use game::*;
pub use labels::*;
pub use layout::*;
pub use table::*;
pub use tensor::*;
