//! Reading results: equilibrium views, reports, and equilibrium checks.
mod check;
mod equilibrium;
mod report;

pub use check::*;
pub use equilibrium::*;
pub use report::*;
