//! Strategy profiles and value functions, the two halves of
//! a state vector that mean something to a caller.
mod strategy;
mod values;

pub use strategy::*;
pub use values::*;
