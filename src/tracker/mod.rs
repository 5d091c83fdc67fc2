//! Predictor-corrector continuation along a homotopy path.
//!
//! - [`PathTracker`]: the mutable tracing session
//! - [`Settings`]: step-size, tolerance, and budget tuning
//! - [`Checkpoint`] and [`Snapshot`]: resumable state, in memory and on disk
//! - [`PathBuffer`]: bounded record of accepted points
mod checkpoint;
mod geometry;
mod path;
mod settings;
mod status;
mod tracker;

pub use checkpoint::*;
pub use path::*;
pub use settings::*;
pub use status::*;
pub use tracker::*;
