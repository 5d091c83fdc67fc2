//! Equilibria of finite stochastic games by homotopy continuation.
//!
//! A [`StochasticGame`] defines the algebraic system. A [`Homotopy`]
//! ([`QRE`] or [`LogTracing`]) deforms an easy system at `t = 0` into the
//! equilibrium conditions at `t = 1`, and the [`PathTracker`] follows the
//! solution path with a predictor-corrector scheme. The converged state
//! vector is read back through [`Equilibrium`].
//!
//! # Module Structure
//!
//! - `game`: Game description, layout of the state vector, tabular form
//! - `profile`: Strategy profiles and value functions
//! - `homotopy`: Homotopy trait, shared expectation engine, QRE, LogTracing
//! - `tracker`: Predictor-corrector path tracker, checkpoints, path buffer
//! - `equilibrium`: Equilibrium view, report, equilibrium check
pub mod equilibrium;
pub mod error;
pub mod game;
pub mod homotopy;
pub mod profile;
pub mod tracker;

pub use equilibrium::*;
pub use error::*;
pub use game::*;
pub use homotopy::*;
pub use profile::*;
pub use tracker::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Stage payoffs, continuation values, action values.
pub type Utility = f64;
/// Strategy entries, transition probabilities, discount factors.
pub type Probability = f64;
/// The homotopy parameter `t`, its targets, and barrier strengths.
pub type Parameter = f64;
/// Arc length of the `(σ, V, t)` path and step sizes along it.
pub type ArcLength = f64;
/// Norms of homotopy residuals and Newton updates.
pub type Residual = f64;

// ============================================================================
// GAME VALIDATION
// ============================================================================
/// Tolerance on transition rows summing to one.
pub const STOCHASTIC_TOLERANCE: Probability = 1e-8;
/// Floating-point drift on the product of simplices that may be renormalized away.
/// Anything beyond this is reported as infeasible, never masked.
pub const SIMPLEX_DRIFT: Probability = 1e-6;
/// Amount, relative to the largest absolute payoff, by which an action may
/// exceed its player's value on an accepted point.
pub const FEASIBILITY_TOLERANCE: Utility = 1e-7;

// ============================================================================
// HOMOTOPY PARAMETERS
// ============================================================================
/// Default barrier strength η of the logarithmic tracing homotopy, relative
/// to the largest absolute payoff. Small enough that the path from a prior
/// stays with the equilibrium that prior favours.
pub const TRACING_ETA: Parameter = 0.02;
/// Fixed-point iterations allowed when locating the tracing starting point.
pub const TRACING_Y0_ITERATIONS: usize = 100_000;
/// Convergence threshold (sup norm, relative) of the tracing starting point.
pub const TRACING_Y0_TOLERANCE: Utility = 1e-13;
/// Safeguarded Newton iterations for the per-(state, player) barrier multiplier.
pub const BARRIER_ROOT_ITERATIONS: usize = 200;
/// Residual of the barrier multiplier equation accepted as a root.
pub const BARRIER_ROOT_TOLERANCE: Residual = 1e-14;

// ============================================================================
// PATH TRACKER DEFAULTS
// Step sizes are measured in arc length of the (σ, V, t) path.
// ============================================================================
/// Default homotopy target.
pub const TRACKER_TARGET: Parameter = 1.0;
/// Initial predictor step.
pub const TRACKER_DS_INITIAL: ArcLength = 0.01;
/// Smallest step before the tracker gives up.
pub const TRACKER_DS_MIN: ArcLength = 1e-10;
/// Largest step the tracker may grow into.
pub const TRACKER_DS_MAX: ArcLength = 10.0;
/// Growth factor after fast corrector convergence.
pub const TRACKER_DS_INFLATION: f64 = 1.2;
/// Shrink factor after slow convergence or corrector failure.
pub const TRACKER_DS_DEFLATION: f64 = 0.5;
/// Residual norm accepted by the corrector.
pub const TRACKER_CORRECTOR_TOLERANCE: Residual = 1e-9;
/// Newton iterations per corrector attempt.
pub const TRACKER_CORRECTOR_ITERATIONS: usize = 20;
/// Corrector iterations at or below which the step grows.
pub const TRACKER_FAST_ITERATIONS: usize = 3;
/// Corrector iterations at or above which the next step shrinks.
pub const TRACKER_SLOW_ITERATIONS: usize = 8;
/// Maximum ratio of successive Newton updates before the corrector is deemed divergent.
pub const TRACKER_CONTRACTION_MAX: f64 = 0.5;
/// Minimum cosine between successive tangents.
pub const TRACKER_TANGENT_COS_MIN: f64 = 0.9;
/// Residual norm beyond which the corrector is deemed divergent.
pub const TRACKER_RESIDUAL_MAX: Residual = 1e6;
/// Accepted predictor-corrector steps before giving up.
pub const TRACKER_MAX_STEPS: usize = 100_000;
/// Distance in t at which the tracker considers itself on target.
pub const TRACKER_TARGET_TOLERANCE: Parameter = 1e-10;
/// Bracket bisections allowed when landing on the target.
pub const LANDING_BISECTIONS: usize = 32;
/// Default path buffer capacity.
pub const PATH_CAPACITY: usize = 1_000_000;

// ============================================================================
// PERSISTENCE
// ============================================================================
/// Format tag written into every snapshot file.
pub const SNAPSHOT_FORMAT: &str = "sgame-tracker";
/// Snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "cli")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
