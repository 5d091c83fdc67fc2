//! Error taxonomy.
//!
//! - [`ValidationError`]: malformed game descriptions, strategies, priors.
//!   Raised at construction time, never while tracing.
//! - [`ContinuationFailure`]: the tracker could not proceed. Carries the last
//!   accepted [`Checkpoint`] so callers can inspect or resume.
//! - [`PersistenceError`]: unreadable or malformed snapshot files. The tracker
//!   attempting the load is left untouched.
use crate::ArcLength;
use crate::Checkpoint;
use crate::Parameter;
use crate::Residual;
use std::path::PathBuf;

/// Umbrella error for callers that drive the whole pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Continuation(#[from] Box<ContinuationFailure>),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<ContinuationFailure> for Error {
    fn from(failure: ContinuationFailure) -> Self {
        Self::Continuation(Box::new(failure))
    }
}

/// Malformed game description or malformed strategy-shaped input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("game has no states")]
    NoStates,
    #[error("game has no players")]
    NoPlayers,
    #[error("state {state}: player {player} has no actions")]
    NoActions { state: usize, player: usize },
    #[error("{what}: expected {expected} entries, found {found}")]
    Count {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("state {state}: {what} shape {found:?} does not match expected {expected:?}")]
    Shape {
        state: usize,
        what: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("tensor of shape {shape:?} holds {found} values")]
    TensorSize { shape: Vec<usize>, found: usize },
    #[error("state {state}: has {found} players, state 0 has {expected}")]
    PlayerCount {
        state: usize,
        expected: usize,
        found: usize,
    },
    #[error("{what} contains a non-finite value")]
    NonFinite { what: &'static str },
    #[error("state {state}, profile {profile}: transition probability {value} outside [0, 1]")]
    TransitionRange {
        state: usize,
        profile: usize,
        value: f64,
    },
    #[error("state {state}, profile {profile}: transition row sums to {sum}")]
    NonStochastic {
        state: usize,
        profile: usize,
        sum: f64,
    },
    #[error("player {player}: discount factor {value} outside [0, 1)")]
    Discount { player: usize, value: f64 },
    #[error("state {state}, player {player}: {what} is off the simplex (sum {sum})")]
    Infeasible {
        state: usize,
        player: usize,
        what: &'static str,
        sum: f64,
    },
    #[error("state {state}, player {player}, action {action}: {what} must be positive")]
    NonPositive {
        state: usize,
        player: usize,
        action: usize,
        what: &'static str,
    },
    #[error("barrier strength must be finite and positive, got {0}")]
    Eta(f64),
    #[error("table: {0}")]
    Table(String),
    #[error("checkpoint: {0}")]
    Checkpoint(String),
}

/// Why the tracker stopped short of its target.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The corrector failed even at the minimum step size.
    MinimumStepSize { ds: ArcLength },
    /// The step budget ran out.
    StepBudget { steps: usize },
    /// The residual left the sanity bound or went non-finite.
    Diverged { residual: Residual },
    /// The starting point does not solve the homotopy system.
    StartingPoint { residual: Residual },
    /// The target was bracketed but could not be landed on.
    Landing { target: Parameter },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MinimumStepSize { ds } => write!(f, "corrector failed at minimum step size {:.2e}", ds),
            Self::StepBudget { steps } => write!(f, "step budget of {} exhausted", steps),
            Self::Diverged { residual } => write!(f, "residual diverged to {:.2e}", residual),
            Self::StartingPoint { residual } => write!(f, "starting point has residual {:.2e}", residual),
            Self::Landing { target } => write!(f, "could not land on target t = {}", target),
        }
    }
}

/// Raised by the tracker. The checkpoint is the last accepted point.
#[derive(Debug, Clone, thiserror::Error)]
#[error("continuation failed at step {} (t = {:.6}): {reason}", .checkpoint.step, .checkpoint.t())]
pub struct ContinuationFailure {
    pub reason: FailureReason,
    pub checkpoint: Checkpoint,
}

/// Snapshot files that cannot be read back.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: malformed snapshot: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: {reason}", .path.display())]
    Schema { path: PathBuf, reason: String },
}
