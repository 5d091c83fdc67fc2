use serde::Deserialize;
use serde::Serialize;

/// Lifecycle of a [`crate::PathTracker`].
///
/// `Ready → Tracking → Converged` on success. A failed step leaves the tracker
/// `Failed` at its last accepted point; stepping again resumes. Moving the
/// target of a converged tracker puts it back to `Tracking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Holds a starting point whose tangent is not yet known.
    Ready,
    /// On the path, between the start and the target.
    Tracking,
    /// Landed on the target.
    Converged,
    /// Gave up. Stepping again resumes from the last accepted point.
    Failed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Tracking => write!(f, "tracking"),
            Self::Converged => write!(f, "converged"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
