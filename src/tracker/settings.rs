use crate::*;
use serde::Deserialize;
use serde::Serialize;

/// Tunable parameters of a [`PathTracker`].
///
/// Defaults come from the constants in the crate root. Settings travel with
/// snapshot files, so a resumed run uses exactly the tuning it was saved with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Value of `t` to land on.
    pub target: Parameter,
    pub ds_initial: ArcLength,
    pub ds_min: ArcLength,
    pub ds_max: ArcLength,
    pub ds_inflation: f64,
    pub ds_deflation: f64,
    pub corrector_tolerance: Residual,
    pub corrector_iterations: usize,
    /// Corrector iterations at or below which `ds` grows.
    pub fast_iterations: usize,
    /// Corrector iterations at or above which `ds` shrinks.
    pub slow_iterations: usize,
    pub contraction_max: f64,
    pub tangent_cos_min: f64,
    pub residual_max: Residual,
    pub max_steps: usize,
    pub target_tolerance: Parameter,
    pub landing_bisections: usize,
    /// 0 silent, 1 start and end of a solve, 2 every step.
    pub verbose: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: TRACKER_TARGET,
            ds_initial: TRACKER_DS_INITIAL,
            ds_min: TRACKER_DS_MIN,
            ds_max: TRACKER_DS_MAX,
            ds_inflation: TRACKER_DS_INFLATION,
            ds_deflation: TRACKER_DS_DEFLATION,
            corrector_tolerance: TRACKER_CORRECTOR_TOLERANCE,
            corrector_iterations: TRACKER_CORRECTOR_ITERATIONS,
            fast_iterations: TRACKER_FAST_ITERATIONS,
            slow_iterations: TRACKER_SLOW_ITERATIONS,
            contraction_max: TRACKER_CONTRACTION_MAX,
            tangent_cos_min: TRACKER_TANGENT_COS_MIN,
            residual_max: TRACKER_RESIDUAL_MAX,
            max_steps: TRACKER_MAX_STEPS,
            target_tolerance: TRACKER_TARGET_TOLERANCE,
            landing_bisections: LANDING_BISECTIONS,
            verbose: 1,
        }
    }
}

impl Settings {
    /// Cautious preset for paths that turn sharply or land on a crowded target.
    ///
    /// Short steps that grow slowly, a tighter corrector, a stricter
    /// tangent check, and more landing bisections.
    pub fn robust() -> Self {
        Self {
            ds_initial: 1e-3,
            ds_max: 0.1,
            ds_inflation: 1.1,
            corrector_tolerance: 1e-10,
            fast_iterations: 2,
            contraction_max: 0.3,
            tangent_cos_min: 0.99,
            landing_bisections: 2 * LANDING_BISECTIONS,
            ..Self::default()
        }
    }

    /// Reasons these settings cannot drive a tracker, if any.
    pub fn check(&self) -> Result<(), String> {
        let positive = [
            ("ds_initial", self.ds_initial),
            ("ds_min", self.ds_min),
            ("ds_max", self.ds_max),
            ("corrector_tolerance", self.corrector_tolerance),
            ("residual_max", self.residual_max),
            ("target_tolerance", self.target_tolerance),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, x)| !(x.is_finite() && *x > 0.)) {
            return Err(format!("{} must be finite and positive, got {}", name, value));
        }
        if !self.target.is_finite() {
            return Err(format!("target must be finite, got {}", self.target));
        }
        if self.ds_min > self.ds_max {
            return Err(format!("ds_min {} exceeds ds_max {}", self.ds_min, self.ds_max));
        }
        if !(self.ds_inflation >= 1.) {
            return Err(format!("ds_inflation must be at least 1, got {}", self.ds_inflation));
        }
        if !(self.ds_deflation > 0. && self.ds_deflation < 1.) {
            return Err(format!("ds_deflation must lie in (0, 1), got {}", self.ds_deflation));
        }
        if self.corrector_iterations == 0 {
            return Err("corrector_iterations must be positive".to_string());
        }
        Ok(())
    }
}
