use super::geometry;
use super::geometry::Breakdown;
use super::geometry::Correction;
use crate::*;
use nalgebra::DVector;
use std::path::Path;

/// Predictor-corrector tracker of the solution path of a [`Homotopy`].
///
/// A mutable session. Every setter documents what it invalidates:
///
/// - [`PathTracker::set_y`] discards the tangent, so the next step
///   recomputes it and re-checks the point. The tracker becomes `Ready`.
/// - [`PathTracker::set_sign`] and [`PathTracker::flip`] only change
///   the direction of travel along the canonical tangent.
/// - [`PathTracker::set_target`] moves the landing point. A converged
///   tracker whose target moves continues tracking.
/// - [`PathTracker::settings_mut`] takes effect at the next step.
pub struct PathTracker<H: Homotopy> {
    homotopy: H,
    settings: Settings,
    y: DVector<f64>,
    tangent: Option<DVector<f64>>,
    sign: i8,
    s: ArcLength,
    step: usize,
    ds: ArcLength,
    status: Status,
    path: Option<PathBuffer>,
}

impl<H: Homotopy> PathTracker<H> {
    /// Start at the homotopy's `y0`, heading for its default target.
    pub fn new(homotopy: H) -> Self {
        let settings = Settings {
            target: homotopy.target(),
            ..Settings::default()
        };
        let y = homotopy.y0();
        Self {
            homotopy,
            ds: settings.ds_initial,
            settings,
            y,
            tangent: None,
            sign: 1,
            s: 0.,
            step: 0,
            status: Status::Ready,
            path: None,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.ds = settings.ds_initial;
        self.settings = settings;
        self
    }

    pub fn homotopy(&self) -> &H {
        &self.homotopy
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }
    pub fn t(&self) -> Parameter {
        self.y[self.y.len() - 1]
    }
    /// Arc length travelled.
    pub fn s(&self) -> ArcLength {
        self.s
    }
    pub fn step_count(&self) -> usize {
        self.step
    }
    pub fn ds(&self) -> ArcLength {
        self.ds
    }
    pub fn sign(&self) -> i8 {
        self.sign
    }
    pub fn status(&self) -> Status {
        self.status
    }
    /// Canonical tangent at the current point. Travel follows `sign` times this.
    pub fn tangent(&self) -> Option<&DVector<f64>> {
        self.tangent.as_ref()
    }

    /// Reseat the tracker at an arbitrary point, such as one built with
    /// [`Homotopy::sigma_v_t_to_y`]. The point is checked on the next step.
    pub fn set_y(&mut self, y: DVector<f64>) -> Result<(), ValidationError> {
        let dim = self.homotopy.layout().dim();
        if y.len() != dim {
            return Err(ValidationError::Count {
                what: "state vector entries",
                expected: dim,
                found: y.len(),
            });
        }
        if y.iter().any(|x| !x.is_finite()) {
            return Err(ValidationError::NonFinite { what: "state vector" });
        }
        self.y = y;
        self.tangent = None;
        self.ds = self.settings.ds_initial;
        self.status = Status::Ready;
        if let Some(ref mut buffer) = self.path {
            buffer.clear();
        }
        Ok(())
    }
    /// Negative values travel against the canonical tangent, anything else along it.
    pub fn set_sign(&mut self, sign: i8) {
        self.sign = if sign < 0 { -1 } else { 1 };
    }
    pub fn flip(&mut self) {
        self.sign = -self.sign;
    }
    pub fn set_target(&mut self, target: Parameter) {
        self.settings.target = target;
    }

    /// Record every accepted point from now on, keeping at most `capacity`.
    pub fn start_storing_path(&mut self, capacity: usize) {
        self.path = Some(PathBuffer::new(capacity));
        self.record();
    }
    pub fn stop_storing_path(&mut self) {
        self.path = None;
    }
    pub fn path(&self) -> impl Iterator<Item = &PathRecord> {
        self.path.iter().flat_map(|buffer| buffer.iter())
    }

    /// Rewind to the recorded point of step `n`, dropping everything after it.
    pub fn return_to_step(&mut self, n: usize) -> Result<(), ValidationError> {
        let record = self
            .path
            .as_mut()
            .and_then(|buffer| buffer.truncate(n))
            .cloned()
            .ok_or_else(|| ValidationError::Checkpoint(format!("step {} is not in the recorded path", n)))?;
        self.y = record.y;
        self.tangent = Some(record.tangent);
        self.s = record.s;
        self.ds = record.ds;
        self.step = record.step;
        self.status = Status::Tracking;
        Ok(())
    }

    /// Resumable state at the current point.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            y: self.y.as_slice().to_vec(),
            tangent: self.tangent.as_ref().map(|t| t.as_slice().to_vec()),
            sign: self.sign,
            s: self.s,
            step: self.step,
            ds: self.ds,
        }
    }
    /// Resume from a checkpoint, such as the one carried by a [`ContinuationFailure`].
    pub fn restore(&mut self, checkpoint: &Checkpoint) -> Result<(), ValidationError> {
        checkpoint
            .check(self.homotopy.layout().dim())
            .map_err(ValidationError::Checkpoint)?;
        self.apply(checkpoint);
        Ok(())
    }
    fn apply(&mut self, checkpoint: &Checkpoint) {
        self.y = DVector::from_column_slice(&checkpoint.y);
        self.tangent = checkpoint.tangent.as_deref().map(DVector::from_column_slice);
        self.sign = checkpoint.sign;
        self.s = checkpoint.s;
        self.step = checkpoint.step;
        self.ds = checkpoint.ds;
        self.status = self.resumed();
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        Snapshot {
            format: SNAPSHOT_FORMAT.to_string(),
            version: SNAPSHOT_VERSION,
            homotopy: self.homotopy.name().to_string(),
            dim: self.homotopy.layout().dim(),
            status: self.status,
            checkpoint: self.checkpoint(),
            settings: self.settings.clone(),
        }
        .save(path.as_ref())
    }
    /// Replace the session state with a saved one.
    /// Nothing changes unless the whole file checks out.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let snapshot = Snapshot::load(path.as_ref(), self.homotopy.name(), self.homotopy.layout().dim())?;
        self.settings = snapshot.settings;
        self.apply(&snapshot.checkpoint);
        if self.tangent.is_some() {
            self.status = snapshot.status;
        }
        if let Some(ref mut buffer) = self.path {
            buffer.clear();
        }
        Ok(())
    }

    /// Read the current point as an equilibrium.
    pub fn equilibrium(&self) -> Result<Equilibrium, ValidationError> {
        self.homotopy.equilibrium(&self.y)
    }

    /// Step until the target is reached.
    pub fn solve(&mut self) -> Result<Equilibrium, Error> {
        let clock = std::time::Instant::now();
        if self.settings.verbose >= 1 {
            log::info!(
                "{} tracing from t = {:.4} to t = {:.4}",
                self.homotopy.name(),
                self.t(),
                self.settings.target
            );
        }
        while self.step()? != Status::Converged {}
        let equilibrium = self.equilibrium()?;
        if self.settings.verbose >= 1 {
            log::info!(
                "converged at step {} in {:.2?} (s = {:.4}, residual = {:.2e})",
                self.step,
                clock.elapsed(),
                self.s,
                equilibrium.residual
            );
        }
        Ok(equilibrium)
    }

    /// Take one predictor-corrector step, or land on the target.
    pub fn step(&mut self) -> Result<Status, ContinuationFailure> {
        match self.status {
            Status::Converged if self.on_target() => return Ok(Status::Converged),
            Status::Converged => self.status = self.resumed(),
            Status::Failed => {
                self.ds = self.settings.ds_initial;
                self.status = self.resumed();
            }
            Status::Ready | Status::Tracking => {}
        }
        if self.status == Status::Ready {
            self.start()?;
            if self.status == Status::Converged {
                return Ok(Status::Converged);
            }
        }
        if self.step >= self.settings.max_steps {
            return Err(self.fail(FailureReason::StepBudget { steps: self.step }));
        }
        self.advance()
    }

    fn resumed(&self) -> Status {
        match self.tangent {
            Some(_) => Status::Tracking,
            None => Status::Ready,
        }
    }

    fn on_target(&self) -> bool {
        (self.t() - self.settings.target).abs() < self.settings.target_tolerance
    }

    /// Check the starting point and find its tangent.
    fn start(&mut self) -> Result<(), ContinuationFailure> {
        let d = self.y.len();
        let residual = self.homotopy.h(&self.y).norm();
        if !residual.is_finite() {
            return Err(self.fail(FailureReason::StartingPoint { residual }));
        }
        if residual >= self.settings.corrector_tolerance {
            log::debug!("starting point has residual {:.2e}, correcting at fixed t", residual);
            match geometry::correct(&self.homotopy, self.y.clone(), &geometry::unit(d, d - 1), &self.settings) {
                Ok(correction) => self.y = correction.y,
                Err(_) => return Err(self.fail(FailureReason::StartingPoint { residual })),
            }
        }
        if self.on_target() {
            self.status = Status::Converged;
            return Ok(());
        }
        match geometry::initial_tangent(&self.homotopy.jacobian(&self.y)) {
            Some(tangent) => {
                self.tangent = Some(tangent);
                self.status = Status::Tracking;
                self.record();
                Ok(())
            }
            None => Err(self.fail(FailureReason::StartingPoint { residual })),
        }
    }

    /// Predict, correct, and shrink `ds` until a step is accepted.
    /// Terminates because `ds` shrinks geometrically toward `ds_min`.
    fn advance(&mut self) -> Result<Status, ContinuationFailure> {
        let tangent = self
            .tangent
            .clone()
            .expect("tracking tracker holds a tangent");
        let target = self.settings.target;
        let mut reason = None;
        loop {
            let predicted = &self.y + &tangent * (self.sign as f64 * self.ds);
            match geometry::correct(&self.homotopy, predicted, &tangent, &self.settings) {
                Ok(correction) if !self.crosses(&correction.y) && !self.homotopy.feasible(&correction.y) => {
                    log::debug!("corrector left the feasible branch at ds = {:.2e}, retrying", self.ds);
                    reason = None;
                }
                Ok(correction) => match geometry::tangent(&self.homotopy.jacobian(&correction.y), &tangent) {
                    Some(next) if next.dot(&tangent) >= self.settings.tangent_cos_min => {
                        if !self.crosses(&correction.y) {
                            return Ok(self.accept(correction, next, None));
                        }
                        match self.land(&correction.y) {
                            Some(landed) => return Ok(self.accept(correction, next, Some(landed))),
                            None => {
                                log::debug!("landing failed at ds = {:.2e}, retrying", self.ds);
                                reason = Some(FailureReason::Landing { target });
                            }
                        }
                    }
                    _ => {
                        log::debug!("tangent turned too far at ds = {:.2e}, retrying", self.ds);
                        reason = None;
                    }
                },
                Err(failure) => {
                    log::debug!("corrector {:?} at ds = {:.2e}, retrying", failure, self.ds);
                    reason = match failure {
                        Breakdown::Diverged(residual) => Some(FailureReason::Diverged { residual }),
                        Breakdown::Stalled | Breakdown::Singular => None,
                    };
                }
            }
            self.ds *= self.settings.ds_deflation;
            if self.ds < self.settings.ds_min {
                self.ds = self.settings.ds_min;
                let reason = reason.unwrap_or(FailureReason::MinimumStepSize { ds: self.ds });
                return Err(self.fail(reason));
            }
        }
    }

    /// Whether the segment from the current point to `next` reaches the target.
    fn crosses(&self, next: &DVector<f64>) -> bool {
        let before = self.t() - self.settings.target;
        let after = next[next.len() - 1] - self.settings.target;
        before != 0. && before * after <= 0.
    }

    /// Move to an accepted point, or to the landing point between here and there.
    fn accept(&mut self, correction: Correction, next: DVector<f64>, landed: Option<DVector<f64>>) -> Status {
        if correction.iterations <= self.settings.fast_iterations {
            self.ds = (self.ds * self.settings.ds_inflation).min(self.settings.ds_max);
        } else if correction.iterations >= self.settings.slow_iterations {
            self.ds = (self.ds * self.settings.ds_deflation).max(self.settings.ds_min);
        }
        self.step += 1;
        match landed {
            Some(landed) => {
                let tangent = geometry::tangent(&self.homotopy.jacobian(&landed), &next);
                self.s += (&landed - &self.y).norm();
                self.tangent = Some(tangent.unwrap_or(next));
                self.y = landed;
                self.status = Status::Converged;
            }
            None => {
                self.s += (&correction.y - &self.y).norm();
                self.tangent = Some(next);
                self.y = correction.y;
            }
        }
        self.record();
        if self.settings.verbose >= 2 {
            log::info!(
                "step {:>6} | t = {:>10.6} | s = {:>10.4} | ds = {:.2e} | iterations {} | residual {:.2e}",
                self.step,
                self.t(),
                self.s,
                self.ds,
                correction.iterations,
                correction.residual
            );
        }
        self.status
    }

    /// Land on `t = target` between the current point and `next`.
    ///
    /// Interpolates and corrects at fixed `t`. A landing point must be
    /// feasible and no farther from its guess than the bracket is long,
    /// otherwise Newton has jumped to another branch. When that fails,
    /// bisects the bracket with midpoints corrected orthogonally to the chord.
    /// Points past the target are not checked for feasibility: beyond `t = 1`
    /// the tracing barrier changes sign.
    fn land(&self, next: &DVector<f64>) -> Option<DVector<f64>> {
        let d = self.y.len();
        let target = self.settings.target;
        let fixed = geometry::unit(d, d - 1);
        let mut lo = self.y.clone();
        let mut hi = next.clone();
        for _ in 0..=self.settings.landing_bisections {
            let chord = &hi - &lo;
            let length = chord.norm();
            if !(length > 0.) {
                return None;
            }
            let span = chord[d - 1];
            let theta = if span == 0. { 0.5 } else { (target - lo[d - 1]) / span };
            let mut guess = &lo + &chord * theta;
            guess[d - 1] = target;
            if let Ok(correction) = geometry::correct(&self.homotopy, guess.clone(), &fixed, &self.settings) {
                if (&correction.y - &guess).norm() <= length && self.homotopy.feasible(&correction.y) {
                    return Some(correction.y);
                }
                log::debug!("landing from a bracket of length {:.2e} left the branch", length);
            }
            let middle = (&lo + &hi) * 0.5;
            let middle = geometry::correct(&self.homotopy, middle, &(chord / length), &self.settings).ok()?;
            log::debug!("landing bisected to t = {:.8}", middle.y[d - 1]);
            if (middle.y[d - 1] - target) * (lo[d - 1] - target) > 0. {
                lo = middle.y;
            } else {
                hi = middle.y;
            }
        }
        None
    }

    fn fail(&mut self, reason: FailureReason) -> ContinuationFailure {
        self.status = Status::Failed;
        if self.settings.verbose >= 1 {
            log::warn!("{} tracking failed at step {}: {}", self.homotopy.name(), self.step, reason);
        }
        ContinuationFailure {
            reason,
            checkpoint: self.checkpoint(),
        }
    }

    fn record(&mut self) {
        if let (Some(buffer), Some(tangent)) = (self.path.as_mut(), self.tangent.as_ref()) {
            buffer.push(PathRecord {
                step: self.step,
                s: self.s,
                t: self.y[self.y.len() - 1],
                ds: self.ds,
                y: self.y.clone(),
                tangent: tangent.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_shot(payoffs: [f64; 8]) -> StochasticGame {
        StochasticGame::one_shot(Tensor::new(vec![2, 2, 2], payoffs.to_vec()).unwrap()).unwrap()
    }
    fn prisoners_dilemma() -> StochasticGame {
        one_shot([2., 0., 3., 1., 2., 3., 0., 1.])
            .with_action_labels(vec!["cooperate".into(), "defect".into()])
            .unwrap()
    }
    fn stag_hunt() -> StochasticGame {
        one_shot([10., 1., 8., 5., 10., 8., 1., 5.])
            .with_action_labels(vec!["stag".into(), "hare".into()])
            .unwrap()
    }
    fn quiet<H: Homotopy>(homotopy: H) -> PathTracker<H> {
        let mut tracker = homotopy.tracker();
        tracker.settings_mut().verbose = 0;
        tracker
    }
    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn prisoners_dilemma_defects() {
        let equilibrium = quiet(LogTracing::new(prisoners_dilemma())).solve().unwrap();
        for i in 0..2 {
            assert!(close(equilibrium.strategies.get(0, i, 1), 1., 1e-6));
            assert!(close(equilibrium.values.get(0, i), 1., 1e-6));
        }
        assert!(equilibrium.residual < 1e-6);
        assert!(close(equilibrium.t, 1., 1e-12));
    }

    macro_rules! stag_hunt {
        ($name:ident, $prior:expr, $action:expr, $value:expr) => {
            paste::paste! {
                #[test]
                fn [<stag_hunt_prior_ $name>]() {
                    let game = stag_hunt();
                    let prior = Strategy::from(vec![vec![$prior.to_vec(); 2]]);
                    let tracing = LogTracing::new(game).with_prior(prior).unwrap();
                    let equilibrium = quiet(tracing).solve().unwrap();
                    for i in 0..2 {
                        assert!(close(equilibrium.strategies.get(0, i, $action), 1., 1e-6));
                        assert!(close(equilibrium.values.get(0, i), $value, 1e-6));
                    }
                }
            }
        };
    }

    #[rustfmt::skip] stag_hunt!(stag,    [1.0, 0.0], 0, 10.0);
    #[rustfmt::skip] stag_hunt!(hare,    [0.0, 1.0], 1,  5.0);
    #[rustfmt::skip] stag_hunt!(uniform, [0.5, 0.5], 1,  5.0);
    #[rustfmt::skip] stag_hunt!(leaning, [0.9, 0.1], 0, 10.0);

    fn mixed_stag_hunt() -> PathTracker<LogTracing> {
        let mut tracker = quiet(LogTracing::new(stag_hunt()));
        let sigma = Strategy::from(vec![vec![vec![2. / 3., 1. / 3.]; 2]]);
        let values = Values::from(vec![vec![7., 7.]]);
        let y = tracker.homotopy().sigma_v_t_to_y(&sigma, &values, 1.).unwrap();
        assert!(tracker.homotopy().h(&y).norm() < 1e-12);
        tracker.set_y(y).unwrap();
        tracker
    }

    #[test]
    fn mixed_stag_hunt_reconverges_backwards() {
        let mut tracker = mixed_stag_hunt();
        tracker.flip();
        tracker.set_target(1. - 1e-3);
        let equilibrium = tracker.solve().unwrap();
        assert!(close(equilibrium.t, 1. - 1e-3, 1e-10));
        for i in 0..2 {
            assert!(close(equilibrium.strategies.get(0, i, 0), 2. / 3., 1e-2));
            assert!(close(equilibrium.values.get(0, i), 7., 1e-1));
        }
    }

    #[test]
    fn mixed_stag_hunt_is_already_on_target() {
        let mut tracker = mixed_stag_hunt();
        assert_eq!(tracker.step().unwrap(), Status::Converged);
        assert_eq!(tracker.step_count(), 0);
        let equilibrium = tracker.equilibrium().unwrap();
        assert!(equilibrium.residual < 1e-12);
    }

    #[test]
    fn qre_sweep_is_monotone() {
        let mut tracker = quiet(QRE::new(stag_hunt()));
        let mut previous = 0.5;
        for k in 1..=20 {
            tracker.set_target(k as f64 / 10.);
            let equilibrium = tracker.solve().unwrap();
            let hare = equilibrium.strategies.get(0, 0, 1);
            assert!(hare > previous, "λ = {}: {} after {}", k as f64 / 10., hare, previous);
            assert!(close(hare, equilibrium.strategies.get(0, 1, 1), 1e-8));
            previous = hare;
        }
        assert!(previous > 0.99);
    }

    #[test]
    fn random_games_solve() {
        for seed in 0..3 {
            let game = StochasticGame::random(2, 2, 2, 0.9, seed).unwrap();
            let qre = quiet(QRE::new(game.clone())).solve().unwrap();
            assert!(qre.strategies.check(game.layout()).is_ok());
            let nash = quiet(LogTracing::new(game.clone())).solve().unwrap();
            assert!(nash.residual < 1e-6, "seed {}: residual {}", seed, nash.residual);
            assert!(is_equilibrium(&game, &nash.strategies, 1e-6).unwrap());
        }
    }

    macro_rules! tracing_endpoint {
        ($name:ident, $discount:expr) => {
            paste::paste! {
                #[test]
                fn [<tracing_endpoints_are_equilibria_ $name>]() {
                    for seed in 0..5 {
                        let game = StochasticGame::random(2, 2, 2, $discount, seed).unwrap();
                        let nash = quiet(LogTracing::new(game.clone())).solve().unwrap();
                        assert!(nash.residual < 1e-6, "seed {}: residual {}", seed, nash.residual);
                        assert!(is_equilibrium(&game, &nash.strategies, 1e-6).unwrap(), "seed {}", seed);
                    }
                }
            }
        };
    }

    #[rustfmt::skip] tracing_endpoint!(one_shot,   0.0);
    #[rustfmt::skip] tracing_endpoint!(impatient,  0.5);
    #[rustfmt::skip] tracing_endpoint!(patient,    0.9);

    #[test]
    fn robust_preset_solves() {
        let prior = Strategy::from(vec![vec![vec![1., 0.]; 2]]);
        let tracing = LogTracing::new(stag_hunt()).with_prior(prior).unwrap();
        let mut tracker = tracing.tracker().with_settings(Settings::robust());
        tracker.settings_mut().verbose = 0;
        let equilibrium = tracker.solve().unwrap();
        for i in 0..2 {
            assert!(close(equilibrium.strategies.get(0, i, 0), 1., 1e-6));
            assert!(close(equilibrium.values.get(0, i), 10., 1e-6));
        }
    }

    #[test]
    fn save_load_matches_uninterrupted() {
        let file = std::env::temp_dir().join(format!("sgame-snapshot-{}.json", std::process::id()));
        let mut original = quiet(LogTracing::new(StochasticGame::random(2, 2, 2, 0.9, 4).unwrap()));
        for _ in 0..5 {
            original.step().unwrap();
        }
        original.save_file(&file).unwrap();
        let mut resumed = quiet(LogTracing::new(StochasticGame::random(2, 2, 2, 0.9, 4).unwrap()));
        resumed.load_file(&file).unwrap();
        std::fs::remove_file(&file).ok();
        assert_eq!(resumed.step_count(), 5);
        original.step().unwrap();
        resumed.step().unwrap();
        assert!((original.y() - resumed.y()).norm() < 1e-12);
        assert!(close(original.s(), resumed.s(), 1e-12));
        assert_eq!(original.ds(), resumed.ds());
    }

    #[test]
    fn load_rejects_foreign_snapshot_untouched() {
        let file = std::env::temp_dir().join(format!("sgame-foreign-{}.json", std::process::id()));
        let mut qre = quiet(QRE::new(stag_hunt()));
        qre.step().unwrap();
        qre.save_file(&file).unwrap();
        let mut tracing = quiet(LogTracing::new(stag_hunt()));
        let before = tracing.checkpoint();
        assert!(matches!(tracing.load_file(&file), Err(PersistenceError::Schema { .. })));
        std::fs::write(&file, "{ not json").unwrap();
        assert!(matches!(qre.load_file(&file), Err(PersistenceError::Malformed { .. })));
        std::fs::remove_file(&file).ok();
        assert!(matches!(qre.load_file(&file), Err(PersistenceError::Io { .. })));
        assert_eq!(tracing.checkpoint(), before);
        assert_eq!(tracing.status(), Status::Ready);
    }

    #[test]
    fn return_to_step_retraces() {
        let mut tracker = quiet(QRE::new(stag_hunt()));
        tracker.set_target(10.);
        tracker.settings_mut().ds_max = 0.05;
        tracker.start_storing_path(64);
        for _ in 0..20 {
            tracker.step().unwrap();
        }
        let twenty = tracker.y().clone();
        assert_eq!(tracker.path().last().map(|r| r.step), Some(20));
        tracker.return_to_step(10).unwrap();
        assert_eq!(tracker.step_count(), 10);
        assert_eq!(tracker.path().last().map(|r| r.step), Some(10));
        for _ in 0..10 {
            tracker.step().unwrap();
        }
        assert!((tracker.y() - twenty).norm() < 1e-12);
        assert!(tracker.return_to_step(40).is_err());
        tracker.stop_storing_path();
        assert_eq!(tracker.path().count(), 0);
        assert!(tracker.return_to_step(10).is_err());
    }

    #[test]
    fn return_to_step_after_set_y() {
        let mut tracker = quiet(QRE::new(stag_hunt()));
        tracker.set_target(10.);
        tracker.settings_mut().ds_max = 0.05;
        tracker.start_storing_path(64);
        for _ in 0..5 {
            tracker.step().unwrap();
        }
        let five = tracker.y().clone();
        for _ in 0..3 {
            tracker.step().unwrap();
        }
        let eight = tracker.y().clone();
        tracker.set_y(five.clone()).unwrap();
        assert_eq!(tracker.path().count(), 0);
        tracker.step().unwrap();
        assert_eq!(tracker.step_count(), 9);
        tracker.return_to_step(8).unwrap();
        assert!((tracker.y() - &five).norm() < 1e-12);
        assert!((tracker.y() - &eight).norm() > 1e-6);
        assert!(tracker.return_to_step(3).is_err());
    }

    #[test]
    fn step_budget_fails_with_checkpoint() {
        let mut tracker = quiet(QRE::new(stag_hunt()));
        tracker.settings_mut().max_steps = 3;
        tracker.settings_mut().ds_max = 0.01;
        let failure = match tracker.solve().unwrap_err() {
            Error::Continuation(failure) => failure,
            other => panic!("unexpected {}", other),
        };
        assert_eq!(failure.reason, FailureReason::StepBudget { steps: 3 });
        assert_eq!(failure.checkpoint.step, 3);
        assert!(failure.checkpoint.tangent.is_some());
        assert_eq!(tracker.status(), Status::Failed);
        tracker.settings_mut().max_steps = TRACKER_MAX_STEPS;
        tracker.restore(&failure.checkpoint).unwrap();
        assert_eq!(tracker.status(), Status::Tracking);
        let equilibrium = tracker.solve().unwrap();
        assert!(close(equilibrium.t, 1., 1e-10));
    }

    #[test]
    fn rejects_misshapen_seed() {
        let mut tracker = quiet(QRE::new(stag_hunt()));
        assert!(tracker.set_y(DVector::zeros(3)).is_err());
    }
}
