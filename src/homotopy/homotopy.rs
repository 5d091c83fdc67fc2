use crate::*;
use nalgebra::DMatrix;
use nalgebra::DVector;

/// A smooth deformation `H(y) = 0` of an easy system at `t = 0`
/// into the equilibrium conditions of a game.
///
/// Implementors share the state vector layout of their game, so that
/// residual component `k` is the equation paired with unknown `k`.
pub trait Homotopy {
    fn game(&self) -> &StochasticGame;
    fn name(&self) -> &'static str;
    /// Residual of dimension `D - 1`.
    fn h(&self, y: &DVector<f64>) -> DVector<f64>;
    /// `(D - 1) × D` matrix of partial derivatives, `t` in the last column.
    fn jacobian(&self, y: &DVector<f64>) -> DMatrix<f64>;
    /// Known solution at `t = 0`.
    fn y0(&self) -> DVector<f64>;
    /// Default value of `t` to continue to.
    fn target(&self) -> Parameter {
        TRACKER_TARGET
    }

    fn layout(&self) -> &Layout {
        self.game().layout()
    }

    /// Whether a solution of `H(y) = 0` lies on the branch of interest.
    /// Other branches share the equations but carry negative strategies.
    fn feasible(&self, y: &DVector<f64>) -> bool {
        y.rows(0, self.layout().sigmas()).iter().all(|x| *x >= -SIMPLEX_DRIFT)
    }

    /// Seed vector from a caller-supplied point, for starting anywhere
    /// but `y0`. Shapes are checked, the equations are not.
    fn sigma_v_t_to_y(&self, sigma: &Strategy, v: &Values, t: Parameter) -> Result<DVector<f64>, ValidationError> {
        let layout = self.layout();
        sigma.check_shape(layout)?;
        v.check(layout)?;
        if !t.is_finite() {
            return Err(ValidationError::NonFinite { what: "t" });
        }
        Ok(DVector::from_iterator(
            layout.dim(),
            sigma
                .flatten()
                .into_iter()
                .chain(v.flatten())
                .chain(std::iter::once(t)),
        ))
    }

    /// Split a state vector into its parts. No validation.
    fn y_to_sigma_v_t(&self, y: &DVector<f64>) -> (Strategy, Values, Parameter) {
        let layout = self.layout();
        let y = y.as_slice();
        (
            Strategy::from_flat(layout, &y[..layout.sigmas()]),
            Values::from_flat(layout, &y[layout.sigmas()..layout.t()]),
            y[layout.t()],
        )
    }

    /// Read a (converged) state vector as an equilibrium of the game.
    fn equilibrium(&self, y: &DVector<f64>) -> Result<Equilibrium, ValidationError> {
        Equilibrium::from_y(self.game(), y.as_slice())
    }

    /// Hand over to a fresh tracker starting at `y0`.
    fn tracker(self) -> PathTracker<Self>
    where
        Self: Sized,
    {
        PathTracker::new(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Largest discrepancy between the analytic Jacobian and central differences.
    pub(crate) fn jacobian_error<H: Homotopy>(homotopy: &H, y: &DVector<f64>) -> f64 {
        let analytic = homotopy.jacobian(y);
        let step = 1e-6;
        let mut worst = 0f64;
        for k in 0..y.len() {
            let mut hi = y.clone();
            let mut lo = y.clone();
            hi[k] += step;
            lo[k] -= step;
            let column = (homotopy.h(&hi) - homotopy.h(&lo)) / (2. * step);
            for r in 0..column.len() {
                worst = worst.max((column[r] - analytic[(r, k)]).abs());
            }
        }
        worst
    }

    /// An interior point with all components of a game's state vector moving.
    pub(crate) fn interior(game: &StochasticGame, seed: u64, t: f64) -> DVector<f64> {
        let sigma = game.random_strategy(seed);
        let values = game.values(&sigma).unwrap();
        let layout = game.layout();
        DVector::from_iterator(
            layout.dim(),
            sigma
                .flatten()
                .into_iter()
                .chain(values.flatten().into_iter().map(|v| v + 0.1))
                .chain(std::iter::once(t)),
        )
    }
}
