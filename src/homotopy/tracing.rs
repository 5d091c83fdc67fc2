use crate::*;
use nalgebra::DMatrix;
use nalgebra::DVector;

/// Logarithmic tracing homotopy.
///
/// Opponents are perceived through the mixture `π = tσ + (1-t)ρ` of actual
/// play and a prior `ρ`, and every strategy is pushed off the boundary by a
/// log barrier of strength `η (1-t) ν` scaled by the largest absolute payoff.
///
/// ```text
/// H_σ(s,i,a) = σ(s,i,a) · ( V(s,i) - u_π(s,i,a) ) - η̂ (1-t) ν(s,i,a)
/// H_V(s,i)   = Σ_a σ(s,i,a) - 1
/// ```
///
/// At `t = 0` each player best-responds to the prior under the barrier,
/// which has a unique solution. At `t = 1` the barrier is gone and the system
/// is exactly the complementarity form of the equilibrium conditions, with
/// `V(s,i)` the best-response value. Different priors select different equilibria.
pub struct LogTracing {
    game: StochasticGame,
    rho: Vec<Probability>,
    nu: Vec<f64>,
    eta: Parameter,
}

impl LogTracing {
    /// Uniform prior, unit weights, default barrier strength.
    pub fn new(game: StochasticGame) -> Self {
        let layout = game.layout();
        let rho = Strategy::uniform(layout).flatten();
        let nu = vec![1.; layout.sigmas()];
        Self {
            game,
            rho,
            nu,
            eta: TRACING_ETA,
        }
    }

    /// Prior beliefs about everyone's play. Must lie on the product of simplices.
    pub fn with_prior(mut self, rho: Strategy) -> Result<Self, ValidationError> {
        self.rho = rho.repair(self.game.layout())?.flatten();
        Ok(self)
    }
    /// Uniformly random prior, for sampling several equilibria of one game.
    pub fn random_prior(self, seed: u64) -> Result<Self, ValidationError> {
        let rho = self.game.random_strategy(seed);
        self.with_prior(rho)
    }
    /// Per-action barrier weights, shaped like a strategy, strictly positive.
    pub fn with_weights(mut self, nu: Vec<Vec<Vec<f64>>>) -> Result<Self, ValidationError> {
        let layout = self.game.layout();
        let nu = Strategy::from(nu);
        nu.check_shape(layout)?;
        for s in 0..layout.states() {
            for i in 0..layout.players() {
                if let Some(a) = nu.simplex(s, i).iter().position(|w| !(w.is_finite() && *w > 0.)) {
                    return Err(ValidationError::NonPositive {
                        state: s,
                        player: i,
                        action: a,
                        what: "barrier weight",
                    });
                }
            }
        }
        self.nu = nu.flatten();
        Ok(self)
    }
    /// Barrier strength relative to the largest absolute payoff.
    pub fn with_eta(mut self, eta: Parameter) -> Result<Self, ValidationError> {
        if eta.is_finite() && eta > 0. {
            self.eta = eta;
            Ok(self)
        } else {
            Err(ValidationError::Eta(eta))
        }
    }

    pub fn prior(&self) -> Strategy {
        Strategy::from_flat(self.game.layout(), &self.rho)
    }
    pub fn eta(&self) -> Parameter {
        self.eta
    }

    /// Barrier strength in payoff units.
    fn barrier(&self) -> Utility {
        self.eta * self.game.payoff_scale()
    }

    /// Perceived opponent play `tσ + (1-t)ρ`.
    fn mixture(&self, sigma: &[Probability], t: Parameter) -> Vec<Probability> {
        sigma
            .iter()
            .zip(self.rho.iter())
            .map(|(s, r)| t * s + (1. - t) * r)
            .collect()
    }

    /// Unique `μ > max u` with `Σ_a c_a / (μ - u_a) = 1`.
    ///
    /// The left side falls from `+∞` to zero on `(max u, ∞)` and is at most one
    /// at `max u + Σ c`, so Newton steps are safeguarded by that bracket.
    fn multiplier(u: &[Utility], c: &[f64]) -> Utility {
        let top = u.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut lo = top;
        let mut hi = top + c.iter().sum::<f64>();
        let mut mu = hi;
        for _ in 0..BARRIER_ROOT_ITERATIONS {
            let (f, df) = u
                .iter()
                .zip(c.iter())
                .map(|(u, c)| (c / (mu - u), -c / ((mu - u) * (mu - u))))
                .fold((-1., 0.), |(f, df), (x, dx)| (f + x, df + dx));
            if f > 0. {
                lo = mu;
            } else {
                hi = mu;
            }
            if f.abs() <= BARRIER_ROOT_TOLERANCE || hi - lo <= f64::EPSILON * hi.abs().max(1.) {
                break;
            }
            let newton = mu - f / df;
            if newton == mu {
                break;
            }
            mu = if newton > lo && newton < hi { newton } else { 0.5 * (lo + hi) };
        }
        mu
    }
}

impl Homotopy for LogTracing {
    fn game(&self) -> &StochasticGame {
        &self.game
    }
    fn name(&self) -> &'static str {
        "tracing"
    }

    /// Strategies non-negative and no action worth more than its player's value.
    ///
    /// Away from `t = 1` the barrier forces both. At `t = 1` the
    /// complementarity system also admits points where an unplayed action
    /// beats `V`, and those are not equilibria.
    fn feasible(&self, y: &DVector<f64>) -> bool {
        let layout = self.layout();
        let y = y.as_slice();
        let t = y[layout.t()];
        let sigma = &y[..layout.sigmas()];
        if sigma.iter().any(|x| *x < -SIMPLEX_DRIFT) {
            return false;
        }
        let slack = FEASIBILITY_TOLERANCE * self.game.payoff_scale();
        let e = Expectation::evaluate(&self.game, &self.mixture(sigma, t), &y[layout.sigmas()..layout.t()], false);
        (0..layout.states())
            .flat_map(|s| (0..layout.players()).map(move |i| (s, i)))
            .all(|(s, i)| layout.simplex(s, i).all(|k| y[layout.value(s, i)] - e.u[k] >= -slack))
    }

    fn h(&self, y: &DVector<f64>) -> DVector<f64> {
        let layout = self.layout();
        let y = y.as_slice();
        let t = y[layout.t()];
        let sigma = &y[..layout.sigmas()];
        let v = &y[layout.sigmas()..layout.t()];
        let e = Expectation::evaluate(&self.game, &self.mixture(sigma, t), v, false);
        let barrier = self.barrier() * (1. - t);
        let mut h = DVector::<f64>::zeros(layout.equations());
        for s in 0..layout.states() {
            for i in 0..layout.players() {
                let value = y[layout.value(s, i)];
                for k in layout.simplex(s, i) {
                    h[k] = sigma[k] * (value - e.u[k]) - barrier * self.nu[k];
                }
                h[layout.value(s, i)] = layout.simplex(s, i).map(|k| sigma[k]).sum::<f64>() - 1.;
            }
        }
        h
    }

    fn jacobian(&self, y: &DVector<f64>) -> DMatrix<f64> {
        let layout = self.layout();
        let y = y.as_slice();
        let n = layout.states();
        let t = y[layout.t()];
        let sigma = &y[..layout.sigmas()];
        let v = &y[layout.sigmas()..layout.t()];
        let e = Expectation::evaluate(&self.game, &self.mixture(sigma, t), v, true);
        let barrier = self.barrier();
        let mut jacobian = DMatrix::<f64>::zeros(layout.equations(), layout.dim());
        for s in 0..n {
            let block = layout.block(s);
            let cross = &e.cross[s];
            let future = &e.future[s];
            for i in 0..layout.players() {
                let range = layout.simplex(s, i);
                let own = range.start - block.start..range.end - block.start;
                let value = layout.value(s, i);
                for k in range.clone() {
                    let r = k - block.start;
                    jacobian[(k, k)] = y[value] - e.u[k];
                    let mut drift = 0.;
                    for c in (0..block.len()).filter(|c| !own.contains(c)) {
                        let col = block.start + c;
                        jacobian[(k, col)] = -sigma[k] * t * cross[(r, c)];
                        drift += cross[(r, c)] * (sigma[col] - self.rho[col]);
                    }
                    for next in 0..n {
                        jacobian[(k, layout.value(next, i))] = -sigma[k] * future[(r, next)];
                    }
                    jacobian[(k, value)] += sigma[k];
                    jacobian[(k, layout.t())] = -sigma[k] * drift + barrier * self.nu[k];
                    jacobian[(value, k)] = 1.;
                }
            }
        }
        jacobian
    }

    /// Barrier best responses to the prior.
    ///
    /// With opponents fixed at `ρ` the action values depend on `V` alone, and
    /// the barrier multiplier is 1-Lipschitz in them, so iterating
    /// `V ← μ(u(V))` contracts at the discount rate. One pass is exact for
    /// one-shot games.
    fn y0(&self) -> DVector<f64> {
        let layout = self.layout();
        let c = self.nu.iter().map(|w| w * self.barrier()).collect::<Vec<_>>();
        let mut v = self
            .game
            .values(&self.prior())
            .map(|values| values.flatten())
            .unwrap_or_else(|_| vec![0.; layout.values()]);
        let multipliers = |v: &[Utility]| -> (Vec<Utility>, Vec<Utility>) {
            let e = Expectation::evaluate(&self.game, &self.rho, v, false);
            let mut next = vec![0.; layout.values()];
            for s in 0..layout.states() {
                for i in 0..layout.players() {
                    let range = layout.simplex(s, i);
                    next[s * layout.players() + i] = Self::multiplier(&e.u[range.clone()], &c[range]);
                }
            }
            (next, e.u)
        };
        for iteration in 0..TRACING_Y0_ITERATIONS {
            let (next, _) = multipliers(&v);
            let scale = next.iter().fold(1f64, |m, x| m.max(x.abs()));
            let change = next
                .iter()
                .zip(v.iter())
                .fold(0f64, |m, (a, b)| m.max((a - b).abs()));
            v = next;
            if change <= TRACING_Y0_TOLERANCE * scale {
                log::debug!("tracing start located after {} iterations", iteration + 1);
                break;
            }
        }
        let (mu, u) = multipliers(&v);
        let sigma = (0..layout.states())
            .flat_map(|s| (0..layout.players()).map(move |i| (s, i)))
            .flat_map(|(s, i)| layout.simplex(s, i).map(move |k| (s, i, k)))
            .map(|(s, i, k)| c[k] / (mu[s * layout.players() + i] - u[k]))
            .collect::<Vec<_>>();
        DVector::from_iterator(
            layout.dim(),
            sigma.into_iter().chain(mu).chain(std::iter::once(0.)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homotopy::homotopy::tests::interior;
    use crate::homotopy::homotopy::tests::jacobian_error;

    fn stag_hunt() -> StochasticGame {
        StochasticGame::one_shot(
            Tensor::new(vec![2, 2, 2], vec![10., 1., 8., 5., 10., 8., 1., 5.]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn starts_on_solution() {
        for seed in 0..4 {
            let game = StochasticGame::random_with(vec![vec![2, 3], vec![3, 1], vec![2, 2]], 0.9, seed).unwrap();
            let tracing = LogTracing::new(game).random_prior(seed + 100).unwrap();
            let y0 = tracing.y0();
            assert!(tracing.h(&y0).norm() < 1e-9, "seed {}: {}", seed, tracing.h(&y0).norm());
            assert_eq!(y0[tracing.layout().t()], 0.);
        }
    }

    #[test]
    fn one_shot_start_is_exact() {
        let tracing = LogTracing::new(stag_hunt());
        assert!(tracing.h(&tracing.y0()).norm() < 1e-12);
    }

    #[test]
    fn analytic_jacobian() {
        let game = StochasticGame::random_with(vec![vec![2, 3, 2], vec![3, 1, 2]], vec![0.8, 0.9, 0.7], 5).unwrap();
        let tracing = LogTracing::new(game)
            .random_prior(9)
            .unwrap()
            .with_eta(0.3)
            .unwrap();
        let y = interior(tracing.game(), 3, 0.4);
        assert!(jacobian_error(&tracing, &y) < 1e-6);
    }

    #[test]
    fn mixed_stag_hunt_is_a_solution_at_one() {
        let tracing = LogTracing::new(stag_hunt());
        let sigma = Strategy::from(vec![vec![vec![2. / 3., 1. / 3.]; 2]]);
        let values = Values::from(vec![vec![7., 7.]]);
        let y = tracing.sigma_v_t_to_y(&sigma, &values, 1.).unwrap();
        assert!(tracing.h(&y).norm() < 1e-12);
    }

    #[test]
    fn unplayed_better_action_is_infeasible() {
        let tracing = LogTracing::new(stag_hunt());
        // player 0 hunts hare while player 1 hunts stag: H = 0 but both would deviate
        let sigma = Strategy::from(vec![vec![vec![0., 1.], vec![1., 0.]]]);
        let values = Values::from(vec![vec![8., 1.]]);
        let y = tracing.sigma_v_t_to_y(&sigma, &values, 1.).unwrap();
        assert!(tracing.h(&y).norm() < 1e-12);
        assert!(!tracing.feasible(&y));
        let sigma = Strategy::from(vec![vec![vec![0., 1.]; 2]]);
        let values = Values::from(vec![vec![5., 5.]]);
        let y = tracing.sigma_v_t_to_y(&sigma, &values, 1.).unwrap();
        assert!(tracing.h(&y).norm() < 1e-12);
        assert!(tracing.feasible(&y));
        assert!(tracing.feasible(&tracing.y0()));
    }

    #[test]
    fn default_barrier_favours_prior() {
        let prior = Strategy::from(vec![vec![vec![0.9, 0.1]; 2]]);
        let tracing = LogTracing::new(stag_hunt()).with_prior(prior).unwrap();
        let y0 = tracing.y0();
        let layout = tracing.layout();
        assert!(y0[layout.sigma(0, 0, 0)] > 2. / 3.);
        assert!(y0[layout.sigma(0, 1, 0)] > 2. / 3.);
    }

    #[test]
    fn multiplier_solves_barrier_equation() {
        let u = [1., 3., 2.5];
        let c = [0.2, 0.5, 0.1];
        let mu = LogTracing::multiplier(&u, &c);
        assert!(mu > 3.);
        let total = u.iter().zip(c.iter()).map(|(u, c)| c / (mu - u)).sum::<f64>();
        assert!((total - 1.).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_parameters() {
        let game = stag_hunt();
        let layout = game.layout().clone();
        assert!(matches!(LogTracing::new(game.clone()).with_eta(0.), Err(ValidationError::Eta(_))));
        assert!(matches!(
            LogTracing::new(game.clone()).with_weights(vec![vec![vec![1., 0.], vec![1., 1.]]]),
            Err(ValidationError::NonPositive { action: 1, .. })
        ));
        let off = Strategy::from(vec![vec![vec![0.5, 0.6], vec![0.5, 0.5]]]);
        assert!(off.check(&layout).is_err());
        assert!(LogTracing::new(game).with_prior(off).is_err());
    }
}
