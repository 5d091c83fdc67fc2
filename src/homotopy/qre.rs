use crate::*;
use nalgebra::DMatrix;
use nalgebra::DVector;

/// Logit quantal response homotopy.
///
/// `t` is the precision λ. At `t = 0` everyone randomizes uniformly;
/// as `t` grows the logit response sharpens toward a best response.
///
/// ```text
/// H_σ(s,i,a) = σ(s,i,a) - softmax_a( t · u(s,i,·) )
/// H_V(s,i)   = V(s,i) - Σ_a σ(s,i,a) u(s,i,a)
/// ```
pub struct QRE {
    game: StochasticGame,
}

impl QRE {
    pub fn new(game: StochasticGame) -> Self {
        Self { game }
    }

    /// Numerically stable logit response of one simplex.
    fn softmax(utilities: &[Utility], t: Parameter) -> Vec<Probability> {
        let top = utilities.iter().map(|u| t * u).fold(f64::NEG_INFINITY, f64::max);
        let exps = utilities.iter().map(|u| (t * u - top).exp()).collect::<Vec<_>>();
        let total = exps.iter().sum::<f64>();
        exps.into_iter().map(|e| e / total).collect()
    }
}

impl Homotopy for QRE {
    fn game(&self) -> &StochasticGame {
        &self.game
    }
    fn name(&self) -> &'static str {
        "qre"
    }

    fn h(&self, y: &DVector<f64>) -> DVector<f64> {
        let layout = self.layout();
        let y = y.as_slice();
        let t = y[layout.t()];
        let sigma = &y[..layout.sigmas()];
        let v = &y[layout.sigmas()..layout.t()];
        let e = Expectation::evaluate(&self.game, sigma, v, false);
        let mut h = DVector::<f64>::zeros(layout.equations());
        for s in 0..layout.states() {
            for i in 0..layout.players() {
                let range = layout.simplex(s, i);
                let logit = Self::softmax(&e.u[range.clone()], t);
                let mut expected = 0.;
                for (a, k) in range.enumerate() {
                    h[k] = sigma[k] - logit[a];
                    expected += sigma[k] * e.u[k];
                }
                let k = layout.value(s, i);
                h[k] = y[k] - expected;
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
        let e = Expectation::evaluate(&self.game, sigma, v, true);
        let mut jacobian = DMatrix::<f64>::zeros(layout.equations(), layout.dim());
        for s in 0..n {
            let block = layout.block(s);
            let cross = &e.cross[s];
            let future = &e.future[s];
            for i in 0..layout.players() {
                let range = layout.simplex(s, i);
                let logit = Self::softmax(&e.u[range.clone()], t);
                let local = range.start - block.start..range.end - block.start;
                let mean = range.clone().zip(logit.iter()).map(|(k, p)| p * e.u[k]).sum::<Utility>();
                // logit-weighted averages of the derivative rows
                let cross_mean = (0..block.len())
                    .map(|c| local.clone().zip(logit.iter()).map(|(r, p)| p * cross[(r, c)]).sum::<f64>())
                    .collect::<Vec<_>>();
                let future_mean = (0..n)
                    .map(|c| local.clone().zip(logit.iter()).map(|(r, p)| p * future[(r, c)]).sum::<f64>())
                    .collect::<Vec<_>>();
                for (a, row) in range.clone().enumerate() {
                    let r = local.start + a;
                    let p = logit[a];
                    jacobian[(row, row)] = 1.;
                    for c in (0..block.len()).filter(|c| !local.contains(c)) {
                        jacobian[(row, block.start + c)] = -t * p * (cross[(r, c)] - cross_mean[c]);
                    }
                    for next in 0..n {
                        jacobian[(row, layout.value(next, i))] = -t * p * (future[(r, next)] - future_mean[next]);
                    }
                    jacobian[(row, layout.t())] = -p * (e.u[row] - mean);
                }
                let row = layout.value(s, i);
                for k in range.clone() {
                    jacobian[(row, k)] = -e.u[k];
                }
                for c in (0..block.len()).filter(|c| !local.contains(c)) {
                    jacobian[(row, block.start + c)] = -local.clone().map(|r| sigma[block.start + r] * cross[(r, c)]).sum::<f64>();
                }
                for next in 0..n {
                    let continuation = local.clone().map(|r| sigma[block.start + r] * future[(r, next)]).sum::<f64>();
                    let own = if next == s { 1. } else { 0. };
                    jacobian[(row, layout.value(next, i))] = own - continuation;
                }
            }
        }
        jacobian
    }

    /// Uniform play at `t = 0` with its own value function.
    fn y0(&self) -> DVector<f64> {
        let uniform = Strategy::uniform(self.layout());
        let values = self
            .game
            .values(&uniform)
            .expect("uniform strategy fits its own layout");
        self.sigma_v_t_to_y(&uniform, &values, 0.)
            .expect("uniform strategy fits its own layout")
    }
}
