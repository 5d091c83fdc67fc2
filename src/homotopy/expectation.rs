use crate::*;
use nalgebra::DMatrix;

/// Action values of every `(s, i, a)` and their partial derivatives.
///
/// ```text
/// u(s,i,a) = Σ_{a_-i} Π_{j≠i} π(s,j,a_j) · [ r_i(s,a) + δ_i Σ_s' φ(s,a,s') V(s',i) ]
/// ```
///
/// Opponents are seen through `π`, which is `σ` itself for QRE and the
/// tracing mixture for LogTracing.
pub struct Expectation {
    /// `u(s,i,a)`, indexed like the strategy segment of `y`.
    pub u: Vec<Utility>,
    /// Per state, `∂u(s,i,a)/∂π(s,j,c)` for `j ≠ i`, in block-local indices.
    pub cross: Vec<DMatrix<Utility>>,
    /// Per state, `∂u(s,i,a)/∂V(s',i)`, rows block-local, one column per `s'`.
    pub future: Vec<DMatrix<Utility>>,
}

impl Expectation {
    /// `pi` has the length of the strategy segment, `v` of the value segment.
    /// Derivatives are only accumulated when asked for.
    pub fn evaluate(game: &StochasticGame, pi: &[Probability], v: &[Utility], derivatives: bool) -> Self {
        let layout = game.layout();
        let n = layout.states();
        let players = layout.players();
        let mut u = vec![0.; layout.sigmas()];
        let mut cross = Vec::new();
        let mut future = Vec::new();
        let mut w = vec![0.; players];
        let mut probs = vec![0.; players];
        for s in 0..n {
            let block = layout.block(s);
            let local = |i: usize, a: usize| layout.sigma(s, i, a) - block.start;
            let (rows, cols) = if derivatives { (block.len(), n) } else { (0, 0) };
            let mut dcross = DMatrix::<Utility>::zeros(rows, rows);
            let mut dfuture = DMatrix::<Utility>::zeros(rows, cols);
            for (p, acts) in layout.joint(s) {
                let phi = game.transition(s, p);
                for i in 0..players {
                    probs[i] = pi[layout.sigma(s, i, acts[i])];
                    w[i] = game.payoff(i, s, p)
                        + game.discount(i)
                            * phi
                                .iter()
                                .enumerate()
                                .map(|(next, x)| x * v[layout.value(next, i) - layout.sigmas()])
                                .sum::<Utility>();
                }
                for i in 0..players {
                    let others = (0..players).filter(|j| *j != i).map(|j| probs[j]).product::<Probability>();
                    let row = layout.sigma(s, i, acts[i]);
                    u[row] += others * w[i];
                    if !derivatives {
                        continue;
                    }
                    let r = local(i, acts[i]);
                    if others != 0. {
                        for (next, x) in phi.iter().enumerate() {
                            dfuture[(r, next)] += others * game.discount(i) * x;
                        }
                    }
                    for j in (0..players).filter(|j| *j != i) {
                        let rest = (0..players)
                            .filter(|k| *k != i && *k != j)
                            .map(|k| probs[k])
                            .product::<Probability>();
                        dcross[(r, local(j, acts[j]))] += rest * w[i];
                    }
                }
            }
            if derivatives {
                cross.push(dcross);
                future.push(dfuture);
            }
        }
        Self { u, cross, future }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stag_hunt_action_values() {
        let game = StochasticGame::one_shot(
            Tensor::new(vec![2, 2, 2], vec![10., 1., 8., 5., 10., 8., 1., 5.]).unwrap(),
        )
        .unwrap();
        let pi = [2. / 3., 1. / 3., 2. / 3., 1. / 3.];
        let e = Expectation::evaluate(&game, &pi, &[0., 0.], true);
        for u in e.u.iter() {
            assert!((u - 7.).abs() < 1e-12);
        }
        // ∂u(0,0,stag)/∂π(0,1,hare) = r_0(stag, hare)
        assert_eq!(e.cross[0][(0, 3)], 1.);
        assert_eq!(e.cross[0][(0, 1)], 0.);
        assert_eq!(e.future[0][(0, 0)], 0.);
    }
}
