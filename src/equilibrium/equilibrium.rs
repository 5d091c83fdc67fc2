use crate::*;

/// A point of the solution path read as strategies and values.
///
/// Strategies are repaired for floating-point drift only. The residual is
/// the larger of the Bellman deviation `|V - Σσu|` and the best-response gain
/// `max(0, max_a u - V)` over all `(s, i)`, so a QRE or an interior tracing
/// point reports how far it is from a Nash equilibrium.
#[derive(Debug, Clone, PartialEq)]
pub struct Equilibrium {
    pub strategies: Strategy,
    pub values: Values,
    pub t: Parameter,
    pub residual: Residual,
    pub labels: Labels,
}

impl Equilibrium {
    pub fn from_y(game: &StochasticGame, y: &[f64]) -> Result<Self, ValidationError> {
        let layout = game.layout();
        if y.len() != layout.dim() {
            return Err(ValidationError::Count {
                what: "state vector entries",
                expected: layout.dim(),
                found: y.len(),
            });
        }
        let strategies = Strategy::from_flat(layout, &y[..layout.sigmas()]).repair(layout)?;
        let values = Values::from_flat(layout, &y[layout.sigmas()..layout.t()]);
        values.check(layout)?;
        let e = Expectation::evaluate(game, &strategies.flatten(), &values.flatten(), false);
        let mut residual = 0f64;
        for s in 0..layout.states() {
            for i in 0..layout.players() {
                let v = values.get(s, i);
                let range = layout.simplex(s, i);
                let expected = strategies
                    .simplex(s, i)
                    .iter()
                    .zip(e.u[range.clone()].iter())
                    .map(|(p, u)| p * u)
                    .sum::<Utility>();
                let best = e.u[range].iter().copied().fold(f64::NEG_INFINITY, f64::max);
                residual = residual.max((v - expected).abs()).max(best - v);
            }
        }
        Ok(Self {
            strategies,
            values,
            t: y[layout.t()],
            residual,
            labels: game.labels().clone(),
        })
    }

    pub fn report(&self) -> Report {
        Report::from(self)
    }
}

impl std::fmt::Display for Equilibrium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.report(), f)
    }
}
