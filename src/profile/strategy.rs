use crate::Layout;
use crate::Probability;
use crate::SIMPLEX_DRIFT;
use crate::ValidationError;
use serde::Deserialize;
use serde::Serialize;

/// Behavior strategy profile `σ[s][i][a]`.
///
/// A valid profile lies on the product of simplices: every `σ[s][i]`
/// is a probability distribution over the actions of player `i` in state `s`.
/// Construction does not validate; [`Strategy::check`] and
/// [`Strategy::repair`] do, against a [`Layout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strategy(Vec<Vec<Vec<Probability>>>);

impl Strategy {
    /// Uniform randomization in every state.
    pub fn uniform(layout: &Layout) -> Self {
        Self(
            (0..layout.states())
                .map(|s| {
                    (0..layout.players())
                        .map(|i| {
                            let n = layout.actions(s, i);
                            vec![1. / n as Probability; n]
                        })
                        .collect()
                })
                .collect(),
        )
    }
    /// Pure strategy profile with the given action per `(s, i)`.
    pub fn pure(layout: &Layout, choice: impl Fn(usize, usize) -> usize) -> Self {
        Self(
            (0..layout.states())
                .map(|s| {
                    (0..layout.players())
                        .map(|i| {
                            let mut simplex = vec![0.; layout.actions(s, i)];
                            simplex[choice(s, i)] = 1.;
                            simplex
                        })
                        .collect()
                })
                .collect(),
        )
    }
    /// Reshape the strategy segment of a state vector. No validation.
    pub fn from_flat(layout: &Layout, flat: &[Probability]) -> Self {
        Self(
            (0..layout.states())
                .map(|s| {
                    (0..layout.players())
                        .map(|i| flat[layout.simplex(s, i)].to_vec())
                        .collect()
                })
                .collect(),
        )
    }
    /// Flatten in state vector order.
    pub fn flatten(&self) -> Vec<Probability> {
        self.0.iter().flatten().flatten().copied().collect()
    }

    pub fn get(&self, s: usize, i: usize, a: usize) -> Probability {
        self.0[s][i][a]
    }
    pub fn simplex(&self, s: usize, i: usize) -> &[Probability] {
        &self.0[s][i]
    }
    pub fn states(&self) -> &[Vec<Vec<Probability>>] {
        &self.0
    }
    /// Shape matches the layout.
    pub fn check_shape(&self, layout: &Layout) -> Result<(), ValidationError> {
        if self.0.len() != layout.states() {
            return Err(ValidationError::Count {
                what: "strategy states",
                expected: layout.states(),
                found: self.0.len(),
            });
        }
        for (s, players) in self.0.iter().enumerate() {
            if players.len() != layout.players() {
                return Err(ValidationError::Count {
                    what: "strategy players",
                    expected: layout.players(),
                    found: players.len(),
                });
            }
            for (i, simplex) in players.iter().enumerate() {
                if simplex.len() != layout.actions(s, i) {
                    return Err(ValidationError::Count {
                        what: "strategy actions",
                        expected: layout.actions(s, i),
                        found: simplex.len(),
                    });
                }
            }
        }
        Ok(())
    }
    /// Shape matches and every simplex is a distribution up to [`SIMPLEX_DRIFT`].
    pub fn check(&self, layout: &Layout) -> Result<(), ValidationError> {
        self.check_shape(layout)?;
        for (s, players) in self.0.iter().enumerate() {
            for (i, simplex) in players.iter().enumerate() {
                let sum = simplex.iter().sum::<Probability>();
                let inside = simplex
                    .iter()
                    .all(|p| p.is_finite() && *p >= -SIMPLEX_DRIFT && *p <= 1. + SIMPLEX_DRIFT);
                if !inside || (sum - 1.).abs() > SIMPLEX_DRIFT {
                    return Err(ValidationError::Infeasible {
                        state: s,
                        player: i,
                        what: "strategy",
                        sum,
                    });
                }
            }
        }
        Ok(())
    }
    /// Remove floating-point drift: clamp tiny negatives and renormalize.
    /// Fails rather than masking anything beyond [`SIMPLEX_DRIFT`].
    pub fn repair(mut self, layout: &Layout) -> Result<Self, ValidationError> {
        self.check(layout)?;
        for simplex in self.0.iter_mut().flatten() {
            simplex.iter_mut().for_each(|p| *p = p.clamp(0., 1.));
            let mass = simplex.iter().sum::<Probability>();
            simplex.iter_mut().for_each(|p| *p /= mass);
        }
        Ok(self)
    }
}

impl From<Vec<Vec<Vec<Probability>>>> for Strategy {
    fn from(nested: Vec<Vec<Vec<Probability>>>) -> Self {
        Self(nested)
    }
}

impl From<Strategy> for Vec<Vec<Vec<Probability>>> {
    fn from(strategy: Strategy) -> Self {
        strategy.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new(vec![vec![2, 3]])
    }

    #[test]
    fn uniform_is_feasible() {
        let ref layout = layout();
        assert!(Strategy::uniform(layout).check(layout).is_ok());
    }

    #[test]
    fn flatten_round_trip() {
        let ref layout = layout();
        let sigma = Strategy::from(vec![vec![vec![0.25, 0.75], vec![0.2, 0.3, 0.5]]]);
        assert_eq!(Strategy::from_flat(layout, &sigma.flatten()), sigma);
    }

    #[test]
    fn repair_corrects_drift_only() {
        let ref layout = layout();
        let drift = Strategy::from(vec![vec![vec![1. + 1e-9, -1e-9], vec![0.2, 0.3, 0.5]]]);
        let fixed = drift.repair(layout).unwrap();
        assert_eq!(fixed.get(0, 0, 1), 0.);
        assert!((fixed.simplex(0, 0).iter().sum::<f64>() - 1.).abs() < 1e-15);
        let broken = Strategy::from(vec![vec![vec![0.7, 0.7], vec![0.2, 0.3, 0.5]]]);
        assert!(matches!(
            broken.repair(layout),
            Err(ValidationError::Infeasible { player: 0, .. })
        ));
    }

    #[test]
    fn rejects_wrong_shape() {
        let ref layout = layout();
        let sigma = Strategy::from(vec![vec![vec![0.5, 0.5], vec![0.5, 0.5]]]);
        assert!(sigma.check(layout).is_err());
    }
}
