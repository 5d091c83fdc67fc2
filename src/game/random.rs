use crate::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

impl StochasticGame {
    /// Random game with a common action count and a common discount factor.
    ///
    /// Payoffs are uniform on `[0, 1)`. Transition rows are normalized
    /// uniform weights. The same seed always yields the same game.
    pub fn random(
        states: usize,
        players: usize,
        actions: usize,
        discount: Probability,
        seed: u64,
    ) -> Result<Self, ValidationError> {
        Self::random_with(vec![vec![actions; players]; states], discount, seed)
    }

    /// Random game with per-`(state, player)` action counts.
    pub fn random_with(
        actions: Vec<Vec<usize>>,
        discounts: impl Into<Discounts>,
        seed: u64,
    ) -> Result<Self, ValidationError> {
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let states = actions.len();
        if states == 0 {
            return Err(ValidationError::NoStates);
        }
        let players = actions[0].len();
        if let Some((s, counts)) = actions.iter().enumerate().find(|(_, c)| c.len() != players) {
            return Err(ValidationError::PlayerCount {
                state: s,
                expected: players,
                found: counts.len(),
            });
        }
        let mut payoffs = Vec::with_capacity(states);
        let mut transitions = Vec::with_capacity(states);
        for counts in actions.iter() {
            let profiles = counts.iter().product::<usize>();
            let shape = std::iter::once(players).chain(counts.iter().copied()).collect();
            let data = (0..players * profiles).map(|_| rng.random::<Utility>()).collect();
            payoffs.push(Tensor::new(shape, data)?);
            let shape = counts.iter().copied().chain(std::iter::once(states)).collect();
            let data = (0..profiles)
                .flat_map(|_| {
                    let weights = (0..states)
                        .map(|_| rng.random::<Probability>() + Probability::EPSILON)
                        .collect::<Vec<_>>();
                    let total = weights.iter().sum::<Probability>();
                    weights.into_iter().map(move |w| w / total)
                })
                .collect();
            transitions.push(Tensor::new(shape, data)?);
        }
        Self::new(payoffs, transitions, discounts)
    }

    /// Uniformly random point on the product of simplices.
    pub fn random_strategy(&self, seed: u64) -> Strategy {
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let layout = self.layout();
        Strategy::from(
            (0..layout.states())
                .map(|s| {
                    (0..layout.players())
                        .map(|i| {
                            let draws = (0..layout.actions(s, i))
                                .map(|_| -(1. - rng.random::<Probability>()).ln())
                                .map(|x| x + Probability::EPSILON)
                                .collect::<Vec<_>>();
                            let total = draws.iter().sum::<Probability>();
                            draws.into_iter().map(|x| x / total).collect()
                        })
                        .collect()
                })
                .collect::<Vec<Vec<Vec<Probability>>>>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_game() {
        let a = StochasticGame::random(3, 2, 2, 0.9, 7).unwrap();
        let b = StochasticGame::random(3, 2, 2, 0.9, 7).unwrap();
        let c = StochasticGame::random(3, 2, 2, 0.9, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn heterogeneous_actions() {
        let game = StochasticGame::random_with(vec![vec![3, 5], vec![1, 2]], vec![0.92, 0.98], 42).unwrap();
        assert_eq!(game.layout().sigmas(), 3 + 5 + 1 + 2);
        assert_eq!(game.discount(1), 0.98);
    }

    #[test]
    fn random_strategy_is_feasible() {
        let game = StochasticGame::random(2, 3, 4, 0.95, 1).unwrap();
        let sigma = game.random_strategy(11);
        assert!(sigma.check(game.layout()).is_ok());
        assert_eq!(sigma, game.random_strategy(11));
    }
}
