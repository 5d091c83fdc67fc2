use crate::*;
use nalgebra::DMatrix;
use nalgebra::DVector;
use serde::Deserialize;
use serde::Serialize;

/// A finite stochastic game with discounting.
///
/// Immutable once constructed. Every invariant is checked by [`StochasticGame::new`]:
///
/// - at least one state, one player, and one action per `(state, player)`
/// - payoff array of state `s` shaped `[N, |A(s,0)|, …, |A(s,N-1)|]`
/// - transition array of state `s` shaped `[|A(s,0)|, …, |A(s,N-1)|, S]`,
///   entries in `[0, 1]`, rows summing to one
/// - discount factors in `[0, 1)`
///
/// Payoffs and transitions are stored flat per state:
/// `payoffs[s][i * P_s + p]` and `transitions[s][p * S + s']`
/// where `p` indexes the joint action profile as in [`Layout::encode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GameDescription", into = "GameDescription")]
pub struct StochasticGame {
    layout: Layout,
    labels: Labels,
    payoffs: Vec<Vec<Utility>>,
    transitions: Vec<Vec<Probability>>,
    discounts: Vec<Probability>,
}

impl StochasticGame {
    /// Build a game from per-state payoff and transition arrays.
    pub fn new(
        payoffs: Vec<Tensor>,
        transitions: Vec<Tensor>,
        discounts: impl Into<Discounts>,
    ) -> Result<Self, ValidationError> {
        let states = payoffs.len();
        if states == 0 {
            return Err(ValidationError::NoStates);
        }
        if transitions.len() != states {
            return Err(ValidationError::Count {
                what: "transition arrays",
                expected: states,
                found: transitions.len(),
            });
        }
        payoffs.iter().chain(transitions.iter()).try_for_each(Tensor::check)?;
        let players = payoffs[0].shape().first().copied().unwrap_or(0);
        if players == 0 {
            return Err(ValidationError::NoPlayers);
        }
        let mut actions = Vec::with_capacity(states);
        for (s, payoff) in payoffs.iter().enumerate() {
            let shape = payoff.shape();
            if shape.len() != players + 1 || shape[0] != players {
                return match shape.first() {
                    Some(&found) if found != players => Err(ValidationError::PlayerCount {
                        state: s,
                        expected: players,
                        found,
                    }),
                    _ => Err(ValidationError::Shape {
                        state: s,
                        what: "payoff",
                        expected: vec![players],
                        found: shape.to_vec(),
                    }),
                };
            }
            if let Some(i) = shape[1..].iter().position(|n| *n == 0) {
                return Err(ValidationError::NoActions {
                    state: s,
                    player: i,
                });
            }
            actions.push(shape[1..].to_vec());
        }
        for (s, transition) in transitions.iter().enumerate() {
            let expected = actions[s]
                .iter()
                .copied()
                .chain(std::iter::once(states))
                .collect::<Vec<_>>();
            if transition.shape() != expected.as_slice() {
                return Err(ValidationError::Shape {
                    state: s,
                    what: "transition",
                    expected,
                    found: transition.shape().to_vec(),
                });
            }
            for (p, row) in transition.data().chunks(states).enumerate() {
                if let Some(value) = row.iter().find(|x| !(0. ..=1.).contains(*x)) {
                    return Err(ValidationError::TransitionRange {
                        state: s,
                        profile: p,
                        value: *value,
                    });
                }
                let sum = row.iter().sum::<Probability>();
                if (sum - 1.).abs() > STOCHASTIC_TOLERANCE {
                    return Err(ValidationError::NonStochastic {
                        state: s,
                        profile: p,
                        sum,
                    });
                }
            }
        }
        let discounts = discounts.into().expand(players)?;
        let layout = Layout::new(actions);
        let labels = Labels::numbered(&layout);
        Ok(Self {
            layout,
            labels,
            payoffs: payoffs.into_iter().map(|t| t.data().to_vec()).collect(),
            transitions: transitions.into_iter().map(|t| t.data().to_vec()).collect(),
            discounts,
        })
    }

    /// Single-state normal-form game, shaped `[N, |A_0|, …, |A_{N-1}|]`,
    /// with discount zero.
    pub fn one_shot(payoff: Tensor) -> Result<Self, ValidationError> {
        let profiles = payoff.shape().iter().skip(1).copied().collect::<Vec<_>>();
        let transition = Tensor::full(
            profiles.iter().copied().chain(std::iter::once(1)).collect(),
            1.,
        );
        Self::new(vec![payoff], vec![transition], 0.)
    }

    /// Replace all labels at once.
    pub fn with_labels(mut self, labels: Labels) -> Result<Self, ValidationError> {
        labels.check(&self.layout)?;
        self.labels = labels;
        Ok(self)
    }
    pub fn with_state_labels(mut self, states: Vec<String>) -> Result<Self, ValidationError> {
        self.labels.states = states;
        self.labels.check(&self.layout)?;
        Ok(self)
    }
    pub fn with_player_labels(mut self, players: Vec<String>) -> Result<Self, ValidationError> {
        self.labels.players = players;
        self.labels.check(&self.layout)?;
        Ok(self)
    }
    /// Use the same action labels for every `(state, player)`.
    /// Requires a common number of actions.
    pub fn with_action_labels(mut self, actions: Vec<String>) -> Result<Self, ValidationError> {
        self.labels.actions = (0..self.layout.states())
            .map(|_| vec![actions.clone(); self.layout.players()])
            .collect();
        self.labels.check(&self.layout)?;
        Ok(self)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
    pub fn labels(&self) -> &Labels {
        &self.labels
    }
    pub fn states(&self) -> usize {
        self.layout.states()
    }
    pub fn players(&self) -> usize {
        self.layout.players()
    }
    pub fn discount(&self, i: usize) -> Probability {
        self.discounts[i]
    }
    pub fn discounts(&self) -> &[Probability] {
        &self.discounts
    }
    /// Stage payoff of player `i` in state `s` under profile index `p`.
    pub fn payoff(&self, i: usize, s: usize, p: usize) -> Utility {
        self.payoffs[s][i * self.layout.profiles(s) + p]
    }
    /// Transition probabilities out of state `s` under profile index `p`.
    pub fn transition(&self, s: usize, p: usize) -> &[Probability] {
        let n = self.states();
        &self.transitions[s][p * n..(p + 1) * n]
    }
    /// Payoff array of state `s` in exchange format.
    pub fn payoff_tensor(&self, s: usize) -> Tensor {
        Tensor::new(
            std::iter::once(self.players())
                .chain(self.layout.shape(s).iter().copied())
                .collect(),
            self.payoffs[s].clone(),
        )
        .expect("stored payoffs match their layout")
    }
    /// Transition array of state `s` in exchange format.
    pub fn transition_tensor(&self, s: usize) -> Tensor {
        Tensor::new(
            self.layout
                .shape(s)
                .iter()
                .copied()
                .chain(std::iter::once(self.states()))
                .collect(),
            self.transitions[s].clone(),
        )
        .expect("stored transitions match their layout")
    }
    /// Largest absolute stage payoff, or one for an all-zero game.
    pub fn payoff_scale(&self) -> Utility {
        match self.payoffs.iter().flatten().fold(0., |m: Utility, x| m.max(x.abs())) {
            0. => 1.,
            scale => scale,
        }
    }

    /// Value function of a strategy profile.
    ///
    /// Solves `(I - δ_i P_σ) V_i = r_σ,i` for each player, where `P_σ` is the
    /// state transition matrix and `r_σ,i` the expected stage payoff under `σ`.
    pub fn values(&self, strategy: &Strategy) -> Result<Values, ValidationError> {
        strategy.check(&self.layout)?;
        let n = self.states();
        let mut transition = DMatrix::<Probability>::zeros(n, n);
        let mut rewards = DMatrix::<Utility>::zeros(n, self.players());
        for s in 0..n {
            for (p, acts) in self.layout.joint(s) {
                let prob = acts
                    .iter()
                    .enumerate()
                    .map(|(j, a)| strategy.get(s, j, *a))
                    .product::<Probability>();
                if prob == 0. {
                    continue;
                }
                for (next, phi) in self.transition(s, p).iter().enumerate() {
                    transition[(s, next)] += prob * phi;
                }
                for i in 0..self.players() {
                    rewards[(s, i)] += prob * self.payoff(i, s, p);
                }
            }
        }
        let mut values = Values::zeros(&self.layout);
        for i in 0..self.players() {
            let system = DMatrix::<Probability>::identity(n, n) - &transition * self.discount(i);
            let solution = system
                .lu()
                .solve(&DVector::from_iterator(n, rewards.column(i).iter().copied()))
                .expect("I - δP is strictly diagonally dominant for δ < 1");
            for s in 0..n {
                values.set(s, i, solution[s]);
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn stag_hunt() -> StochasticGame {
        StochasticGame::one_shot(
            Tensor::new(
                vec![2, 2, 2],
                vec![10., 1., 8., 5., 10., 8., 1., 5.],
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn one_shot_shape() {
        let game = stag_hunt();
        assert_eq!(game.states(), 1);
        assert_eq!(game.players(), 2);
        assert_eq!(game.layout().dim(), 4 + 2 + 1);
        assert_eq!(game.payoff(0, 0, 1), 1.);
        assert_eq!(game.payoff(1, 0, 1), 8.);
        assert_eq!(game.transition(0, 3), &[1.]);
        assert_eq!(game.discount(1), 0.);
    }

    #[test]
    fn rejects_non_stochastic_rows() {
        let payoff = Tensor::full(vec![1, 2], 0.);
        let transition = Tensor::new(vec![2, 2], vec![0.5, 0.5, 0.4, 0.4]).unwrap();
        assert!(matches!(
            StochasticGame::new(vec![payoff.clone(), payoff], vec![transition.clone(), transition], 0.9),
            Err(ValidationError::NonStochastic { state: 0, profile: 1, .. })
        ));
    }

    #[test]
    fn rejects_negative_transitions() {
        let payoff = Tensor::full(vec![1, 1], 0.);
        let transition = Tensor::new(vec![1, 2], vec![1.5, -0.5]).unwrap();
        assert!(matches!(
            StochasticGame::new(vec![payoff.clone(), payoff], vec![transition.clone(), transition], 0.9),
            Err(ValidationError::TransitionRange { .. })
        ));
    }

    #[test]
    fn rejects_shape_mismatch() {
        let payoff = Tensor::full(vec![2, 2, 2], 0.);
        let transition = Tensor::full(vec![2, 3, 1], 1.);
        assert!(matches!(
            StochasticGame::new(vec![payoff], vec![transition], 0.),
            Err(ValidationError::Shape { what: "transition", .. })
        ));
    }

    #[test]
    fn rejects_empty_action_set() {
        let payoff = Tensor::new(vec![2, 2, 0], vec![]).unwrap();
        let transition = Tensor::new(vec![2, 0, 1], vec![]).unwrap();
        assert!(matches!(
            StochasticGame::new(vec![payoff], vec![transition], 0.),
            Err(ValidationError::NoActions { state: 0, player: 1 })
        ));
    }

    #[test]
    fn rejects_invalid_discount() {
        let payoff = Tensor::full(vec![1, 1], 0.);
        let transition = Tensor::full(vec![1, 1], 1.);
        assert!(StochasticGame::new(vec![payoff], vec![transition], 1.0).is_err());
    }

    #[test]
    fn values_of_mixed_stag_hunt() {
        let game = stag_hunt();
        let sigma = Strategy::from(vec![vec![vec![2. / 3., 1. / 3.]; 2]]);
        let values = game.values(&sigma).unwrap();
        assert!((values.get(0, 0) - 7.).abs() < 1e-12);
        assert!((values.get(0, 1) - 7.).abs() < 1e-12);
    }

    #[test]
    fn values_discount_geometric_series() {
        // one state, one player, one action, payoff 1, δ = 0.9 → V = 10
        let game = StochasticGame::new(
            vec![Tensor::full(vec![1, 1], 1.)],
            vec![Tensor::full(vec![1, 1], 1.)],
            0.9,
        )
        .unwrap();
        let values = game.values(&Strategy::uniform(game.layout())).unwrap();
        assert!((values.get(0, 0) - 10.).abs() < 1e-10);
    }

    #[test]
    fn labels_must_match_counts() {
        let game = stag_hunt();
        assert!(game.clone().with_action_labels(vec!["stag".into(), "hare".into()]).is_ok());
        assert!(game.clone().with_action_labels(vec!["stag".into()]).is_err());
        let named = game
            .clone()
            .with_state_labels(vec!["forest".into()])
            .unwrap()
            .with_player_labels(vec!["alice".into(), "bob".into()])
            .unwrap();
        assert_eq!(named.labels().states, vec!["forest".to_string()]);
        assert_eq!(named.labels().players[1], "bob");
        assert!(game.clone().with_state_labels(vec![]).is_err());
        assert!(game.with_player_labels(vec!["alice".into()]).is_err());
    }

    #[test]
    fn json_round_trip() {
        let game = stag_hunt()
            .with_action_labels(vec!["stag".into(), "hare".into()])
            .unwrap();
        let json = serde_json::to_string(&game).unwrap();
        let back = serde_json::from_str::<StochasticGame>(&json).unwrap();
        assert_eq!(game, back);
    }
}
