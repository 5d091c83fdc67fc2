use crate::*;
use serde::Deserialize;
use serde::Serialize;

/// JSON exchange form of a [`StochasticGame`].
///
/// Deserializing a game goes through [`StochasticGame::new`], so a
/// description that parses is also a valid game.
///
/// ```json
/// {
///   "payoffs":     [{ "shape": [2, 2, 2], "data": [10, 1, 8, 5, 10, 8, 1, 5] }],
///   "transitions": [{ "shape": [2, 2, 1], "data": [1, 1, 1, 1] }],
///   "discounts":   0.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDescription {
    pub payoffs: Vec<Tensor>,
    pub transitions: Vec<Tensor>,
    pub discounts: Discounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

impl TryFrom<GameDescription> for StochasticGame {
    type Error = ValidationError;
    fn try_from(description: GameDescription) -> Result<Self, Self::Error> {
        let game = Self::new(description.payoffs, description.transitions, description.discounts)?;
        match description.labels {
            Some(labels) => game.with_labels(labels),
            None => Ok(game),
        }
    }
}

impl From<StochasticGame> for GameDescription {
    fn from(game: StochasticGame) -> Self {
        Self {
            payoffs: (0..game.states()).map(|s| game.payoff_tensor(s)).collect(),
            transitions: (0..game.states()).map(|s| game.transition_tensor(s)).collect(),
            discounts: Discounts::from(game.discounts()),
            labels: Some(game.labels().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_without_labels() {
        let json = r#"{
            "payoffs":     [{ "shape": [2, 2, 2], "data": [10, 1, 8, 5, 10, 8, 1, 5] }],
            "transitions": [{ "shape": [2, 2, 1], "data": [1, 1, 1, 1] }],
            "discounts":   0.0
        }"#;
        let game = serde_json::from_str::<StochasticGame>(json).unwrap();
        assert_eq!(game.payoff(1, 0, 2), 1.);
        assert_eq!(game.labels().players, vec!["player0", "player1"]);
    }

    #[test]
    fn invalid_description_fails_to_parse() {
        let json = r#"{
            "payoffs":     [{ "shape": [1, 2], "data": [0, 0] }],
            "transitions": [{ "shape": [2, 1], "data": [1, 0.5] }],
            "discounts":   [0.9]
        }"#;
        let error = serde_json::from_str::<StochasticGame>(json).unwrap_err();
        assert!(error.to_string().contains("transition row sums to"));
    }
}
