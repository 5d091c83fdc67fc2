use crate::Probability;
use crate::ValidationError;
use serde::Deserialize;
use serde::Serialize;

/// Discount factors: one common factor or one per player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Discounts {
    Uniform(Probability),
    Individual(Vec<Probability>),
}

impl Discounts {
    /// Expand to one factor per player, validating each lies in `[0, 1)`.
    pub fn expand(&self, players: usize) -> Result<Vec<Probability>, ValidationError> {
        let deltas = match self {
            Self::Uniform(delta) => vec![*delta; players],
            Self::Individual(deltas) if deltas.len() == players => deltas.clone(),
            Self::Individual(deltas) => {
                return Err(ValidationError::Count {
                    what: "discount factors",
                    expected: players,
                    found: deltas.len(),
                });
            }
        };
        match deltas
            .iter()
            .enumerate()
            .find(|(_, d)| !(d.is_finite() && **d >= 0. && **d < 1.))
        {
            Some((player, value)) => Err(ValidationError::Discount {
                player,
                value: *value,
            }),
            None => Ok(deltas),
        }
    }
}

impl From<Probability> for Discounts {
    fn from(delta: Probability) -> Self {
        Self::Uniform(delta)
    }
}

impl From<Vec<Probability>> for Discounts {
    fn from(deltas: Vec<Probability>) -> Self {
        Self::Individual(deltas)
    }
}

impl From<&[Probability]> for Discounts {
    fn from(deltas: &[Probability]) -> Self {
        Self::Individual(deltas.to_vec())
    }
}
