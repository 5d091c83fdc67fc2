use crate::Layout;
use crate::Utility;
use crate::ValidationError;
use serde::Deserialize;
use serde::Serialize;

/// Value function `V[s][i]`: expected discounted payoff
/// of player `i` starting in state `s`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(Vec<Vec<Utility>>);

impl Values {
    pub fn zeros(layout: &Layout) -> Self {
        Self(vec![vec![0.; layout.players()]; layout.states()])
    }
    /// Reshape the value segment of a state vector.
    pub fn from_flat(layout: &Layout, flat: &[Utility]) -> Self {
        Self(
            (0..layout.states())
                .map(|s| flat[s * layout.players()..(s + 1) * layout.players()].to_vec())
                .collect(),
        )
    }
    pub fn flatten(&self) -> Vec<Utility> {
        self.0.iter().flatten().copied().collect()
    }
    pub fn get(&self, s: usize, i: usize) -> Utility {
        self.0[s][i]
    }
    pub fn set(&mut self, s: usize, i: usize, v: Utility) {
        self.0[s][i] = v;
    }
    pub fn states(&self) -> &[Vec<Utility>] {
        &self.0
    }
    pub fn check(&self, layout: &Layout) -> Result<(), ValidationError> {
        if self.0.len() != layout.states() {
            return Err(ValidationError::Count {
                what: "value states",
                expected: layout.states(),
                found: self.0.len(),
            });
        }
        if let Some(players) = self.0.iter().find(|v| v.len() != layout.players()) {
            return Err(ValidationError::Count {
                what: "value players",
                expected: layout.players(),
                found: players.len(),
            });
        }
        if self.0.iter().flatten().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(ValidationError::NonFinite { what: "values" })
        }
    }
}

impl From<Vec<Vec<Utility>>> for Values {
    fn from(nested: Vec<Vec<Utility>>) -> Self {
        Self(nested)
    }
}

impl From<Values> for Vec<Vec<Utility>> {
    fn from(values: Values) -> Self {
        values.0
    }
}
