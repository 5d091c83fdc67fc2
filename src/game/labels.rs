use crate::Layout;
use crate::ValidationError;
use serde::Deserialize;
use serde::Serialize;

/// Human-readable names of states, players and actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    pub states: Vec<String>,
    pub players: Vec<String>,
    /// `actions[s][i][a]`
    pub actions: Vec<Vec<Vec<String>>>,
}

impl Labels {
    /// `state{k}`, `player{k}`, `a{k}`.
    pub fn numbered(layout: &Layout) -> Self {
        Self {
            states: (0..layout.states()).map(|s| format!("state{}", s)).collect(),
            players: (0..layout.players()).map(|i| format!("player{}", i)).collect(),
            actions: (0..layout.states())
                .map(|s| {
                    (0..layout.players())
                        .map(|i| (0..layout.actions(s, i)).map(|a| format!("a{}", a)).collect())
                        .collect()
                })
                .collect(),
        }
    }

    /// Check every label list matches the layout.
    pub fn check(&self, layout: &Layout) -> Result<(), ValidationError> {
        Self::count("state labels", layout.states(), self.states.len())?;
        Self::count("player labels", layout.players(), self.players.len())?;
        Self::count("action label states", layout.states(), self.actions.len())?;
        for (s, players) in self.actions.iter().enumerate() {
            Self::count("action label players", layout.players(), players.len())?;
            for (i, actions) in players.iter().enumerate() {
                Self::count("action labels", layout.actions(s, i), actions.len())?;
            }
        }
        Ok(())
    }

    fn count(what: &'static str, expected: usize, found: usize) -> Result<(), ValidationError> {
        if expected == found {
            Ok(())
        } else {
            Err(ValidationError::Count {
                what,
                expected,
                found,
            })
        }
    }
}
