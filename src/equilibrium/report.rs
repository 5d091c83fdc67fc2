use crate::*;
use serde::Deserialize;
use serde::Serialize;

/// Per-state breakdown of an equilibrium, for programs and for people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub t: Parameter,
    pub residual: Residual,
    pub states: Vec<StateReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReport {
    pub state: String,
    pub players: Vec<PlayerReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub player: String,
    pub value: Utility,
    pub actions: Vec<String>,
    pub strategy: Vec<Probability>,
}

impl From<&Equilibrium> for Report {
    fn from(equilibrium: &Equilibrium) -> Self {
        let labels = &equilibrium.labels;
        Self {
            t: equilibrium.t,
            residual: equilibrium.residual,
            states: labels
                .states
                .iter()
                .enumerate()
                .map(|(s, state)| StateReport {
                    state: state.clone(),
                    players: labels
                        .players
                        .iter()
                        .enumerate()
                        .map(|(i, player)| PlayerReport {
                            player: player.clone(),
                            value: equilibrium.values.get(s, i),
                            actions: labels.actions[s][i].clone(),
                            strategy: equilibrium.strategies.simplex(s, i).to_vec(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Display for StateReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "+++++++++ {} +++++++++", self.state)?;
        let name = self.players.iter().map(|p| p.player.chars().count()).max().unwrap_or(0);
        let mut header = None::<&Vec<String>>;
        for player in self.players.iter() {
            let width = player.actions.iter().map(|a| a.chars().count()).max().unwrap_or(0).max(5);
            let prefix = format!("{:<name$} : v={:.2}, σ=[", player.player, player.value, name = name);
            if header != Some(&player.actions) {
                let labels = player
                    .actions
                    .iter()
                    .map(|a| format!("{:>width$}", a, width = width))
                    .collect::<Vec<_>>()
                    .join("  ");
                writeln!(f, "{}{}", " ".repeat(prefix.chars().count()), labels)?;
                header = Some(&player.actions);
            }
            let probabilities = player
                .strategy
                .iter()
                .map(|p| format!("{:>width$.3}", p, width = width))
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(f, "{}{}]", prefix, probabilities)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for state in self.states.iter() {
            writeln!(f, "{}", state)?;
        }
        write!(f, "t = {:.6}, residual = {:.2e}", self.t, self.residual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_state_table() {
        let state = StateReport {
            state: "state0".into(),
            players: vec![
                PlayerReport {
                    player: "player0".into(),
                    value: 5.,
                    actions: vec!["stag".into(), "hare".into()],
                    strategy: vec![0., 1.],
                },
                PlayerReport {
                    player: "player1".into(),
                    value: 5.,
                    actions: vec!["stag".into(), "hare".into()],
                    strategy: vec![0., 1.],
                },
            ],
        };
        let text = state.to_string();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "+++++++++ state0 +++++++++");
        assert_eq!(lines[1], "                      stag   hare");
        assert_eq!(lines[2], "player0 : v=5.00, σ=[0.000  1.000]");
        assert_eq!(lines[3], "player1 : v=5.00, σ=[0.000  1.000]");
    }
}
