use crate::*;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

/// One cell of a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(x) => x.is_nan(),
        }
    }
    fn label(&self) -> Option<String> {
        match self {
            Self::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Self::Number(x) if !x.is_nan() => Some(x.to_string()),
            _ => None,
        }
    }
    fn number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Empty => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Self::Number(x)
    }
}
impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Flattened tabular form of a game.
///
/// Columns are `state`, `a_<player>` per player, `u_<player>` per player, then
/// either `phi_<state>` per state or a single `to_state` column naming a
/// deterministic successor. One row whose `state` cell reads `delta` carries
/// the discount factors under the `u_` columns. Every other row is one
/// `(state, action profile)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

const DELTA: &str = "delta";

fn malformed(message: impl Into<String>) -> ValidationError {
    ValidationError::Table(message.into())
}

/// Labels in order of first appearance, with their index lookup.
#[derive(Default)]
struct Ordering {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl Ordering {
    fn insert(&mut self, label: String) -> usize {
        match self.index.get(&label) {
            Some(k) => *k,
            None => {
                self.index.insert(label.clone(), self.labels.len());
                self.labels.push(label);
                self.labels.len() - 1
            }
        }
    }
}

enum Successors {
    Explicit(Vec<(String, usize)>),
    Deterministic(usize),
}

impl StochasticGame {
    /// Build a game from its tabular form.
    pub fn from_table(table: &Table) -> Result<Self, ValidationError> {
        let column = |name: &str| table.columns.iter().position(|c| c == name);
        let state_col = column("state").ok_or_else(|| malformed("missing column 'state'"))?;
        let players = table
            .columns
            .iter()
            .enumerate()
            .filter_map(|(k, c)| c.strip_prefix("a_").map(|p| (k, p.to_string())))
            .collect::<Vec<_>>();
        if players.is_empty() {
            return Err(malformed("no 'a_<player>' columns"));
        }
        let utility_cols = players
            .iter()
            .map(|(_, p)| column(&format!("u_{}", p)).ok_or_else(|| malformed(format!("missing column 'u_{}'", p))))
            .collect::<Result<Vec<_>, _>>()?;
        let successors = match column("to_state") {
            Some(k) => Successors::Deterministic(k),
            None => Successors::Explicit(
                table
                    .columns
                    .iter()
                    .enumerate()
                    .filter_map(|(k, c)| c.strip_prefix("phi_").map(|s| (s.to_string(), k)))
                    .collect(),
            ),
        };
        if let Successors::Explicit(ref phis) = successors {
            if phis.is_empty() {
                return Err(malformed("neither 'phi_<state>' columns nor a 'to_state' column"));
            }
        }
        if let Some(r) = table.rows.iter().position(|row| row.len() != table.columns.len()) {
            return Err(malformed(format!("row {} has {} cells, expected {}", r, table.rows[r].len(), table.columns.len())));
        }

        // discount row
        let delta = table
            .rows
            .iter()
            .find(|row| row[state_col].label().as_deref() == Some(DELTA))
            .ok_or_else(|| malformed("missing 'delta' row"))?;
        let discounts = utility_cols
            .iter()
            .map(|k| delta[*k].number().ok_or_else(|| malformed("malformed discount factor in 'delta' row")))
            .collect::<Result<Vec<_>, _>>()?;

        // first pass: labels in order of appearance
        let body = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[state_col].label().as_deref() != Some(DELTA))
            .collect::<Vec<_>>();
        let mut states = Ordering::default();
        let mut actions = Vec::<Vec<Ordering>>::new();
        for (r, row) in body.iter() {
            let state = row[state_col].label().ok_or_else(|| malformed(format!("row {}: missing state", r)))?;
            let s = states.insert(state);
            if s == actions.len() {
                actions.push((0..players.len()).map(|_| Ordering::default()).collect());
            }
            for (i, (k, p)) in players.iter().enumerate() {
                let action = row[*k]
                    .label()
                    .ok_or_else(|| malformed(format!("row {}: missing action of player '{}'", r, p)))?;
                actions[s][i].insert(action);
            }
        }
        if states.labels.is_empty() {
            return Err(ValidationError::NoStates);
        }
        let layout = Layout::new(
            actions
                .iter()
                .map(|per| per.iter().map(|o| o.labels.len()).collect())
                .collect(),
        );
        let n = states.labels.len();
        let next = match successors {
            Successors::Deterministic(k) => Successors::Deterministic(k),
            Successors::Explicit(phis) => {
                if phis.len() != n {
                    return Err(malformed(format!("{} 'phi_' columns for {} states", phis.len(), n)));
                }
                let mut ordered = vec![0; n];
                for (label, k) in phis.iter() {
                    let s = *states
                        .index
                        .get(label)
                        .ok_or_else(|| malformed(format!("column 'phi_{}' names an unknown state", label)))?;
                    ordered[s] = *k;
                }
                Successors::Explicit(states.labels.iter().cloned().zip(ordered).collect())
            }
        };

        // second pass: fill arrays
        let stateless = discounts.iter().all(|d| *d == 0.);
        let mut payoffs = (0..n)
            .map(|s| vec![0.; players.len() * layout.profiles(s)])
            .collect::<Vec<_>>();
        let mut transitions = (0..n)
            .map(|s| vec![0.; layout.profiles(s) * n])
            .collect::<Vec<_>>();
        let mut seen = (0..n)
            .map(|s| vec![false; layout.profiles(s)])
            .collect::<Vec<_>>();
        for (r, row) in body.iter() {
            let s = states.index[&row[state_col].label().unwrap_or_default()];
            let acts = players
                .iter()
                .enumerate()
                .map(|(i, (k, _))| actions[s][i].index[&row[*k].label().unwrap_or_default()])
                .collect::<Vec<_>>();
            let p = layout.encode(s, &acts);
            if std::mem::replace(&mut seen[s][p], true) {
                return Err(malformed(format!("row {}: duplicate action profile", r)));
            }
            for (i, k) in utility_cols.iter().enumerate() {
                payoffs[s][i * layout.profiles(s) + p] = row[*k]
                    .number()
                    .ok_or_else(|| malformed(format!("row {}: malformed payoff", r)))?;
            }
            let phi = &mut transitions[s][p * n..(p + 1) * n];
            match next {
                Successors::Deterministic(k) => {
                    let label = row[k].label().ok_or_else(|| malformed(format!("row {}: missing 'to_state'", r)))?;
                    let target = states
                        .index
                        .get(&label)
                        .ok_or_else(|| malformed(format!("row {}: unknown next state '{}'", r, label)))?;
                    phi[*target] = 1.;
                }
                Successors::Explicit(ref cols) => {
                    for (target, (_, k)) in cols.iter().enumerate() {
                        if !row[*k].is_empty() {
                            phi[target] = row[*k]
                                .number()
                                .ok_or_else(|| malformed(format!("row {}: malformed transition probability", r)))?;
                        }
                    }
                }
            }
            // without discounting the continuation never matters
            if stateless && phi.iter().all(|x| *x == 0.) {
                phi[s] = 1.;
            }
        }
        if let Some((s, p)) = seen
            .iter()
            .enumerate()
            .find_map(|(s, row)| row.iter().position(|x| !x).map(|p| (s, p)))
        {
            return Err(malformed(format!(
                "state '{}': missing action profile {:?}",
                states.labels[s],
                layout.decode(s, p)
            )));
        }

        let payoffs = (0..n)
            .map(|s| {
                Tensor::new(
                    std::iter::once(players.len()).chain(layout.shape(s).iter().copied()).collect(),
                    std::mem::take(&mut payoffs[s]),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let transitions = (0..n)
            .map(|s| {
                Tensor::new(
                    layout.shape(s).iter().copied().chain(std::iter::once(n)).collect(),
                    std::mem::take(&mut transitions[s]),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(payoffs, transitions, discounts)?.with_labels(Labels {
            states: states.labels,
            players: players.into_iter().map(|(_, p)| p).collect(),
            actions: actions
                .into_iter()
                .map(|per| per.into_iter().map(|o| o.labels).collect())
                .collect(),
        })
    }

    /// Tabular form with explicit `phi_<state>` columns.
    pub fn to_table(&self) -> Table {
        let labels = self.labels();
        let n = self.states();
        let columns = std::iter::once("state".to_string())
            .chain(labels.players.iter().map(|p| format!("a_{}", p)))
            .chain(labels.players.iter().map(|p| format!("u_{}", p)))
            .chain(labels.states.iter().map(|s| format!("phi_{}", s)))
            .collect();
        let delta = std::iter::once(Cell::from(DELTA))
            .chain((0..self.players()).map(|_| Cell::Empty))
            .chain(self.discounts().iter().map(|d| Cell::Number(*d)))
            .chain((0..n).map(|_| Cell::Empty))
            .collect();
        let body = (0..n).flat_map(|s| {
            self.layout().joint(s).map(move |(p, acts)| {
                std::iter::once(Cell::Text(labels.states[s].clone()))
                    .chain(acts.iter().enumerate().map(|(i, a)| Cell::Text(labels.actions[s][i][*a].clone())))
                    .chain((0..self.players()).map(|i| Cell::Number(self.payoff(i, s, p))))
                    .chain(self.transition(s, p).iter().map(|x| Cell::Number(*x)))
                    .collect::<Vec<_>>()
            })
        });
        Table {
            columns,
            rows: std::iter::once(delta).chain(body).collect(),
        }
    }
}
