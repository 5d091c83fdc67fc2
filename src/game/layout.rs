use std::ops::Range;

/// Index arithmetic of the state vector `y = (σ, V, t)`.
///
/// Strategy entries are flattened state-major, then player, then action.
/// Values follow state-major, then player. The homotopy parameter is last.
/// Residual component `k` is the equation paired with unknown `k`, so
/// the Jacobian is `(D-1) × D` with row indices shared with `y`.
///
/// Joint action profiles of a state are enumerated row-major over players,
/// player 0 most significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    actions: Vec<Vec<usize>>,
    offsets: Vec<Vec<usize>>,
    strides: Vec<Vec<usize>>,
    sigmas: usize,
}

impl Layout {
    /// `actions[s][i]` is the number of actions of player `i` in state `s`.
    /// Callers guarantee a rectangular, non-empty shape.
    pub fn new(actions: Vec<Vec<usize>>) -> Self {
        let mut cursor = 0;
        let offsets = actions
            .iter()
            .map(|counts| {
                counts
                    .iter()
                    .map(|n| {
                        let offset = cursor;
                        cursor += n;
                        offset
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let strides = actions
            .iter()
            .map(|counts| {
                let mut strides = vec![1; counts.len()];
                for i in (0..counts.len().saturating_sub(1)).rev() {
                    strides[i] = strides[i + 1] * counts[i + 1];
                }
                strides
            })
            .collect::<Vec<_>>();
        Self {
            actions,
            offsets,
            strides,
            sigmas: cursor,
        }
    }

    pub fn states(&self) -> usize {
        self.actions.len()
    }
    pub fn players(&self) -> usize {
        self.actions.first().map_or(0, |a| a.len())
    }
    /// Number of actions of player `i` in state `s`.
    pub fn actions(&self, s: usize, i: usize) -> usize {
        self.actions[s][i]
    }
    /// Action counts of every player in state `s`.
    pub fn shape(&self, s: usize) -> &[usize] {
        &self.actions[s]
    }
    /// Number of joint action profiles in state `s`.
    pub fn profiles(&self, s: usize) -> usize {
        self.actions[s].iter().product()
    }

    /// Total number of strategy entries.
    pub fn sigmas(&self) -> usize {
        self.sigmas
    }
    /// Total number of value entries.
    pub fn values(&self) -> usize {
        self.states() * self.players()
    }
    /// Dimension `D` of the state vector.
    pub fn dim(&self) -> usize {
        self.sigmas + self.values() + 1
    }
    /// Number of homotopy equations, `D - 1`.
    pub fn equations(&self) -> usize {
        self.dim() - 1
    }

    /// Index of `σ(s, i, a)` in `y`.
    pub fn sigma(&self, s: usize, i: usize, a: usize) -> usize {
        self.offsets[s][i] + a
    }
    /// Indices of the simplex `σ(s, i, ·)` in `y`.
    pub fn simplex(&self, s: usize, i: usize) -> Range<usize> {
        let start = self.offsets[s][i];
        start..start + self.actions[s][i]
    }
    /// Indices of every strategy entry of state `s` in `y`.
    pub fn block(&self, s: usize) -> Range<usize> {
        let start = self.offsets[s][0];
        start..start + self.actions[s].iter().sum::<usize>()
    }
    /// Index of `V(s, i)` in `y`.
    pub fn value(&self, s: usize, i: usize) -> usize {
        self.sigmas + s * self.players() + i
    }
    /// Index of `t` in `y`.
    pub fn t(&self) -> usize {
        self.dim() - 1
    }

    /// Flat profile index of the joint action `acts` in state `s`.
    pub fn encode(&self, s: usize, acts: &[usize]) -> usize {
        acts.iter()
            .zip(self.strides[s].iter())
            .map(|(a, stride)| a * stride)
            .sum()
    }
    /// Joint action of flat profile index `p` in state `s`.
    pub fn decode(&self, s: usize, p: usize) -> Vec<usize> {
        self.strides[s]
            .iter()
            .zip(self.actions[s].iter())
            .map(|(stride, n)| (p / stride) % n)
            .collect()
    }
    /// Every `(profile index, joint action)` of state `s` in enumeration order.
    pub fn joint(&self, s: usize) -> impl Iterator<Item = (usize, Vec<usize>)> + '_ {
        (0..self.profiles(s)).map(move |p| (p, self.decode(s, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new(vec![vec![2, 3], vec![1, 2]])
    }

    #[test]
    fn dimensions() {
        let l = layout();
        assert_eq!(l.sigmas(), 8);
        assert_eq!(l.values(), 4);
        assert_eq!(l.dim(), 13);
        assert_eq!(l.equations(), 12);
        assert_eq!(l.t(), 12);
    }

    #[test]
    fn offsets_are_contiguous() {
        let l = layout();
        assert_eq!(l.simplex(0, 0), 0..2);
        assert_eq!(l.simplex(0, 1), 2..5);
        assert_eq!(l.simplex(1, 0), 5..6);
        assert_eq!(l.simplex(1, 1), 6..8);
        assert_eq!(l.block(1), 5..8);
        assert_eq!(l.value(1, 0), 10);
    }

    #[test]
    fn profiles_round_trip() {
        let l = layout();
        for (p, acts) in l.joint(0) {
            assert_eq!(l.encode(0, &acts), p);
        }
        assert_eq!(l.decode(0, 4), vec![1, 1]);
    }
}
