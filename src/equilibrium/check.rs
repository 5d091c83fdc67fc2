use crate::*;

/// Largest gain from a one-shot deviation of every `(s, i)`, with `V` the
/// strategy's own value function. All zero exactly at an equilibrium.
pub fn check_equilibrium(game: &StochasticGame, strategy: &Strategy) -> Result<Vec<Vec<Utility>>, ValidationError> {
    let layout = game.layout();
    let values = game.values(strategy)?;
    let e = Expectation::evaluate(game, &strategy.flatten(), &values.flatten(), false);
    Ok((0..layout.states())
        .map(|s| {
            (0..layout.players())
                .map(|i| {
                    let best = e.u[layout.simplex(s, i)].iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    (best - values.get(s, i)).max(0.)
                })
                .collect()
        })
        .collect())
}

/// No player gains more than `tolerance` by deviating anywhere.
pub fn is_equilibrium(game: &StochasticGame, strategy: &Strategy, tolerance: Utility) -> Result<bool, ValidationError> {
    Ok(check_equilibrium(game, strategy)?
        .iter()
        .flatten()
        .all(|gain| *gain <= tolerance))
}
