use sgame::*;

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        evaluating_expectation_derivatives,
        evaluating_tracing_jacobian,
        locating_tracing_start,
        solving_qre_random_game,
        solving_tracing_random_game,
}

fn game() -> StochasticGame {
    StochasticGame::random(3, 3, 3, 0.95, 42).expect("valid random game")
}

fn evaluating_expectation_derivatives(c: &mut criterion::Criterion) {
    let game = game();
    let sigma = game.random_strategy(1).flatten();
    let values = vec![1.; game.layout().values()];
    c.bench_function("evaluate action values with derivatives (3×3×3)", |b| {
        b.iter(|| Expectation::evaluate(&game, &sigma, &values, true))
    });
}

fn evaluating_tracing_jacobian(c: &mut criterion::Criterion) {
    let tracing = LogTracing::new(game());
    let y = tracing.y0();
    c.bench_function("evaluate LogTracing Jacobian (3×3×3)", |b| {
        b.iter(|| tracing.jacobian(&y))
    });
}

fn locating_tracing_start(c: &mut criterion::Criterion) {
    let tracing = LogTracing::new(game());
    c.bench_function("locate LogTracing starting point (δ = 0.95)", |b| {
        b.iter(|| tracing.y0())
    });
}

fn solving_qre_random_game(c: &mut criterion::Criterion) {
    c.bench_function("solve QRE on a random 2×2×2 game", |b| {
        b.iter(|| {
            let game = StochasticGame::random(2, 2, 2, 0.9, 7).expect("valid random game");
            let mut tracker = QRE::new(game).tracker();
            tracker.settings_mut().verbose = 0;
            tracker.solve()
        })
    });
}

fn solving_tracing_random_game(c: &mut criterion::Criterion) {
    c.bench_function("solve LogTracing on a random 2×2×2 game", |b| {
        b.iter(|| {
            let game = StochasticGame::random(2, 2, 2, 0.9, 7).expect("valid random game");
            let mut tracker = LogTracing::new(game).tracker();
            tracker.settings_mut().verbose = 0;
            tracker.solve()
        })
    });
}
