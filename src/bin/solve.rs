//! Solve Binary
//!
//! Reads a JSON game description, traces a homotopy to its target,
//! and prints the equilibrium as a table or as a JSON report.

use clap::Parser;
use clap::ValueEnum;
use sgame::*;
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Logit quantal response, target is the precision λ
    Qre,
    /// Logarithmic tracing from a prior
    Tracing,
}

#[derive(Parser)]
#[command(author, version, about = "Equilibria of stochastic games by homotopy continuation", long_about = None)]
struct Args {
    /// JSON game description
    #[arg(required = true)]
    game: PathBuf,
    #[arg(long, value_enum, default_value = "tracing")]
    method: Method,
    /// Homotopy parameter to land on
    #[arg(long)]
    target: Option<f64>,
    /// Barrier strength of the tracing homotopy
    #[arg(long, default_value_t = TRACING_ETA)]
    eta: f64,
    /// Seed of a random tracing prior instead of the uniform one
    #[arg(long)]
    prior_seed: Option<u64>,
    /// Trace against the canonical tangent
    #[arg(long)]
    reverse: bool,
    #[arg(long)]
    ds_max: Option<f64>,
    #[arg(long)]
    max_steps: Option<usize>,
    #[arg(long)]
    corrector_tolerance: Option<f64>,
    /// Resume from a saved tracker state
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Save the tracker state when done or failed
    #[arg(long)]
    save: Option<PathBuf>,
    /// Record the path and log it at the end
    #[arg(long)]
    path: bool,
    /// Path records kept when recording
    #[arg(long, default_value_t = PATH_CAPACITY)]
    path_capacity: usize,
    /// Start from the cautious tracker preset
    #[arg(long)]
    robust: bool,
    /// 0 silent, 1 summary, 2 every step
    #[arg(long, default_value_t = 1)]
    verbose: u8,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    log();
    let args = Args::parse();
    let file = std::fs::File::open(&args.game)?;
    let game = serde_json::from_reader::<_, StochasticGame>(std::io::BufReader::new(file))?;
    log::info!(
        "loaded {} states, {} players, dimension {}",
        game.states(),
        game.players(),
        game.layout().dim()
    );
    let equilibrium = match args.method {
        Method::Qre => run(QRE::new(game), &args)?,
        Method::Tracing => {
            let tracing = LogTracing::new(game).with_eta(args.eta)?;
            let tracing = match args.prior_seed {
                Some(seed) => tracing.random_prior(seed)?,
                None => tracing,
            };
            run(tracing, &args)?
        }
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&equilibrium.report())?);
    } else {
        println!("{}", equilibrium);
    }
    Ok(())
}

fn run<H: Homotopy>(homotopy: H, args: &Args) -> anyhow::Result<Equilibrium> {
    let mut tracker = homotopy.tracker();
    if args.robust {
        *tracker.settings_mut() = Settings {
            target: tracker.settings().target,
            ..Settings::robust()
        };
    }
    if let Some(ref resume) = args.resume {
        tracker.load_file(resume)?;
        log::info!("resumed at step {} (t = {:.6})", tracker.step_count(), tracker.t());
    }
    let settings = tracker.settings_mut();
    settings.verbose = args.verbose;
    if let Some(target) = args.target {
        settings.target = target;
    }
    if let Some(ds_max) = args.ds_max {
        settings.ds_max = ds_max;
    }
    if let Some(max_steps) = args.max_steps {
        settings.max_steps = max_steps;
    }
    if let Some(tolerance) = args.corrector_tolerance {
        settings.corrector_tolerance = tolerance;
    }
    if args.reverse {
        tracker.flip();
    }
    if args.path {
        tracker.start_storing_path(args.path_capacity);
    }
    let result = tracker.solve();
    if let Some(ref save) = args.save {
        tracker.save_file(save)?;
        log::info!("saved tracker state to {}", save.display());
    }
    for record in tracker.path() {
        log::debug!("path {:>6} | s = {:>10.4} | t = {:>10.6} | ds = {:.2e}", record.step, record.s, record.t, record.ds);
    }
    Ok(result?)
}
