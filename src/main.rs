//! Runs the truncated-digest experiment over every configured width.
//!
//! Trial records live in the results directory; rerunning picks up where the
//! previous run stopped.

use std::env;
use std::process::ExitCode;

use hash_attack::{
    summary_table, Experiment, ExperimentConfig, Invocation, JsonDirStore, RandomCandidates,
    USAGE,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn run(config: ExperimentConfig) -> hash_attack::Result<()> {
    info!(dir = %config.results_dir.display(), "loading previous results");
    let store = JsonDirStore::open(&config.results_dir)?;
    let source = match config.seed {
        Some(seed) => RandomCandidates::seeded(seed),
        None => RandomCandidates::from_entropy(),
    };
    let mut experiment = Experiment::open(config, store, source)?;
    experiment.run()?;
    print!("{}", summary_table(experiment.trials()));
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match ExperimentConfig::from_args(env::args().skip(1)) {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
