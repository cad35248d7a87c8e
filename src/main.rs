use std::process::ExitCode;

use clap::Parser;
use distributed_shortest_paths::config::{Backend, Cli, Config};
use distributed_shortest_paths::driver::{self, RunReport};
use distributed_shortest_paths::error::{ApspError, Result};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "mpi")]
fn run_mpi(config: &Config) -> Result<Option<RunReport>> {
    use distributed_shortest_paths::mpi_comm::MpiComm;

    let _universe = mpi::initialize()
        .ok_or_else(|| ApspError::Communication("MPI was already initialized".to_string()))?;
    let comm = MpiComm::new();
    driver::run(config, &comm)
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_config: &Config) -> Result<Option<RunReport>> {
    Err(ApspError::InvalidConfig(
        "built without MPI support; rebuild with --features mpi".to_string(),
    ))
}

fn run(config: &Config) -> Result<Option<RunReport>> {
    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| ApspError::InvalidConfig(format!("could not size thread pool: {}", e)))?;
    }
    match config.backend {
        Backend::Local { .. } => driver::run_local(config),
        Backend::Mpi => run_mpi(config),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = Config::try_from(cli).and_then(|config| run(&config));

    match outcome {
        Ok(Some(report)) => {
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}
