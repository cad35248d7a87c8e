//! Command line flags and the validated run configuration built from them.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{ApspError, Result};
use crate::graph::DEFAULT_SEED;
use crate::partition::GridShape;

/// Largest supported node count. Keeps `n * n` cells addressable and
/// `2 * (n + 1)` far from `u32` overflow.
pub const MAX_NODES: usize = 46_340;

/// path-mpi -- Parallel all-pairs shortest path on a random graph
#[derive(Debug, Parser)]
#[command(name = "path-mpi", version, about, long_about = None)]
pub struct Cli {
    /// Number of nodes
    #[arg(short = 'n', default_value_t = 200)]
    pub nodes: usize,

    /// Probability of including edges
    #[arg(short = 'p', default_value_t = 0.05)]
    pub probability: f64,

    /// File name where the adjacency matrix should be stored
    #[arg(short = 'i')]
    pub adjacency_out: Option<PathBuf>,

    /// File name where the output matrix should be stored
    #[arg(short = 'o')]
    pub distances_out: Option<PathBuf>,

    /// Number of ranks in the row direction
    #[arg(short = 'x')]
    pub x: usize,

    /// Number of ranks in the column direction
    #[arg(short = 'y')]
    pub y: usize,

    /// Number of ranks to start as threads (defaults to x*y)
    #[arg(long)]
    pub np: Option<usize>,

    /// Seed for the random graph
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Read the adjacency matrix from this file instead of generating one
    #[arg(long, conflicts_with = "nodes")]
    pub input: Option<PathBuf>,

    /// Worker threads per rank for the squaring kernel
    #[arg(long)]
    pub threads: Option<usize>,

    /// Check the result against a sequential Floyd-Warshall run
    #[arg(long)]
    pub verify: bool,

    /// Run each rank as an MPI process (requires the `mpi` feature)
    #[arg(long)]
    pub mpi: bool,
}

/// How ranks are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Ranks are threads of this process.
    Local { ranks: usize },
    /// Ranks are the processes of the MPI world communicator.
    Mpi,
}

/// Where the adjacency matrix comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphSource {
    Random { n: usize, p: f64, seed: u64 },
    File(PathBuf),
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: GraphSource,
    pub grid: GridShape,
    pub backend: Backend,
    pub adjacency_out: Option<PathBuf>,
    pub distances_out: Option<PathBuf>,
    pub threads: Option<usize>,
    pub verify: bool,
}

impl Config {
    /// Random graph run on a local rank group of exactly the grid's size.
    pub fn random(n: usize, p: f64, grid: GridShape) -> Result<Self> {
        check_nodes(n)?;
        check_probability(p)?;
        Ok(Config {
            source: GraphSource::Random {
                n,
                p,
                seed: DEFAULT_SEED,
            },
            grid,
            backend: Backend::Local { ranks: grid.size() },
            adjacency_out: None,
            distances_out: None,
            threads: None,
            verify: false,
        })
    }

    /// Edge probability for the report. Zero for graphs read from a file.
    pub fn probability(&self) -> f64 {
        match self.source {
            GraphSource::Random { p, .. } => p,
            GraphSource::File(_) => 0.0,
        }
    }
}

pub(crate) fn check_nodes(n: usize) -> Result<()> {
    if n == 0 || n > MAX_NODES {
        return Err(ApspError::InvalidConfig(format!(
            "node count must be in 1..={}, got {}",
            MAX_NODES, n
        )));
    }
    Ok(())
}

fn check_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ApspError::InvalidConfig(format!(
            "edge probability must be in [0, 1], got {}",
            p
        )));
    }
    Ok(())
}

impl TryFrom<Cli> for Config {
    type Error = ApspError;

    fn try_from(cli: Cli) -> Result<Self> {
        let grid = GridShape::new(cli.x, cli.y)?;

        let source = match cli.input {
            Some(path) => GraphSource::File(path),
            None => {
                check_nodes(cli.nodes)?;
                check_probability(cli.probability)?;
                GraphSource::Random {
                    n: cli.nodes,
                    p: cli.probability,
                    seed: cli.seed,
                }
            }
        };

        let backend = if cli.mpi {
            if cli.np.is_some() {
                return Err(ApspError::InvalidConfig(
                    "--np only applies to thread ranks; use mpirun -n with --mpi".to_string(),
                ));
            }
            Backend::Mpi
        } else {
            Backend::Local {
                ranks: cli.np.unwrap_or_else(|| grid.size()),
            }
        };

        if cli.threads == Some(0) {
            return Err(ApspError::InvalidConfig(
                "--threads must be positive".to_string(),
            ));
        }

        Ok(Config {
            source,
            grid,
            backend,
            adjacency_out: cli.adjacency_out,
            distances_out: cli.distances_out,
            threads: cli.threads,
            verify: cli.verify,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        let cli = Cli::try_parse_from(std::iter::once("path-mpi").chain(args.iter().copied()))
            .map_err(|e| ApspError::InvalidConfig(e.to_string()))?;
        Config::try_from(cli)
    }

    #[test]
    fn defaults_follow_the_classic_driver() {
        let config = parse(&["-x", "2", "-y", "3"]).unwrap();
        assert_eq!(
            config.source,
            GraphSource::Random {
                n: 200,
                p: 0.05,
                seed: DEFAULT_SEED
            }
        );
        assert_eq!(config.backend, Backend::Local { ranks: 6 });
        assert_eq!(config.grid, GridShape::new(2, 3).unwrap());
        assert!(config.adjacency_out.is_none());
        assert!(!config.verify);
    }

    #[test]
    fn grid_is_required() {
        assert!(parse(&["-n", "10"]).is_err());
        assert!(parse(&["-x", "2"]).is_err());
    }

    #[test]
    fn zero_grid_dimension_is_rejected() {
        assert!(matches!(
            parse(&["-x", "0", "-y", "2"]),
            Err(ApspError::InvalidGrid(_))
        ));
    }

    #[test]
    fn out_of_range_parameters() {
        assert!(parse(&["-x", "1", "-y", "1", "-p", "1.5"]).is_err());
        assert!(parse(&["-x", "1", "-y", "1", "-n", "0"]).is_err());
        assert!(parse(&["-x", "1", "-y", "1", "--threads", "0"]).is_err());
    }

    #[test]
    fn explicit_rank_count_is_kept_for_the_run_to_check() {
        let config = parse(&["-x", "2", "-y", "2", "--np", "3"]).unwrap();
        assert_eq!(config.backend, Backend::Local { ranks: 3 });
    }

    #[test]
    fn file_input_and_outputs() {
        let config = parse(&[
            "-x", "1", "-y", "1", "--input", "adj.txt", "-i", "a.txt", "-o", "d.txt", "--verify",
        ])
        .unwrap();
        assert_eq!(config.source, GraphSource::File(PathBuf::from("adj.txt")));
        assert_eq!(config.adjacency_out, Some(PathBuf::from("a.txt")));
        assert_eq!(config.distances_out, Some(PathBuf::from("d.txt")));
        assert!(config.verify);
        assert_eq!(config.probability(), 0.0);
    }
}
