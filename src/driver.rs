//! A full run: build the graph, check shared preconditions on every rank,
//! square to convergence and report.

use std::fmt;
use std::fs::File;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::comm::{agree, Communicator, LocalComm};
use crate::config::{check_nodes, Backend, Config, GraphSource};
use crate::error::{ApspError, Result};
use crate::graph::gen_graph;
use crate::matrix::DistanceMatrix;
use crate::verify::{compare, fletcher16, reference_shortest_paths};
use crate::worker::Worker;

/// Rank that writes files and reports.
pub const ROOT: usize = 0;

/// Summary printed by the root rank after a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub ranks: usize,
    pub n: usize,
    pub p: f64,
    pub elapsed: Duration,
    pub checksum: u16,
    pub rounds: usize,
    pub distances: DistanceMatrix,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== MPI with {} threads", self.ranks)?;
        writeln!(f, "n:     {}", self.n)?;
        writeln!(f, "p:     {}", general(self.p))?;
        writeln!(f, "Time:  {}", general(self.elapsed.as_secs_f64()))?;
        writeln!(f, "Check: {:X}", self.checksum)
    }
}

/// Six significant digits, switching to exponent form for very small or
/// large magnitudes, the way C's `%g` prints.
fn general(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    // the exponent after rounding decides the notation
    let sci = format!("{:.5e}", value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (5 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn build_graph(source: &GraphSource) -> Result<DistanceMatrix> {
    match source {
        GraphSource::Random { n, p, seed } => Ok(gen_graph(*n, *p, *seed)),
        GraphSource::File(path) => {
            let adjacency = DistanceMatrix::load_from_file(path)?;
            check_nodes(adjacency.n)?;
            adjacency.check_adjacency()?;
            Ok(adjacency)
        }
    }
}

/// Root-only file work that must succeed before anyone starts squaring:
/// dump the adjacency matrix and make sure the result file can be created.
fn prepare_outputs(config: &Config, adjacency: &DistanceMatrix) -> Result<()> {
    if let Some(path) = &config.adjacency_out {
        adjacency.write_to_file(path)?;
        info!(path = %path.display(), "wrote adjacency matrix");
    }
    if let Some(path) = &config.distances_out {
        File::create(path).map_err(|e| ApspError::io(path, e))?;
    }
    Ok(())
}

/// Run the whole computation as one rank of `comm`.
///
/// Every rank of the group must call this with the same configuration. The
/// root rank returns the report, the others return `None`. A failed
/// precondition on any rank fails the run on every rank before the first
/// squaring round.
pub fn run<C: Communicator + ?Sized>(config: &Config, comm: &C) -> Result<Option<RunReport>> {
    let rank = comm.rank();
    if let Err(e) = config.grid.check_size(comm.size()) {
        warn!(rank, error = %e, "aborting before computation");
        return Err(e);
    }

    let adjacency = agree(comm, build_graph(&config.source))?;
    let n = adjacency.n;
    let worker = agree(comm, Worker::new(comm, config.grid, n))?;

    let outputs = if rank == ROOT {
        prepare_outputs(config, &adjacency)
    } else {
        Ok(())
    };
    agree(comm, outputs)?;

    info!(rank, n, ranks = comm.size(), "graph ready");

    comm.barrier()?;
    let start = Instant::now();
    let mut distances = adjacency.clone();
    let convergence = worker.shortest_paths(&mut distances)?;
    let elapsed = start.elapsed();

    if rank != ROOT {
        return Ok(None);
    }

    if config.verify {
        compare(&reference_shortest_paths(&adjacency), &distances)?;
        info!("result matches sequential reference");
    }
    if let Some(path) = &config.distances_out {
        distances.write_to_file(path)?;
        info!(path = %path.display(), "wrote distance matrix");
    }

    Ok(Some(RunReport {
        ranks: comm.size(),
        n,
        p: config.probability(),
        elapsed,
        checksum: fletcher16(&distances.data),
        rounds: convergence.rounds,
        distances,
    }))
}

/// Run with every rank as a thread of this process.
///
/// When ranks fail, the first error that is not merely a peer's reaction to
/// another rank's failure is returned.
pub fn run_local(config: &Config) -> Result<Option<RunReport>> {
    let ranks = match config.backend {
        Backend::Local { ranks } => ranks,
        Backend::Mpi => {
            return Err(ApspError::InvalidConfig(
                "configuration asks for MPI ranks".to_string(),
            ))
        }
    };

    let outcomes = LocalComm::run_group(ranks, |comm| run(config, &comm))?;

    let mut report = None;
    let mut fallout = None;
    for outcome in outcomes {
        match outcome {
            Ok(Some(r)) => report = Some(r),
            Ok(None) => {}
            // a rank's reaction to another rank going away
            Err(e @ (ApspError::PeerFailed | ApspError::Communication(_))) => {
                if !matches!(fallout, Some(ApspError::Communication(_))) {
                    fallout = Some(e);
                }
            }
            Err(e) => return Err(e),
        }
    }
    match fallout {
        Some(e) => Err(e),
        None => Ok(report),
    }
}
