pub mod comm;
pub mod config;
pub mod driver;
pub mod error;
pub mod graph;
pub mod kernel;
pub mod matrix;
#[cfg(feature = "mpi")]
pub mod mpi_comm;
pub mod partition;
pub mod verify;
pub mod worker;

pub use comm::{Communicator, LocalComm, SingleProcess};
pub use config::Config;
pub use driver::RunReport;
pub use error::{ApspError, Result};
pub use matrix::DistanceMatrix;
pub use partition::{compute_tile, partition, GridCoord, GridShape, Tile};
pub use worker::Worker;
