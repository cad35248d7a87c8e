//! G(n, p) random graphs: every ordered pair `(i, j)` with `i != j` is an
//! edge independently with probability `p`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::matrix::DistanceMatrix;

/// Seed used when none is given, so that separate runs draw the same graph.
pub const DEFAULT_SEED: u64 = 10302011;

/// Draw a 0/1 adjacency matrix. Entries are sampled column by column, so the
/// result depends only on `n`, `p` and `seed`.
pub fn gen_graph(n: usize, p: f64, seed: u64) -> DistanceMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut adjacency = DistanceMatrix::new(n);
    for j in 0..n {
        let col = &mut adjacency.data[j * n..(j + 1) * n];
        for cell in col.iter_mut() {
            *cell = u32::from(rng.gen::<f64>() < p);
        }
        col[j] = 0;
    }
    adjacency
}
