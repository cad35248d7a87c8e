use distributed_shortest_paths::comm::LocalComm;
use distributed_shortest_paths::matrix::DistanceMatrix;
use distributed_shortest_paths::partition::GridShape;
use distributed_shortest_paths::worker::Worker;

/// Directed chain `0 -> 1 -> ... -> n-1`.
pub fn chain(n: usize) -> DistanceMatrix {
    let mut m = DistanceMatrix::new(n);
    for i in 0..n - 1 {
        m.set(i, i + 1, 1).unwrap();
    }
    m
}

/// Square `adjacency` to convergence on an `x` by `y` grid of thread ranks
/// and return every rank's final matrix with its round count.
pub fn solve_on_grid(adjacency: &DistanceMatrix, x: usize, y: usize) -> Vec<(DistanceMatrix, usize)> {
    let grid = GridShape::new(x, y).unwrap();
    LocalComm::run_group(grid.size(), |comm| {
        let worker = Worker::new(&comm, grid, adjacency.n).unwrap();
        let mut l = adjacency.clone();
        let conv = worker.shortest_paths(&mut l).unwrap();
        (l, conv.rounds)
    })
    .unwrap()
}

/// Solve on a grid and check that every rank ended with the same matrix.
pub fn solve_agreed(adjacency: &DistanceMatrix, x: usize, y: usize) -> DistanceMatrix {
    let results = solve_on_grid(adjacency, x, y);
    let (first, _) = &results[0];
    for (rank, (l, _)) in results.iter().enumerate() {
        assert_eq!(l, first, "rank {} disagrees with rank 0 on {}x{} grid", rank, x, y);
    }
    first.clone()
}
