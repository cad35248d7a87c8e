//! Result checks.
//!
//! The computation is pure integer arithmetic, so runs with the same graph
//! must agree bit for bit no matter how many ranks took part. A Fletcher-16
//! checksum over the final matrix is enough to tell runs apart quickly.

use crate::error::{ApspError, Result};
use crate::matrix::DistanceMatrix;

/// Fletcher-16 over the values in storage order.
pub fn fletcher16(data: &[u32]) -> u16 {
    let mut sum1: u32 = 0;
    let mut sum2: u32 = 0;
    for &value in data {
        sum1 = (sum1 + value % 255) % 255;
        sum2 = (sum2 + sum1) % 255;
    }
    ((sum2 << 8) | sum1) as u16
}

/// Sequential Floyd-Warshall on a 0/1 adjacency matrix, with the same output
/// convention as the distributed run: 0 on the diagonal and for pairs with
/// no path.
pub fn reference_shortest_paths(adjacency: &DistanceMatrix) -> DistanceMatrix {
    let n = adjacency.n;
    let mut dist = adjacency.clone();
    dist.infinitize();
    for k in 0..n {
        for j in 0..n {
            let dkj = dist.data[j * n + k];
            for i in 0..n {
                let via = dist.data[k * n + i] + dkj;
                if via < dist.data[j * n + i] {
                    dist.data[j * n + i] = via;
                }
            }
        }
    }
    dist.deinfinitize();
    dist
}

/// Compare two distance matrices cell by cell, reporting the first
/// difference in row-major order.
pub fn compare(expected: &DistanceMatrix, found: &DistanceMatrix) -> Result<()> {
    if expected.n != found.n {
        return Err(ApspError::DimensionMismatch {
            expected: expected.n,
            found: found.n,
        });
    }
    let n = expected.n;
    for row in 0..n {
        for col in 0..n {
            let e = expected.data[col * n + row];
            let f = found.data[col * n + row];
            if e != f {
                return Err(ApspError::VerificationFailed {
                    row,
                    col,
                    expected: e,
                    found: f,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fletcher16_known_values() {
        // "abcde" and "abcdef" from the usual Fletcher-16 test vectors
        let abcde: Vec<u32> = b"abcde".iter().map(|&b| u32::from(b)).collect();
        assert_eq!(fletcher16(&abcde), 0xC8F0);
        let abcdef: Vec<u32> = b"abcdef".iter().map(|&b| u32::from(b)).collect();
        assert_eq!(fletcher16(&abcdef), 0x2057);
    }

    #[test]
    fn fletcher16_empty() {
        assert_eq!(fletcher16(&[]), 0);
    }

    #[test]
    fn fletcher16_is_order_sensitive() {
        assert_ne!(fletcher16(&[1, 2, 3]), fletcher16(&[3, 2, 1]));
    }

    #[test]
    fn reference_on_directed_chain() {
        let adjacency =
            DistanceMatrix::from_rows(&[vec![0, 1, 0], vec![0, 0, 1], vec![0, 0, 0]]).unwrap();
        let dist = reference_shortest_paths(&adjacency);
        let expected =
            DistanceMatrix::from_rows(&[vec![0, 1, 2], vec![0, 0, 1], vec![0, 0, 0]]).unwrap();
        assert_eq!(dist, expected);
    }

    #[test]
    fn compare_reports_first_difference() {
        let a = DistanceMatrix::from_rows(&[vec![0, 1], vec![2, 0]]).unwrap();
        let mut b = a.clone();
        b.set(1, 0, 5).unwrap();
        match compare(&a, &b) {
            Err(ApspError::VerificationFailed {
                row,
                col,
                expected,
                found,
            }) => assert_eq!((row, col, expected, found), (1, 0, 2, 5)),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(compare(&a, &a).is_ok());
    }
}
