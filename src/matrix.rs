use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{ApspError, Result};

/// Square matrix of hop counts, stored column-major.
///
/// Cell `(row, col)` lives at `data[col * n + row]`, so every column is a
/// contiguous slice. All index arithmetic in the crate relies on this layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    pub data: Vec<u32>,
    pub n: usize,
}

impl DistanceMatrix {
    /// Create an `n x n` matrix of zeros (no edges).
    pub fn new(n: usize) -> Self {
        DistanceMatrix {
            data: vec![0; n * n],
            n,
        }
    }

    /// Wrap column-major data of an `n x n` matrix.
    pub fn from_vec(data: Vec<u32>, n: usize) -> Result<Self> {
        if data.len() != n * n {
            return Err(ApspError::DimensionMismatch {
                expected: n * n,
                found: data.len(),
            });
        }
        Ok(DistanceMatrix { data, n })
    }

    /// Build a matrix from rows as they would be written on paper:
    /// `rows[i][j]` is the entry in row `i`, column `j`.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self> {
        let n = rows.len();
        let mut matrix = DistanceMatrix::new(n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(ApspError::DimensionMismatch {
                    expected: n,
                    found: row.len(),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                matrix.data[j * n + i] = value;
            }
        }
        Ok(matrix)
    }

    /// Value standing in for "no path known": one more than the longest
    /// possible shortest path in an unweighted graph on `n` nodes.
    pub fn infinity(&self) -> u32 {
        self.n as u32 + 1
    }

    #[inline]
    pub(crate) fn index(&self, row: usize, col: usize) -> usize {
        col * self.n + row
    }

    /// Get a value at a specific position
    pub fn get(&self, row: usize, col: usize) -> Result<u32> {
        if row >= self.n || col >= self.n {
            return Err(ApspError::OutOfBounds { row, col, n: self.n });
        }
        Ok(self.data[self.index(row, col)])
    }

    /// Set a value at a specific position
    pub fn set(&mut self, row: usize, col: usize, value: u32) -> Result<()> {
        if row >= self.n || col >= self.n {
            return Err(ApspError::OutOfBounds { row, col, n: self.n });
        }
        let idx = self.index(row, col);
        self.data[idx] = value;
        Ok(())
    }

    /// Switch from the zero-for-no-edge convention to the
    /// infinity-for-no-edge convention. Self distances are reset to zero.
    pub fn infinitize(&mut self) {
        let inf = self.infinity();
        for value in self.data.iter_mut().filter(|v| **v == 0) {
            *value = inf;
        }
        for i in 0..self.n {
            let idx = self.index(i, i);
            self.data[idx] = 0;
        }
    }

    /// Switch back to zero-for-no-path. Only valid once the distances have
    /// converged.
    pub fn deinfinitize(&mut self) {
        let inf = self.infinity();
        for value in self.data.iter_mut().filter(|v| **v == inf) {
            *value = 0;
        }
    }

    /// Check that every entry is 0 (no edge) or 1 (edge).
    ///
    /// Errors name the offending entry as it appears in the text format,
    /// 1-based line and column.
    pub fn check_adjacency(&self) -> Result<()> {
        for (j, column) in self.data.chunks(self.n.max(1)).enumerate() {
            if let Some((i, &value)) = column.iter().enumerate().find(|(_, v)| **v > 1) {
                return Err(ApspError::Parse {
                    line: i + 1,
                    message: format!(
                        "entry {} in column {} is not an adjacency value (0 or 1)",
                        value,
                        j + 1
                    ),
                });
            }
        }
        Ok(())
    }

    /// Load a matrix from a text file.
    /// Format: `n` lines of `n` whitespace-separated integers, line `i`
    /// holding row `i`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ApspError::io(path, e))?;
        let reader = BufReader::new(file);
        let mut rows: Vec<Vec<u32>> = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ApspError::io(path, e))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let values = trimmed
                .split_whitespace()
                .map(|s| s.parse::<u32>())
                .collect::<std::result::Result<Vec<u32>, _>>()
                .map_err(|e| ApspError::Parse {
                    line: line_num + 1,
                    message: e.to_string(),
                })?;

            if let Some(first) = rows.first() {
                if first.len() != values.len() {
                    return Err(ApspError::Parse {
                        line: line_num + 1,
                        message: format!(
                            "inconsistent column count: expected {}, found {}",
                            first.len(),
                            values.len()
                        ),
                    });
                }
            }
            rows.push(values);
        }

        if rows.is_empty() {
            return Err(ApspError::Parse {
                line: 0,
                message: "matrix file is empty".to_string(),
            });
        }
        if rows[0].len() != rows.len() {
            return Err(ApspError::DimensionMismatch {
                expected: rows.len(),
                found: rows[0].len(),
            });
        }

        DistanceMatrix::from_rows(&rows)
    }

    /// Save the matrix as text, one matrix row per line.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ApspError::io(path, e))?;
        self.write_to(BufWriter::new(file))
            .map_err(|e| ApspError::io(path, e))
    }

    /// Write the text representation into any writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for i in 0..self.n {
            for j in 0..self.n {
                if j > 0 {
                    write!(writer, " ")?;
                }
                write!(writer, "{}", self.data[self.index(i, j)])?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major_layout() {
        let m = DistanceMatrix::from_rows(&[vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(m.data, vec![1, 3, 2, 4]);
        assert_eq!(m.get(0, 1).unwrap(), 2);
    }

    #[test]
    fn infinitize_keeps_diagonal_zero() {
        let mut m = DistanceMatrix::from_rows(&[vec![0, 1, 0], vec![0, 0, 1], vec![0, 0, 0]]).unwrap();
        m.infinitize();
        let inf = m.infinity();
        assert_eq!(inf, 4);
        assert_eq!(m.get(0, 1).unwrap(), 1);
        assert_eq!(m.get(0, 2).unwrap(), inf);
        assert_eq!(m.get(2, 0).unwrap(), inf);
        for i in 0..3 {
            assert_eq!(m.get(i, i).unwrap(), 0);
        }
    }

    #[test]
    fn deinfinitize_restores_zero_convention() {
        let original = DistanceMatrix::from_rows(&[vec![0, 1], vec![0, 0]]).unwrap();
        let mut m = original.clone();
        m.infinitize();
        m.deinfinitize();
        assert_eq!(m, original);
    }

    #[test]
    fn get_set_out_of_bounds() {
        let mut m = DistanceMatrix::new(2);
        assert!(m.get(2, 0).is_err());
        assert!(m.set(0, 2, 1).is_err());
    }

    #[test]
    fn adjacency_check_names_the_bad_entry() {
        let ok = DistanceMatrix::from_rows(&[vec![0, 1], vec![1, 0]]).unwrap();
        assert!(ok.check_adjacency().is_ok());

        let bad = DistanceMatrix::from_rows(&[vec![0, 1, 0], vec![0, 0, 3], vec![0, 0, 0]]).unwrap();
        match bad.check_adjacency() {
            Err(ApspError::Parse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("entry 3 in column 3"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn from_vec_invalid_size() {
        assert!(DistanceMatrix::from_vec(vec![0; 3], 2).is_err());
    }

    #[test]
    fn text_rows_follow_matrix_rows() {
        let m = DistanceMatrix::from_rows(&[vec![0, 1], vec![2, 0]]).unwrap();
        let mut out = Vec::new();
        m.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 1\n2 0\n");
    }
}
