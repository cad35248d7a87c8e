// File format tests for DistanceMatrix

use distributed_shortest_paths::error::ApspError;
use distributed_shortest_paths::matrix::DistanceMatrix;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_matrix_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("distances.txt");

    let original =
        DistanceMatrix::from_rows(&[vec![0, 1, 2], vec![3, 0, 1], vec![2, 3, 0]]).unwrap();
    original.write_to_file(&file_path).unwrap();

    let loaded = DistanceMatrix::load_from_file(&file_path).unwrap();
    assert_eq!(original, loaded);
}

#[test]
fn test_file_lines_are_matrix_rows() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("rows.txt");

    // column-major storage: (0, 1) = 7 lives at data[1 * 2 + 0]
    let m = DistanceMatrix::from_vec(vec![0, 5, 7, 0], 2).unwrap();
    m.write_to_file(&file_path).unwrap();

    let text = fs::read_to_string(&file_path).unwrap();
    assert_eq!(text, "0 7\n5 0\n");
}

#[test]
fn test_load_with_irregular_whitespace() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "0  1\t0").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "0 0   1 ").unwrap();
    writeln!(file, "1 0 0").unwrap();
    file.flush().unwrap();

    let m = DistanceMatrix::load_from_file(file.path()).unwrap();
    assert_eq!(m.n, 3);
    assert_eq!(m.get(0, 1).unwrap(), 1);
    assert_eq!(m.get(1, 2).unwrap(), 1);
    assert_eq!(m.get(2, 0).unwrap(), 1);
}

#[test]
fn test_load_empty_file() {
    let file = NamedTempFile::new().unwrap();
    assert!(matches!(
        DistanceMatrix::load_from_file(file.path()),
        Err(ApspError::Parse { .. })
    ));
}

#[test]
fn test_load_inconsistent_columns() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "0 1 0").unwrap();
    writeln!(file, "1 0").unwrap();
    file.flush().unwrap();

    match DistanceMatrix::load_from_file(file.path()) {
        Err(ApspError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_load_non_square() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "0 1 0").unwrap();
    writeln!(file, "1 0 0").unwrap();
    file.flush().unwrap();

    assert!(matches!(
        DistanceMatrix::load_from_file(file.path()),
        Err(ApspError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_load_rejects_non_integers() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "0 1.5").unwrap();
    writeln!(file, "-1 0").unwrap();
    file.flush().unwrap();

    assert!(DistanceMatrix::load_from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nonexistent.txt");

    match DistanceMatrix::load_from_file(&missing) {
        Err(e @ ApspError::Io { .. }) => {
            assert!(e.to_string().contains("nonexistent.txt"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_write_into_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let bad = temp_dir.path().join("no_such_dir").join("out.txt");
    let m = DistanceMatrix::new(2);
    assert!(matches!(m.write_to_file(&bad), Err(ApspError::Io { .. })));
}

#[test]
fn test_loaded_weights_fail_adjacency_check() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "0 1 0").unwrap();
    writeln!(file, "0 0 1").unwrap();
    writeln!(file, "2 0 0").unwrap();
    file.flush().unwrap();

    let matrix = DistanceMatrix::load_from_file(file.path()).unwrap();
    match matrix.check_adjacency() {
        Err(ApspError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("unexpected result: {:?}", other),
    }
}
