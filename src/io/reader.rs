//! Readers for annotation tables and per-item token files.

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use csv::{ReaderBuilder, Trim};

use crate::{
    Error, Result,
    matrix::{LabelAlphabet, LabelMatrix},
};

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::Io {
        operation: format!("open file {path:?}"),
        source,
    })
}

/// Read a comma-separated label table: one row per item, one column per
/// annotator, empty cells for missing annotations.
///
/// # Errors
///
/// Fails on I/O or CSV errors and on any malformed-input condition of
/// [`LabelMatrix::from_tokens`].
pub fn read_label_matrix(path: &Path, has_headers: bool) -> Result<(LabelMatrix, LabelAlphabet)> {
    parse_label_matrix(open(path)?, has_headers)
}

/// Parse a label table from any reader.
///
/// Rows of different widths are reported as [`Error::RaggedRow`] rather than
/// as a CSV error.
///
/// # Examples
///
/// ```
/// use mace::io::parse_label_matrix;
///
/// let data = "yes,,no\nno,no,\n";
/// let (matrix, alphabet) = parse_label_matrix(data.as_bytes(), false).unwrap();
/// assert_eq!(matrix.num_instances(), 2);
/// assert_eq!(matrix.num_annotators(), 3);
/// assert_eq!(alphabet.tokens(), ["no", "yes"]);
/// ```
pub fn parse_label_matrix<R: Read>(
    reader: R,
    has_headers: bool,
) -> Result<(LabelMatrix, LabelAlphabet)> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    LabelMatrix::from_tokens(&rows)
}

/// Read a file with one token per line (controls, gold labels, predictions).
/// Blank lines are kept as empty tokens so line numbers stay aligned with
/// item indices.
pub fn read_token_lines(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(open(path)?);
    reader
        .lines()
        .map(|line| {
            line.map(|l| l.trim().to_string())
                .map_err(|source| Error::Io {
                    operation: format!("read line from {path:?}"),
                    source,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn missing_cells_are_skipped() {
        let (matrix, alphabet) = parse_label_matrix("a,,b\n,b,\n".as_bytes(), false).unwrap();
        assert_eq!(matrix.num_annotations(), 3);
        assert_eq!(matrix.label(1, 0), None);
        assert_eq!(matrix.label(1, 1), alphabet.index_of("b"));
    }

    #[test]
    fn header_row_is_ignored_when_requested() {
        let data = "w1,w2\nx,y\ny,y\n";
        let (matrix, alphabet) = parse_label_matrix(data.as_bytes(), true).unwrap();
        assert_eq!(matrix.num_instances(), 2);
        assert_eq!(alphabet.len(), 2);
        assert_eq!(alphabet.index_of("w1"), None);
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let err = parse_label_matrix("a,b\na\n".as_bytes(), false).unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedRow {
                item: 1,
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn blank_items_are_malformed() {
        let err = parse_label_matrix("a,b\n , \n".as_bytes(), false).unwrap_err();
        assert!(matches!(err, Error::EmptyItem { item: 1 }));
    }

    #[test]
    fn token_lines_keep_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a\n\n b \n").unwrap();
        let lines = read_token_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_label_matrix(Path::new("/definitely/not/here.csv"), false).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("here.csv"));
    }
}
