//! Whitespace-delimited matrix text decoding.

use crate::error::{ArchiveError, ArchiveResult};
use crate::matrix::Matrix;

/// Parse one archive entry into a `Matrix`.
///
/// Rows are the non-blank lines of `text`; columns are whitespace-separated
/// tokens. Every token must be a finite number and every row must have as many
/// tokens as the first one. Nothing is coerced or defaulted: a bad token
/// (including `NaN` and `inf`), a short row or a long row is a `Parse` error
/// at the offending position.
pub fn parse_matrix(name: &str, text: &str) -> ArchiveResult<Matrix> {
    let mut values = Vec::new();
    let mut cols = None;
    let mut rows = 0;

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let mut count = 0;
        for (col, token) in line.split_whitespace().enumerate() {
            if cols.is_some_and(|n| col >= n) {
                return Err(parse_error(name, rows, col));
            }
            match token.parse::<f64>() {
                Ok(v) if v.is_finite() => values.push(v),
                _ => return Err(parse_error(name, rows, col)),
            }
            count += 1;
        }
        match cols {
            None => cols = Some(count),
            Some(n) if count < n => return Err(parse_error(name, rows, count)),
            Some(_) => {}
        }
        rows += 1;
    }

    let cols = cols.ok_or_else(|| ArchiveError::EmptyMatrix(name.to_string()))?;
    Matrix::from_row_major(rows, cols, &values).ok_or_else(|| ArchiveError::Shape {
        what: format!("{name}: {} values for {rows}x{cols}", values.len()),
    })
}

/// Decode raw entry bytes as UTF-8 and parse them.
pub fn parse_entry(name: &str, bytes: &[u8]) -> ArchiveResult<Matrix> {
    let text = std::str::from_utf8(bytes).map_err(|_| ArchiveError::Encoding(name.to_string()))?;
    parse_matrix(name, text)
}

fn parse_error(name: &str, row: usize, col: usize) -> ArchiveError {
    ArchiveError::Parse {
        name: name.to_string(),
        row,
        col,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_and_transposes() {
        let m = parse_matrix("B_mat.txt", "1 2 3\n4 5 6\n").unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(0, 2), Some(3.0));
        assert_eq!(m.get(1, 0), Some(4.0));
    }

    #[test]
    fn tolerates_blank_lines_and_repeated_spaces() {
        let m = parse_matrix("par.txt", "\n  1.5e-5   2\n\n-3 +4.25\n   \n").unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.get(0, 0), Some(1.5e-5));
        assert_eq!(m.get(1, 1), Some(4.25));
    }

    #[test]
    fn non_numeric_token_reports_position() {
        let err = parse_matrix("K_mat.txt", "1 2\n3 abc\n").unwrap_err();
        match err {
            ArchiveError::Parse { name, row, col } => {
                assert_eq!(name, "K_mat.txt");
                assert_eq!((row, col), (1, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_words_are_not_numbers() {
        for (text, col) in [("1 NaN\n", 1), ("inf 2\n", 0), ("3 4 -infinity\n", 2), ("nan\n", 0)] {
            let err = parse_matrix("K_mat.txt", text).unwrap_err();
            assert!(
                matches!(err, ArchiveError::Parse { row: 0, col: c, .. } if c == col),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn short_row_is_a_parse_error_not_a_default() {
        let err = parse_matrix("K_mat.txt", "1 2 3\n4 5\n").unwrap_err();
        assert!(matches!(err, ArchiveError::Parse { row: 1, col: 2, .. }));
    }

    #[test]
    fn long_row_is_a_parse_error() {
        let err = parse_matrix("K_mat.txt", "1 2\n3 4 5\n").unwrap_err();
        assert!(matches!(err, ArchiveError::Parse { row: 1, col: 2, .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(
            parse_matrix("bt_mat.txt", "\n \n"),
            Err(ArchiveError::EmptyMatrix(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(
            parse_entry("bt_mat.txt", &[0xff, 0xfe, 0x20]),
            Err(ArchiveError::Encoding(_))
        ));
    }

    proptest! {
        #[test]
        fn shape_follows_line_and_token_counts(rows in 1usize..8, cols in 1usize..8, seed in 0u32..1000) {
            let mut text = String::new();
            for r in 0..rows {
                let line: Vec<String> = (0..cols)
                    .map(|c| format!("{}", (seed as usize + r * 31 + c * 7) as f64 * 0.25))
                    .collect();
                text.push_str(&line.join(" "));
                text.push('\n');
            }
            let m = parse_matrix("x.txt", &text).unwrap();
            prop_assert_eq!(m.shape(), (rows, cols));
            prop_assert_eq!(m.get(rows - 1, 0).unwrap(), (seed as usize + (rows - 1) * 31) as f64 * 0.25);
        }
    }
}
