//! Archive decoding and resolution errors.

use thiserror::Error;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised while reading, parsing or resolving a model archive.
///
/// All of these abort a model load before the numeric engine is touched.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The byte buffer is not a readable ZIP archive.
    #[error("Archive is not a readable ZIP bundle: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error while decompressing {name}: {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },

    /// A file the load plan requires is absent from the archive.
    #[error("Missing matrix file: {0}")]
    MissingMatrix(String),

    /// One or more of the mandatory matrices is absent.
    #[error("Incomplete archive, missing mandatory files: {}", missing.join(", "))]
    IncompleteArchive { missing: Vec<String> },

    /// A token could not be read as a number, or a row has the wrong length.
    #[error("Parse error in {name} at row {row}, column {col}")]
    Parse {
        name: String,
        row: usize,
        col: usize,
    },

    #[error("Matrix file {0} contains no rows")]
    EmptyMatrix(String),

    #[error("Matrix file {0} is not valid UTF-8 text")]
    Encoding(String),

    #[error("Matrix shape mismatch: {what}")]
    Shape { what: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ArchiveError::MissingMatrix("C3_mat.txt".into());
        assert!(err.to_string().contains("C3_mat.txt"));

        let err = ArchiveError::IncompleteArchive {
            missing: vec!["K_mat.txt".into(), "par.txt".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("K_mat.txt, par.txt"));

        let err = ArchiveError::Parse {
            name: "B_mat.txt".into(),
            row: 2,
            col: 1,
        };
        assert!(err.to_string().contains("row 2, column 1"));
    }
}
