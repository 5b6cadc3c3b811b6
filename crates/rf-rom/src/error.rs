//! Error types for assembly and online evaluation.

use rf_archive::ArchiveError;
use rf_core::RfError;
use thiserror::Error;

use crate::engine::AppendSequence;

/// Errors raised by the assembly protocol or a ROM engine.
///
/// Any of these during assembly leaves the engine unusable; the caller drops
/// it and starts over with a fresh instance.
#[derive(Error, Debug)]
pub enum RomError {
    /// A step ran before its prerequisites (e.g. a setter before `initialize`).
    #[error("Assembly protocol violated: {what}")]
    Protocol { what: String },

    /// An append landed at a different position than the loop index.
    #[error("{sequence} append out of sequence: expected position {expected}, engine reported {actual}")]
    AppendOutOfSequence {
        sequence: AppendSequence,
        expected: usize,
        actual: usize,
    },

    /// A sequence ended with the wrong number of registered matrices.
    #[error("{sequence} append count mismatch: expected {expected}, got {actual}")]
    AppendCount {
        sequence: AppendSequence,
        expected: usize,
        actual: usize,
    },

    #[error("Dimension mismatch: {what}")]
    Dimension { what: String },

    #[error("Online solve did not converge: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    /// The model was asked to reconstruct a field whose basis it does not have.
    #[error("Missing eigenmode basis for {what}")]
    MissingModes { what: &'static str },

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Invalid value: {0}")]
    Core(#[from] RfError),
}

pub type RomResult<T> = Result<T, RomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_sequence() {
        let err = RomError::AppendOutOfSequence {
            sequence: AppendSequence::Ct1,
            expected: 2,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Ct1"));
        assert!(msg.contains("expected position 2"));
    }
}
