//! Errors surfaced by the flow model facade.

use rf_archive::ArchiveError;
use rf_core::RfError;
use rf_mesh::MeshError;
use rf_rom::RomError;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    /// A mesh or archive source the model cannot read.
    #[error("Input error: {what}")]
    Input { what: String },

    #[error("Failed to fetch {location}: {source}")]
    Fetch {
        location: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Rom(#[from] RomError),

    #[error(transparent)]
    Mesh(MeshError),

    #[error("Model not ready: {what}")]
    ModelNotReady { what: &'static str },

    #[error("Invalid request: {what}")]
    InvalidRequest { what: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid component kind: {0}")]
    InvalidComponent(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Point {point:?} is outside the mesh")]
    OutOfDomain { point: [f64; 3] },

    #[error("Field data of length {len} matches neither {n_cells} nor {} values", 3 * n_cells)]
    InvalidFieldData { len: usize, n_cells: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MeshError> for ModelError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::OutOfDomain { point } => ModelError::OutOfDomain { point },
            other => ModelError::Mesh(other),
        }
    }
}

impl From<RfError> for ModelError {
    fn from(err: RfError) -> Self {
        ModelError::InvalidRequest {
            what: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_domain_is_lifted_from_the_mesh_layer() {
        let err: ModelError = MeshError::OutOfDomain { point: [1.0, 2.0, 3.0] }.into();
        assert!(matches!(err, ModelError::OutOfDomain { point } if point == [1.0, 2.0, 3.0]));

        let err: ModelError = MeshError::UnknownField("T".into()).into();
        assert!(matches!(err, ModelError::Mesh(MeshError::UnknownField(_))));
    }

    #[test]
    fn field_data_message_lists_both_lengths() {
        let msg = ModelError::InvalidFieldData { len: 250, n_cells: 100 }.to_string();
        assert!(msg.contains("250") && msg.contains("100") && msg.contains("300"));
    }
}
