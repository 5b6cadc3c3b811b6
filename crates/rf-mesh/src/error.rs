//! Mesh and extraction errors.

use rf_core::RfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Malformed grid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Grid has no cells")]
    EmptyGrid,

    #[error("Cell {cell}: {what}")]
    InvalidCell { cell: usize, what: String },

    #[error("Cell {cell} references node {node}, grid has {n_points} points")]
    NodeOutOfRange {
        cell: usize,
        node: usize,
        n_points: usize,
    },

    #[error("Field '{name}' has {actual} values, expected {expected}")]
    FieldLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field '{name}' has unsupported shape: {what}")]
    FieldShape { name: String, what: String },

    #[error("Point ({}, {}, {}) lies outside the mesh", point[0], point[1], point[2])]
    OutOfDomain { point: [f64; 3] },

    #[error("Invalid argument: {what}")]
    InvalidArgument { what: String },

    #[error("VTK file: {0}")]
    Vtk(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value: {0}")]
    Core(#[from] RfError),
}

pub type MeshResult<T> = Result<T, MeshError>;
