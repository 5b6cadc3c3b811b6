//! rf-archive: packaged ROM model archives.
//!
//! Provides:
//! - `Matrix`, the immutable column-major matrix decoded from archive text
//! - the archive file-name convention (`MatrixFile`)
//! - a ZIP reader that decompresses only the entries it is asked for
//! - topology resolution (PPE vs supremizer, mode counts)
//! - the load plan that lists every matrix an assembly will consume
//! - synthetic, well-conditioned archives for demos and test suites
//!
//! # Example
//!
//! ```
//! use rf_archive::{ArchiveBuilder, Matrix, MatrixFile, open_model};
//!
//! let bytes = ArchiveBuilder::new()
//!     .matrix(MatrixFile::K, &Matrix::zeros(2, 1))
//!     .matrix(MatrixFile::B, &Matrix::zeros(2, 2))
//!     .matrix(MatrixFile::Bt, &Matrix::zeros(2, 2))
//!     .matrix(MatrixFile::CoeffL2, &Matrix::zeros(1, 3))
//!     .matrix(MatrixFile::Par, &Matrix::zeros(3, 1))
//!     .matrix(MatrixFile::P, &Matrix::zeros(1, 2))
//!     .matrix(MatrixFile::Weights(0), &Matrix::zeros(3, 1))
//!     .matrix(MatrixFile::C(0), &Matrix::zeros(2, 2))
//!     .matrix(MatrixFile::Ct1(0), &Matrix::zeros(1, 2))
//!     .matrix(MatrixFile::Ct2(0), &Matrix::zeros(1, 2))
//!     .matrix(MatrixFile::C(1), &Matrix::zeros(2, 2))
//!     .matrix(MatrixFile::Ct1(1), &Matrix::zeros(1, 2))
//!     .matrix(MatrixFile::Ct2(1), &Matrix::zeros(1, 2))
//!     .to_zip_bytes()
//!     .unwrap();
//!
//! let (topology, _archive) = open_model(bytes).unwrap();
//! assert_eq!(topology.n_phi_u, 2);
//! assert_eq!(topology.n_runs, 3);
//! ```

pub mod bundle;
pub mod error;
pub mod fixtures;
pub mod matrix;
pub mod names;
pub mod parse;
pub mod plan;
pub mod reader;
pub mod topology;

// Re-exports for ergonomics
pub use bundle::ArchiveBuilder;
pub use error::{ArchiveError, ArchiveResult};
pub use matrix::Matrix;
pub use names::MatrixFile;
pub use parse::parse_matrix;
pub use plan::{LoadPlan, ModelArchive, load_from_reader, open_model};
pub use reader::ArchiveReader;
pub use topology::{ModelTopology, N_BC, Stabilization, resolve_topology};
