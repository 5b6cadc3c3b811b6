//! rf-model: the flow model facade.
//!
//! A [`FlowModel`] owns one mesh and one evaluator (an assembled ROM or an
//! inference feed). Each [`Query`] replaces the field state; derived fields
//! ([`OperationSet`]) are recomputed with it. Extraction calls (`integrate`,
//! `probe`, `render`, components) read that state through `&self`.
//!
//! ```
//! use rf_archive::{Stabilization, fixtures::SyntheticRom};
//! use rf_mesh::UnstructuredGrid;
//! use rf_model::{ArchiveSource, FlowModel, MeshSource, ModelConfig, Phase, Query};
//!
//! let grid = UnstructuredGrid::structured_box([3, 2, 2], [0.0; 3], [3.0, 2.0, 2.0]).unwrap();
//! let mesh = serde_json::to_string(&grid.to_document(Vec::new(), Vec::new())).unwrap();
//! let archive = SyntheticRom::new(Stabilization::Ppe, grid.n_cells())
//!     .builder()
//!     .to_zip_bytes()
//!     .unwrap();
//!
//! let mut model = FlowModel::rom(ModelConfig::default());
//! model.load_mesh(MeshSource::Text(mesh)).unwrap();
//! model.load_model(ArchiveSource::Buffer(archive)).unwrap();
//! model.update(Query::Rom { viscosity: 0.1, velocity: [1.0, 0.0] }).unwrap();
//! assert_eq!(model.phase(), Phase::Ready);
//! assert_eq!(model.field().unwrap().components(), 3);
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod model;
pub mod operations;
pub mod source;
pub mod state;

pub use component::{ComponentSpec, SceneExport, VisualizationComponent};
pub use config::{ModelConfig, OnlineSolverConfig, StreamlineConfig};
pub use error::{ModelError, ModelResult};
pub use model::{Backend, FlowModel, IntegrationTarget, Phase, Query, shape_field};
pub use operations::{Operation, OperationSet};
pub use source::{ArchiveSource, FileFetcher, Fetcher, MeshSource};
pub use state::FieldState;

// Query-side types callers need alongside the model.
pub use rf_mesh::{ColorMode, Integral, IntegralSum, Rendered};
