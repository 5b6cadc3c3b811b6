//! Unstructured-grid geometry for romflow.
//!
//! The grid is read from a JSON document or a VTK `.vtu` file (`grid`,
//! `vtk`), carries named per-cell and per-point arrays (`field`), and
//! supports the filters the flow model exposes:
//! - least-squares cell gradients and vorticity (`gradient`)
//! - boundary surfaces and plane cuts (`extract`)
//! - streamlines and tubes (`streamlines`)
//! - volume, surface and line integrals (`integrate`)
//! - point probes (`probe`) backed by a voxel cell locator (`locate`)
//! - blue-to-red color mapping (`colormap`)

pub mod cell;
pub mod colormap;
pub mod error;
pub mod extract;
pub mod field;
pub mod geometry;
pub mod gradient;
pub mod grid;
pub mod integrate;
pub mod locate;
pub mod polydata;
pub mod probe;
pub mod streamlines;
pub mod vtk;

pub use cell::{Cell, CellKind};
pub use colormap::{ColorMode, LookupTable, Rendered, render};
pub use error::{MeshError, MeshResult};
pub use extract::{plane_cut, surface};
pub use field::{FieldArray, cell_to_point};
pub use gradient::{GRADIENTS, VORTICITY, cell_gradients, vorticity_from_gradients};
pub use grid::{GridDocument, UnstructuredGrid};
pub use integrate::{Integral, IntegralSum, integrate_grid, integrate_poly};
pub use locate::{CellLocator, Location};
pub use polydata::PolyData;
pub use probe::probe;
pub use streamlines::{StreamlineParams, sphere_seeds, trace, tubes};
pub use vtk::{read_vtu, write_vtp, write_vtu};
