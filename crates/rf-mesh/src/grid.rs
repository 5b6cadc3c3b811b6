//! Unstructured grid: points, linear cells, cell data.
//!
//! Grids are read from a JSON document:
//!
//! ```json
//! {
//!   "points": [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]],
//!   "cells": [{ "kind": "tetra", "nodes": [0, 1, 2, 3] }],
//!   "cell_data": [{ "name": "p", "components": 1, "values": [0.5] }]
//! }
//! ```
//!
//! or from a VTK XML `.vtu` file; [`UnstructuredGrid::from_slice`] tells the
//! two apart by their first byte.

use std::collections::HashMap;

use rf_core::{Vec3, vec3};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cell::{Cell, CellKind};
use crate::error::{MeshError, MeshResult};
use crate::field::FieldArray;
use crate::geometry::{Aabb, tet_volume};

/// Serialized form of a grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridDocument {
    pub points: Vec<[f64; 3]>,
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub cell_data: Vec<FieldArray>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub point_data: Vec<FieldArray>,
}

/// Validated grid with derived cell geometry.
#[derive(Clone, Debug)]
pub struct UnstructuredGrid {
    points: Vec<Vec3>,
    cells: Vec<Cell>,
    /// Mean of each cell's nodes.
    centers: Vec<Vec3>,
    volumes: Vec<f64>,
    cell_bounds: Vec<Aabb>,
    bounds: Aabb,
    /// Cells using each point.
    point_cells: Vec<Vec<usize>>,
    cell_data: Vec<FieldArray>,
}

impl UnstructuredGrid {
    pub fn from_json_slice(bytes: &[u8]) -> MeshResult<Self> {
        Self::from_document(serde_json::from_slice(bytes)?)
    }

    pub fn from_json_str(text: &str) -> MeshResult<Self> {
        Self::from_document(serde_json::from_str(text)?)
    }

    pub fn from_vtu_slice(bytes: &[u8]) -> MeshResult<Self> {
        Self::from_document(crate::vtk::read_vtu(bytes)?)
    }

    /// Load either format: XML starts with `<`, JSON does not.
    pub fn from_slice(bytes: &[u8]) -> MeshResult<Self> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match bytes.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(start) if bytes[start] == b'<' => Self::from_vtu_slice(&bytes[start..]),
            _ => Self::from_json_slice(bytes),
        }
    }

    pub fn from_document(doc: GridDocument) -> MeshResult<Self> {
        if doc.cells.is_empty() {
            return Err(MeshError::EmptyGrid);
        }
        let points: Vec<Vec3> = doc.points.iter().map(|&p| vec3(p)).collect();
        if let Some(i) = points.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(MeshError::InvalidArgument {
                what: format!("point {i} has non-finite coordinates"),
            });
        }

        let n_points = points.len();
        let mut point_cells = vec![Vec::new(); n_points];
        let mut centers = Vec::with_capacity(doc.cells.len());
        let mut volumes = Vec::with_capacity(doc.cells.len());
        let mut cell_bounds = Vec::with_capacity(doc.cells.len());

        for (i, cell) in doc.cells.iter().enumerate() {
            if cell.nodes.len() != cell.kind.n_nodes() {
                return Err(MeshError::InvalidCell {
                    cell: i,
                    what: format!(
                        "{:?} needs {} nodes, got {}",
                        cell.kind,
                        cell.kind.n_nodes(),
                        cell.nodes.len()
                    ),
                });
            }
            if let Some(&node) = cell.nodes.iter().find(|&&n| n >= n_points) {
                return Err(MeshError::NodeOutOfRange {
                    cell: i,
                    node,
                    n_points,
                });
            }
            for &n in &cell.nodes {
                if point_cells[n].last() != Some(&i) {
                    point_cells[n].push(i);
                }
            }

            let center = cell.nodes.iter().map(|&n| points[n]).sum::<Vec3>() / cell.nodes.len() as f64;
            let volume: f64 = cell
                .fan_triangles()
                .map(|[a, b, c]| tet_volume(&center, &points[a], &points[b], &points[c]).abs())
                .sum();
            if !(volume > 0.0) {
                return Err(MeshError::InvalidCell {
                    cell: i,
                    what: "zero volume".to_string(),
                });
            }
            centers.push(center);
            volumes.push(volume);
            cell_bounds.push(Aabb::around(cell.nodes.iter().map(|&n| &points[n])).ok_or_else(
                || MeshError::InvalidCell {
                    cell: i,
                    what: "no nodes".to_string(),
                },
            )?);
        }

        let n_cells = doc.cells.len();
        for field in &doc.cell_data {
            field.expect_tuples(n_cells)?;
        }
        let bounds = cell_bounds
            .iter()
            .skip(1)
            .fold(cell_bounds[0], |b, c| Aabb {
                min: b.min.inf(&c.min),
                max: b.max.sup(&c.max),
            });

        info!(points = n_points, cells = n_cells, "grid loaded");
        Ok(Self {
            points,
            cells: doc.cells,
            centers,
            volumes,
            cell_bounds,
            bounds,
            point_cells,
            cell_data: doc.cell_data,
        })
    }

    /// Regular hexahedral grid of `dims` cells spanning `[min, max]`.
    pub fn structured_box(dims: [usize; 3], min: [f64; 3], max: [f64; 3]) -> MeshResult<Self> {
        if dims.contains(&0) || (0..3).any(|i| !(max[i] > min[i])) {
            return Err(MeshError::InvalidArgument {
                what: format!("box {dims:?} over {min:?}..{max:?} is empty"),
            });
        }
        let [nx, ny, nz] = dims;
        let id = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);
        let coord = |axis: usize, i: usize| min[axis] + (max[axis] - min[axis]) * i as f64 / dims[axis] as f64;

        let mut points = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    points.push([coord(0, i), coord(1, j), coord(2, k)]);
                }
            }
        }
        let mut cells = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    cells.push(Cell::new(
                        CellKind::Hexahedron,
                        vec![
                            id(i, j, k),
                            id(i + 1, j, k),
                            id(i + 1, j + 1, k),
                            id(i, j + 1, k),
                            id(i, j, k + 1),
                            id(i + 1, j, k + 1),
                            id(i + 1, j + 1, k + 1),
                            id(i, j + 1, k + 1),
                        ],
                    ));
                }
            }
        }
        Self::from_document(GridDocument {
            points,
            cells,
            ..GridDocument::default()
        })
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn point(&self, i: usize) -> &Vec3 {
        &self.points[i]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn center(&self, cell: usize) -> &Vec3 {
        &self.centers[cell]
    }

    pub fn volume(&self, cell: usize) -> f64 {
        self.volumes[cell]
    }

    pub fn total_volume(&self) -> f64 {
        self.volumes.iter().sum()
    }

    /// Bounding-box diagonal of one cell.
    pub fn cell_length(&self, cell: usize) -> f64 {
        self.cell_bounds[cell].diagonal()
    }

    pub fn cell_bounds(&self, cell: usize) -> &Aabb {
        &self.cell_bounds[cell]
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn point_cells(&self, point: usize) -> &[usize] {
        &self.point_cells[point]
    }

    /// Cell data shipped with the grid document.
    pub fn cell_data(&self) -> &[FieldArray] {
        &self.cell_data
    }

    /// Cells sharing at least one point with `cell`, sorted, excluding `cell`.
    pub fn point_neighbors(&self, cell: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self.cells[cell]
            .nodes
            .iter()
            .flat_map(|&n| self.point_cells[n].iter().copied())
            .filter(|&c| c != cell)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Faces used by exactly one cell, as global node ids in cell orientation.
    pub fn boundary_faces(&self) -> Vec<Vec<usize>> {
        let mut seen: HashMap<Vec<usize>, (usize, Vec<usize>)> = HashMap::new();
        let mut order = Vec::new();
        for cell in &self.cells {
            for face in cell.faces() {
                let mut key = face.clone();
                key.sort_unstable();
                let entry = seen.entry(key.clone()).or_insert_with(|| {
                    order.push(key);
                    (0, face)
                });
                entry.0 += 1;
            }
        }
        order
            .into_iter()
            .filter_map(|key| match seen.remove(&key) {
                Some((1, face)) => Some(face),
                _ => None,
            })
            .collect()
    }

    /// Serialize with the given attached data.
    pub fn to_document(&self, cell_data: Vec<FieldArray>, point_data: Vec<FieldArray>) -> GridDocument {
        GridDocument {
            points: self.points.iter().map(|p| [p.x, p.y, p.z]).collect(),
            cells: self.cells.clone(),
            cell_data,
            point_data,
        }
    }
}
