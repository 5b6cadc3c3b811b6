//! Named data arrays attached to cells or points.

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::grid::UnstructuredGrid;

/// A named array of fixed-width tuples, stored tuple by tuple
/// (`[x0, y0, z0, x1, y1, z1, ...]` for vectors).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldArray {
    pub name: String,
    pub components: usize,
    pub values: Vec<f64>,
}

impl FieldArray {
    pub fn new(name: impl Into<String>, components: usize, values: Vec<f64>) -> MeshResult<Self> {
        let name = name.into();
        if components == 0 || values.len() % components != 0 {
            return Err(MeshError::FieldShape {
                name,
                what: format!("{} values do not split into {components}-tuples", values.len()),
            });
        }
        Ok(Self {
            name,
            components,
            values,
        })
    }

    /// Build from component-blocked data (`[x0..xn, y0..yn, z0..zn]`).
    pub fn from_blocked(name: impl Into<String>, components: usize, blocked: &[f64]) -> MeshResult<Self> {
        let name = name.into();
        if components == 0 || blocked.len() % components != 0 {
            return Err(MeshError::FieldShape {
                name,
                what: format!("{} values do not split into {components} blocks", blocked.len()),
            });
        }
        let n = blocked.len() / components;
        let mut values = Vec::with_capacity(blocked.len());
        for i in 0..n {
            values.extend((0..components).map(|c| blocked[c * n + i]));
        }
        Ok(Self {
            name,
            components,
            values,
        })
    }

    pub fn n_tuples(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn tuple(&self, i: usize) -> &[f64] {
        &self.values[i * self.components..(i + 1) * self.components]
    }

    pub fn magnitude(&self, i: usize) -> f64 {
        self.tuple(i).iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Weighted sum of tuples.
    pub fn interpolate(&self, weights: &[(usize, f64)]) -> Vec<f64> {
        let mut out = vec![0.0; self.components];
        for &(i, w) in weights {
            for (o, v) in out.iter_mut().zip(self.tuple(i)) {
                *o += w * v;
            }
        }
        out
    }

    /// Fail unless the array holds exactly `n` tuples.
    pub fn expect_tuples(&self, n: usize) -> MeshResult<()> {
        if self.n_tuples() == n {
            Ok(())
        } else {
            Err(MeshError::FieldLength {
                name: self.name.clone(),
                expected: n * self.components,
                actual: self.values.len(),
            })
        }
    }
}

/// Average cell data onto the points: each point takes the mean of the
/// cells that use it. Points no cell uses get zeros.
pub fn cell_to_point(grid: &UnstructuredGrid, cell_field: &FieldArray) -> MeshResult<FieldArray> {
    cell_field.expect_tuples(grid.n_cells())?;
    let c = cell_field.components;
    let mut values = vec![0.0; grid.n_points() * c];
    for (p, out) in values.chunks_mut(c).enumerate() {
        let cells = grid.point_cells(p);
        if cells.is_empty() {
            continue;
        }
        let w = 1.0 / cells.len() as f64;
        for &cell in cells {
            for (o, v) in out.iter_mut().zip(cell_field.tuple(cell)) {
                *o += w * v;
            }
        }
    }
    FieldArray::new(cell_field.name.clone(), c, values)
}

/// Lookup by name.
pub fn find<'a>(fields: &'a [FieldArray], name: &str) -> MeshResult<&'a FieldArray> {
    fields
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| MeshError::UnknownField(name.to_string()))
}
