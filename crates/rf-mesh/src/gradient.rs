//! Least-squares cell gradients and vorticity.
//!
//! For cell `i` with neighbors `j` (cells sharing a point), the gradient
//! minimizes `Σ w_ij (φ_j − φ_i − ∇φ_i · r_ij)²` with `w_ij = 1/|r_ij|²`.
//! The 3x3 normal equations are solved by pseudo-inverse, so directions the
//! neighborhood does not span (e.g. a one-cell-thick layer) get a zero
//! derivative instead of failing.

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

use crate::error::{MeshError, MeshResult};
use crate::field::FieldArray;
use crate::grid::UnstructuredGrid;

pub const GRADIENTS: &str = "gradients";
pub const VORTICITY: &str = "vorticity";

/// Singular values below this fraction of the largest are dropped.
const RANK_TOLERANCE: f64 = 1e-10;

/// Cell gradients of a cell field.
///
/// The result has `3 * components` components per cell, ordered
/// `[∂φ0/∂x, ∂φ0/∂y, ∂φ0/∂z, ∂φ1/∂x, ...]`.
pub fn cell_gradients(grid: &UnstructuredGrid, field: &FieldArray) -> MeshResult<FieldArray> {
    field.expect_tuples(grid.n_cells())?;
    let c = field.components;

    let per_cell: Vec<Vec<f64>> = (0..grid.n_cells())
        .into_par_iter()
        .map(|cell| {
            let neighbors = grid.point_neighbors(cell);
            let xi = grid.center(cell);
            let mut a = Matrix3::<f64>::zeros();
            let mut rhs = vec![Vector3::<f64>::zeros(); c];
            for &n in &neighbors {
                let d = grid.center(n) - xi;
                let dist2 = d.norm_squared();
                if dist2 < 1e-30 {
                    continue;
                }
                let w = 1.0 / dist2;
                a += w * d * d.transpose();
                for (k, b) in rhs.iter_mut().enumerate() {
                    *b += w * (field.tuple(n)[k] - field.tuple(cell)[k]) * d;
                }
            }

            let svd = a.svd(true, true);
            let cutoff = RANK_TOLERANCE * svd.singular_values.max();
            match svd.pseudo_inverse(cutoff) {
                Ok(inv) => rhs.iter().flat_map(|b| (inv * b).iter().copied().collect::<Vec<_>>()).collect(),
                Err(_) => vec![0.0; 3 * c],
            }
        })
        .collect();

    FieldArray::new(GRADIENTS, 3 * c, per_cell.concat())
}

/// Curl of a vector field from its 9-component gradient.
pub fn vorticity_from_gradients(gradients: &FieldArray) -> MeshResult<FieldArray> {
    if gradients.components != 9 {
        return Err(MeshError::FieldShape {
            name: gradients.name.clone(),
            what: format!(
                "vorticity needs a vector gradient (9 components), got {}",
                gradients.components
            ),
        });
    }
    let values = gradients
        .values
        .chunks_exact(9)
        .flat_map(|g| [g[7] - g[5], g[2] - g[6], g[3] - g[1]])
        .collect();
    FieldArray::new(VORTICITY, 3, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centers_field(grid: &UnstructuredGrid, f: impl Fn(f64, f64, f64) -> [f64; 3]) -> FieldArray {
        let values = (0..grid.n_cells())
            .flat_map(|i| {
                let c = grid.center(i);
                f(c.x, c.y, c.z)
            })
            .collect();
        FieldArray::new("U", 3, values).unwrap()
    }

    #[test]
    fn linear_scalar_gradient_is_exact() {
        let grid = UnstructuredGrid::structured_box([4, 4, 4], [0.0; 3], [1.0, 2.0, 1.0]).unwrap();
        let values = (0..grid.n_cells())
            .map(|i| {
                let c = grid.center(i);
                3.0 * c.x - 2.0 * c.y + 0.5 * c.z
            })
            .collect();
        let p = FieldArray::new("p", 1, values).unwrap();
        let g = cell_gradients(&grid, &p).unwrap();
        assert_eq!(g.components, 3);
        for i in 0..grid.n_cells() {
            let t = g.tuple(i);
            assert!((t[0] - 3.0).abs() < 1e-9);
            assert!((t[1] + 2.0).abs() < 1e-9);
            assert!((t[2] - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn solid_body_rotation_has_uniform_vorticity() {
        // U = (-y, x, 0): curl = (0, 0, 2)
        let grid = UnstructuredGrid::structured_box([3, 3, 3], [-1.0; 3], [1.0; 3]).unwrap();
        let u = centers_field(&grid, |x, y, _| [-y, x, 0.0]);
        let w = vorticity_from_gradients(&cell_gradients(&grid, &u).unwrap()).unwrap();
        for i in 0..grid.n_cells() {
            let t = w.tuple(i);
            assert!(t[0].abs() < 1e-9 && t[1].abs() < 1e-9);
            assert!((t[2] - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn thin_layer_gets_in_plane_gradient_only() {
        let grid = UnstructuredGrid::structured_box([10, 1, 1], [0.0; 3], [10.0, 1.0, 1.0]).unwrap();
        let p = FieldArray::new("p", 1, (0..10).map(f64::from).collect()).unwrap();
        let g = cell_gradients(&grid, &p).unwrap();
        for i in 0..10 {
            let t = g.tuple(i);
            assert!((t[0] - 1.0).abs() < 1e-9);
            assert!(t[1].abs() < 1e-9 && t[2].abs() < 1e-9);
        }
    }

    #[test]
    fn vorticity_rejects_scalar_gradients() {
        let g = FieldArray::new(GRADIENTS, 3, vec![0.0; 6]).unwrap();
        assert!(matches!(vorticity_from_gradients(&g), Err(MeshError::FieldShape { .. })));
    }
}
