//! Point location on a voxel hash over cell bounding boxes.

use std::collections::HashMap;

use rf_core::Vec3;

use crate::geometry::barycentric;
use crate::grid::UnstructuredGrid;

/// Cell containing a point and the node weights interpolating point data
/// there. Weights sum to one.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub cell: usize,
    pub weights: Vec<(usize, f64)>,
}

/// Finds the cell containing a point.
///
/// Each cell is registered in every voxel its (tolerance-expanded) bounding
/// box overlaps, so a query only inspects the cells of one voxel.
pub struct CellLocator {
    voxels: HashMap<(i32, i32, i32), Vec<usize>>,
    step: f64,
    tolerance: f64,
}

impl CellLocator {
    /// Index `grid`. Points within `tolerance` (absolute length) of a cell
    /// count as inside it.
    pub fn new(grid: &UnstructuredGrid, tolerance: f64) -> Self {
        let tolerance = tolerance.max(0.0);
        let mean_size = (grid.total_volume() / grid.n_cells() as f64).cbrt();
        let step = if mean_size > 0.0 { mean_size } else { 1.0 };

        let mut voxels: HashMap<(i32, i32, i32), Vec<usize>> = HashMap::new();
        for cell in 0..grid.n_cells() {
            let b = grid.cell_bounds(cell).expanded(tolerance);
            let lo = voxel_of(&b.min, step);
            let hi = voxel_of(&b.max, step);
            for i in lo.0..=hi.0 {
                for j in lo.1..=hi.1 {
                    for k in lo.2..=hi.2 {
                        voxels.entry((i, j, k)).or_default().push(cell);
                    }
                }
            }
        }
        Self {
            voxels,
            step,
            tolerance,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Locate `p`, preferring the candidate it lies deepest inside.
    pub fn locate(&self, grid: &UnstructuredGrid, p: &Vec3) -> Option<Location> {
        let candidates = self.voxels.get(&voxel_of(p, self.step))?;
        let mut best: Option<(f64, Location)> = None;

        for &cell in candidates {
            if !grid.cell_bounds(cell).expanded(self.tolerance).contains(p) {
                continue;
            }
            let slack = self.tolerance / grid.cell_length(cell).max(f64::MIN_POSITIVE);
            let center = grid.center(cell);
            for [a, b, c] in grid.cells()[cell].fan_triangles() {
                let Some(l) = barycentric(p, [center, grid.point(a), grid.point(b), grid.point(c)]) else {
                    continue;
                };
                let depth = l.iter().copied().fold(f64::INFINITY, f64::min);
                if depth < -slack || best.as_ref().is_some_and(|(d, _)| *d >= depth) {
                    continue;
                }
                best = Some((depth, node_weights(grid, cell, [a, b, c], l)));
            }
            if best.as_ref().is_some_and(|(d, _)| *d >= 0.0) {
                break;
            }
        }
        best.map(|(_, loc)| loc)
    }
}

fn voxel_of(p: &Vec3, step: f64) -> (i32, i32, i32) {
    (
        (p.x / step).floor() as i32,
        (p.y / step).floor() as i32,
        (p.z / step).floor() as i32,
    )
}

/// Spread the center weight evenly over the cell nodes, clamping the small
/// negative weights a tolerant hit can produce.
fn node_weights(grid: &UnstructuredGrid, cell: usize, tri: [usize; 3], l: [f64; 4]) -> Location {
    let nodes = &grid.cells()[cell].nodes;
    let clamped: Vec<f64> = l.iter().map(|w| w.max(0.0)).collect();
    let total: f64 = clamped.iter().sum();
    let share = clamped[0] / total / nodes.len() as f64;

    let mut weights: Vec<(usize, f64)> = nodes.iter().map(|&n| (n, share)).collect();
    for (k, &node) in tri.iter().enumerate() {
        if let Some(w) = weights.iter_mut().find(|(n, _)| *n == node) {
            w.1 += clamped[k + 1] / total;
        }
    }
    Location { cell, weights }
}
