//! Spatial integration of point data over the grid or extracted geometry.

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::field::FieldArray;
use crate::geometry::{tet_volume, triangle_area};
use crate::grid::UnstructuredGrid;
use crate::polydata::PolyData;

/// Integrated value of a field. Vectors carry their magnitude last.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntegralSum {
    Scalar(f64),
    Vector([f64; 4]),
}

impl IntegralSum {
    /// Shape chosen from the length of the raw sum alone. A three-component
    /// field that is not a vector would still come out as `Vector`; callers
    /// have no way to say otherwise yet.
    pub fn from_raw(name: &str, raw: &[f64]) -> MeshResult<Self> {
        match *raw {
            [v] => Ok(Self::Scalar(v)),
            [x, y, z] => Ok(Self::Vector(rf_core::with_magnitude([x, y, z]))),
            _ => Err(MeshError::FieldShape {
                name: name.to_string(),
                what: format!("cannot integrate {} components", raw.len()),
            }),
        }
    }
}

/// Volume, area or length integrated over, and the field sum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Integral {
    pub extent: f64,
    pub sum: IntegralSum,
}

fn accumulate(sum: &mut [f64], measure: f64, corners: &[Vec<f64>]) {
    let w = measure / corners.len() as f64;
    for c in corners {
        for (s, v) in sum.iter_mut().zip(c) {
            *s += w * v;
        }
    }
}

/// Integrate point field `field` over the grid volume.
///
/// Each cell is split into center-fan tetrahedra; the center value is the
/// average of the cell's node values, which keeps linear fields exact on
/// convex cells.
pub fn integrate_grid(grid: &UnstructuredGrid, field: &FieldArray) -> MeshResult<Integral> {
    field.expect_tuples(grid.n_points())?;
    let mut sum = vec![0.0; field.components];
    let mut extent = 0.0;

    for (cell_id, cell) in grid.cells().iter().enumerate() {
        let w = 1.0 / cell.nodes.len() as f64;
        let weights: Vec<(usize, f64)> = cell.nodes.iter().map(|&n| (n, w)).collect();
        let center_value = field.interpolate(&weights);
        let center = grid.center(cell_id);
        for [a, b, c] in cell.fan_triangles() {
            let volume = tet_volume(center, grid.point(a), grid.point(b), grid.point(c)).abs();
            extent += volume;
            let corners = [
                center_value.clone(),
                field.tuple(a).to_vec(),
                field.tuple(b).to_vec(),
                field.tuple(c).to_vec(),
            ];
            accumulate(&mut sum, volume, &corners);
        }
    }

    Ok(Integral {
        extent,
        sum: IntegralSum::from_raw(&field.name, &sum)?,
    })
}

/// Integrate point field `name` over extracted geometry: over polygon area
/// when there are polygons, otherwise along the polylines.
pub fn integrate_poly(poly: &PolyData, name: &str) -> MeshResult<Integral> {
    let field = poly.point_field(name)?;
    field.expect_tuples(poly.n_points())?;
    let mut sum = vec![0.0; field.components];
    let mut extent = 0.0;
    let tuple = |i: usize| field.tuple(i).to_vec();

    if poly.polys.is_empty() {
        for line in &poly.lines {
            for seg in line.windows(2) {
                let length = (poly.point(seg[1]) - poly.point(seg[0])).norm();
                extent += length;
                accumulate(&mut sum, length, &[tuple(seg[0]), tuple(seg[1])]);
            }
        }
    } else {
        for [a, b, c] in poly.triangles() {
            let area = triangle_area(&poly.point(a), &poly.point(b), &poly.point(c));
            extent += area;
            accumulate(&mut sum, area, &[tuple(a), tuple(b), tuple(c)]);
        }
    }

    Ok(Integral {
        extent,
        sum: IntegralSum::from_raw(name, &sum)?,
    })
}
