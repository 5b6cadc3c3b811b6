//! Point sampling of point data.

use rf_core::{vec3, with_magnitude};
use tracing::warn;

use crate::error::{MeshError, MeshResult};
use crate::field::FieldArray;
use crate::grid::UnstructuredGrid;
use crate::locate::CellLocator;

/// Sample `field` at `point` as `[x, y, z, magnitude]`. Scalars come back as
/// `[v, 0, 0, |v|]`.
pub fn probe(
    grid: &UnstructuredGrid,
    locator: &CellLocator,
    field: &FieldArray,
    point: [f64; 3],
) -> MeshResult<[f64; 4]> {
    field.expect_tuples(grid.n_points())?;
    if !matches!(field.components, 1 | 3) {
        return Err(MeshError::FieldShape {
            name: field.name.clone(),
            what: format!("cannot probe {} components", field.components),
        });
    }
    let Some(loc) = locator.locate(grid, &vec3(point)) else {
        warn!(?point, tolerance = locator.tolerance(), "probe outside the grid");
        return Err(MeshError::OutOfDomain { point });
    };
    let v = field.interpolate(&loc.weights);
    Ok(if let [s] = *v.as_slice() {
        [s, 0.0, 0.0, s.abs()]
    } else {
        with_magnitude([v[0], v[1], v[2]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (UnstructuredGrid, CellLocator) {
        let grid = UnstructuredGrid::structured_box([2, 2, 2], [0.0; 3], [2.0; 3]).unwrap();
        let locator = CellLocator::new(&grid, 1e-6);
        (grid, locator)
    }

    #[test]
    fn vector_probe_reports_magnitude() {
        let (grid, locator) = setup();
        let values = grid.points().iter().flat_map(|p| [p.x, 2.0 * p.y, 0.0]).collect();
        let u = FieldArray::new("U", 3, values).unwrap();
        let s = probe(&grid, &locator, &u, [1.5, 0.5, 1.0]).unwrap();
        assert!((s[0] - 1.5).abs() < 1e-12);
        assert!((s[1] - 1.0).abs() < 1e-12);
        assert!(s[2].abs() < 1e-12);
        assert!((s[3] - 3.25_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn scalar_probe_pads_components() {
        let (grid, locator) = setup();
        let p = FieldArray::new("p", 1, grid.points().iter().map(|p| -p.z).collect()).unwrap();
        let s = probe(&grid, &locator, &p, [0.2, 0.2, 0.5]).unwrap();
        assert!((s[0] + 0.5).abs() < 1e-12);
        assert_eq!(&s[1..3], &[0.0, 0.0]);
        assert!((s[3] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn outside_point_is_out_of_domain() {
        let (grid, locator) = setup();
        let p = FieldArray::new("p", 1, vec![1.0; grid.n_points()]).unwrap();
        assert!(matches!(
            probe(&grid, &locator, &p, [3.0, 1.0, 1.0]),
            Err(MeshError::OutOfDomain { .. })
        ));
    }
}
