//! Boundary surface and plane-cut extraction.

use std::collections::HashMap;

use rf_core::Vec3;
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::field::FieldArray;
use crate::grid::UnstructuredGrid;
use crate::polydata::PolyData;

/// Outer surface of the grid, carrying the point data along.
pub fn surface(grid: &UnstructuredGrid, point_data: &[FieldArray]) -> MeshResult<PolyData> {
    for f in point_data {
        f.expect_tuples(grid.n_points())?;
    }
    let mut remap = vec![usize::MAX; grid.n_points()];
    let mut kept = Vec::new();
    let polys: Vec<Vec<usize>> = grid
        .boundary_faces()
        .into_iter()
        .map(|face| {
            face.into_iter()
                .map(|n| {
                    if remap[n] == usize::MAX {
                        remap[n] = kept.len();
                        kept.push(n);
                    }
                    remap[n]
                })
                .collect()
        })
        .collect();

    let points = kept
        .iter()
        .map(|&n| {
            let p = grid.point(n);
            [p.x, p.y, p.z]
        })
        .collect();
    let point_data = point_data
        .iter()
        .map(|f| {
            let values = kept.iter().flat_map(|&n| f.tuple(n).iter().copied()).collect();
            FieldArray::new(f.name.clone(), f.components, values)
        })
        .collect::<MeshResult<_>>()?;

    debug!(polygons = polys.len(), "surface extracted");
    Ok(PolyData {
        points,
        polys,
        point_data,
        ..PolyData::default()
    })
}

/// Corners of the center-fan tetrahedra a cut walks over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Corner {
    Node(usize),
    Center(usize),
}

struct Cutter<'a> {
    grid: &'a UnstructuredGrid,
    point_data: &'a [FieldArray],
    origin: Vec3,
    normal: Vec3,
    edge_points: HashMap<(Corner, Corner), usize>,
    out: PolyData,
    values: Vec<Vec<f64>>,
}

impl Cutter<'_> {
    fn position(&self, c: Corner) -> Vec3 {
        match c {
            Corner::Node(n) => *self.grid.point(n),
            Corner::Center(cell) => *self.grid.center(cell),
        }
    }

    fn distance(&self, c: Corner) -> f64 {
        (self.position(c) - self.origin).dot(&self.normal)
    }

    fn data(&self, field: &FieldArray, c: Corner) -> Vec<f64> {
        match c {
            Corner::Node(n) => field.tuple(n).to_vec(),
            Corner::Center(cell) => {
                let nodes = &self.grid.cells()[cell].nodes;
                let w = 1.0 / nodes.len() as f64;
                let weights: Vec<(usize, f64)> = nodes.iter().map(|&n| (n, w)).collect();
                field.interpolate(&weights)
            }
        }
    }

    /// Point where the plane crosses edge `ab`, shared between neighbors.
    fn edge_point(&mut self, a: Corner, b: Corner) -> usize {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&id) = self.edge_points.get(&key) {
            return id;
        }
        let (sa, sb) = (self.distance(key.0), self.distance(key.1));
        let t = if sa == sb { 0.5 } else { sa / (sa - sb) };
        let (pa, pb) = (self.position(key.0), self.position(key.1));
        let p = pa + t * (pb - pa);

        let point_data = self.point_data;
        for (k, field) in point_data.iter().enumerate() {
            let da = self.data(field, key.0);
            let db = self.data(field, key.1);
            self.values[k].extend(da.iter().zip(&db).map(|(x, y)| x + t * (y - x)));
        }
        let id = self.out.points.len();
        self.out.points.push([p.x, p.y, p.z]);
        self.edge_points.insert(key, id);
        id
    }

    fn cut_tet(&mut self, tet: [Corner; 4]) {
        let (above, below): (Vec<Corner>, Vec<Corner>) = tet.iter().partition(|&&c| self.distance(c) >= 0.0);
        let poly: Vec<usize> = match (above.as_slice(), below.as_slice()) {
            ([lone], others) | (others, [lone]) if others.len() == 3 => {
                others.iter().map(|&o| self.edge_point(*lone, o)).collect()
            }
            ([p, q], [r, s]) => vec![
                self.edge_point(*p, *r),
                self.edge_point(*p, *s),
                self.edge_point(*q, *s),
                self.edge_point(*q, *r),
            ],
            _ => return,
        };
        self.out.polys.push(poly);
    }
}

/// Cut the grid with the plane through `origin` with normal `normal`.
///
/// Cells are split into center-fan tetrahedra and each tetrahedron is cut
/// linearly, so the section of a linear field is exact.
pub fn plane_cut(
    grid: &UnstructuredGrid,
    point_data: &[FieldArray],
    origin: [f64; 3],
    normal: [f64; 3],
) -> MeshResult<PolyData> {
    let n = rf_core::vec3(normal);
    let len = n.norm();
    if !(len > 0.0 && len.is_finite()) {
        return Err(MeshError::InvalidArgument {
            what: format!("plane normal {normal:?} has no direction"),
        });
    }
    for f in point_data {
        f.expect_tuples(grid.n_points())?;
    }

    let mut cutter = Cutter {
        grid,
        point_data,
        origin: rf_core::vec3(origin),
        normal: n / len,
        edge_points: HashMap::new(),
        out: PolyData::default(),
        values: vec![Vec::new(); point_data.len()],
    };

    for (cell_id, cell) in grid.cells().iter().enumerate() {
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &node in &cell.nodes {
            let s = cutter.distance(Corner::Node(node));
            lo = lo.min(s);
            hi = hi.max(s);
        }
        if lo > 0.0 || hi < 0.0 {
            continue;
        }
        for [a, b, c] in cell.fan_triangles() {
            cutter.cut_tet([
                Corner::Center(cell_id),
                Corner::Node(a),
                Corner::Node(b),
                Corner::Node(c),
            ]);
        }
    }

    let mut out = cutter.out;
    out.point_data = point_data
        .iter()
        .zip(cutter.values)
        .map(|(f, values)| FieldArray::new(f.name.clone(), f.components, values))
        .collect::<MeshResult<_>>()?;
    debug!(polygons = out.polys.len(), "plane cut extracted");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_point_field(grid: &UnstructuredGrid) -> FieldArray {
        let values = grid.points().iter().map(|p| p.x + 2.0 * p.y).collect();
        FieldArray::new("s", 1, values).unwrap()
    }

    #[test]
    fn surface_of_box_keeps_only_outer_points() {
        let grid = UnstructuredGrid::structured_box([3, 3, 3], [0.0; 3], [1.0; 3]).unwrap();
        let poly = surface(&grid, &[linear_point_field(&grid)]).unwrap();
        // 64 points, 8 interior.
        assert_eq!(poly.n_points(), 56);
        assert_eq!(poly.polys.len(), 54);
        assert!((poly.area() - 6.0).abs() < 1e-12);
        let s = poly.point_field("s").unwrap();
        for (i, p) in poly.points.iter().enumerate() {
            assert!((s.tuple(i)[0] - (p[0] + 2.0 * p[1])).abs() < 1e-12);
        }
    }

    #[test]
    fn mid_plane_section_area_and_data() {
        let grid = UnstructuredGrid::structured_box([2, 2, 2], [0.0; 3], [1.0, 2.0, 3.0]).unwrap();
        let cut = plane_cut(&grid, &[linear_point_field(&grid)], [0.3, 0.0, 0.0], [1.0, 0.0, 0.0]).unwrap();
        assert!((cut.area() - 6.0).abs() < 1e-9);
        let s = cut.point_field("s").unwrap();
        for (i, p) in cut.points.iter().enumerate() {
            assert!((p[0] - 0.3).abs() < 1e-12);
            assert!((s.tuple(i)[0] - (p[0] + 2.0 * p[1])).abs() < 1e-12);
        }
    }

    #[test]
    fn plane_outside_gives_empty_section() {
        let grid = UnstructuredGrid::structured_box([2, 2, 2], [0.0; 3], [1.0; 3]).unwrap();
        let cut = plane_cut(&grid, &[], [0.0, 0.0, 5.0], [0.0, 0.0, 1.0]).unwrap();
        assert!(cut.is_empty());
    }

    #[test]
    fn zero_normal_is_rejected() {
        let grid = UnstructuredGrid::structured_box([1, 1, 1], [0.0; 3], [1.0; 3]).unwrap();
        assert!(matches!(
            plane_cut(&grid, &[], [0.0; 3], [0.0; 3]),
            Err(MeshError::InvalidArgument { .. })
        ));
    }
}
