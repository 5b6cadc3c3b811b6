//! Linear 3D cell kinds and their face tables.

use serde::{Deserialize, Serialize};

/// Supported cell shapes, with VTK node ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Tetra,
    Hexahedron,
    Wedge,
    Pyramid,
}

const TETRA_FACES: &[&[usize]] = &[&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[0, 2, 1]];
const HEXAHEDRON_FACES: &[&[usize]] = &[
    &[0, 4, 7, 3],
    &[1, 2, 6, 5],
    &[0, 1, 5, 4],
    &[3, 7, 6, 2],
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
];
const WEDGE_FACES: &[&[usize]] = &[&[0, 1, 2], &[3, 5, 4], &[0, 3, 4, 1], &[1, 4, 5, 2], &[2, 5, 3, 0]];
const PYRAMID_FACES: &[&[usize]] = &[&[0, 3, 2, 1], &[0, 1, 4], &[1, 2, 4], &[2, 3, 4], &[3, 0, 4]];

impl CellKind {
    pub fn n_nodes(self) -> usize {
        match self {
            CellKind::Tetra => 4,
            CellKind::Hexahedron => 8,
            CellKind::Wedge => 6,
            CellKind::Pyramid => 5,
        }
    }

    /// VTK cell type code.
    pub fn vtk_type(self) -> u8 {
        match self {
            CellKind::Tetra => 10,
            CellKind::Hexahedron => 12,
            CellKind::Wedge => 13,
            CellKind::Pyramid => 14,
        }
    }

    pub fn from_vtk_type(code: u8) -> Option<Self> {
        match code {
            10 => Some(CellKind::Tetra),
            12 => Some(CellKind::Hexahedron),
            13 => Some(CellKind::Wedge),
            14 => Some(CellKind::Pyramid),
            _ => None,
        }
    }

    /// Faces as local node indices, consistently oriented.
    pub fn faces(self) -> &'static [&'static [usize]] {
        match self {
            CellKind::Tetra => TETRA_FACES,
            CellKind::Hexahedron => HEXAHEDRON_FACES,
            CellKind::Wedge => WEDGE_FACES,
            CellKind::Pyramid => PYRAMID_FACES,
        }
    }
}

/// One grid cell: a kind and its global node ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub nodes: Vec<usize>,
}

impl Cell {
    pub fn new(kind: CellKind, nodes: Vec<usize>) -> Self {
        Self { kind, nodes }
    }

    /// Global node ids of each face.
    pub fn faces(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        self.kind
            .faces()
            .iter()
            .map(|f| f.iter().map(|&l| self.nodes[l]).collect())
    }

    /// Triangles of the face fans, as global node ids.
    ///
    /// Together with the cell center each triangle spans one sub-tetrahedron;
    /// the sub-tetrahedra tile the cell exactly when it is convex.
    pub fn fan_triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.kind.faces().iter().flat_map(move |f| {
            (1..f.len() - 1).map(move |i| [self.nodes[f[0]], self.nodes[f[i]], self.nodes[f[i + 1]]])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_face_uses_valid_local_nodes() {
        for kind in [CellKind::Tetra, CellKind::Hexahedron, CellKind::Wedge, CellKind::Pyramid] {
            for face in kind.faces() {
                assert!(face.len() >= 3);
                assert!(face.iter().all(|&n| n < kind.n_nodes()));
            }
        }
    }

    #[test]
    fn every_edge_is_shared_by_two_faces() {
        // Closed surface: each directed edge appears once and its reverse once.
        for kind in [CellKind::Tetra, CellKind::Hexahedron, CellKind::Wedge, CellKind::Pyramid] {
            let mut edges = Vec::new();
            for face in kind.faces() {
                for i in 0..face.len() {
                    edges.push((face[i], face[(i + 1) % face.len()]));
                }
            }
            for &(a, b) in &edges {
                assert_eq!(edges.iter().filter(|&&e| e == (a, b)).count(), 1, "{kind:?}");
                assert_eq!(edges.iter().filter(|&&e| e == (b, a)).count(), 1, "{kind:?}");
            }
        }
    }

    #[test]
    fn hexahedron_fan_has_twelve_triangles() {
        let cell = Cell::new(CellKind::Hexahedron, (10..18).collect());
        let tris: Vec<_> = cell.fan_triangles().collect();
        assert_eq!(tris.len(), 12);
        assert!(tris.iter().flatten().all(|&n| (10..18).contains(&n)));
    }

    #[test]
    fn kind_names_are_lowercase_json() {
        let json = serde_json::to_string(&CellKind::Hexahedron).unwrap();
        assert_eq!(json, "\"hexahedron\"");
    }
}
