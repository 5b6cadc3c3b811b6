//! Surface and line geometry produced by the extraction filters.

use rf_core::{Vec3, vec3};
use serde::{Deserialize, Serialize};

use crate::error::MeshResult;
use crate::field::{self, FieldArray};
use crate::geometry::triangle_area;

/// Points with polygon and polyline connectivity and per-point data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyData {
    pub points: Vec<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub polys: Vec<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Vec<usize>>,
    #[serde(default)]
    pub point_data: Vec<FieldArray>,
}

impl PolyData {
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, i: usize) -> Vec3 {
        vec3(self.points[i])
    }

    pub fn point_field(&self, name: &str) -> MeshResult<&FieldArray> {
        field::find(&self.point_data, name)
    }

    /// Fan triangles of every polygon.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.polys
            .iter()
            .flat_map(|p| (1..p.len().saturating_sub(1)).map(move |i| [p[0], p[i], p[i + 1]]))
    }

    /// Total polygon area.
    pub fn area(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| triangle_area(&self.point(a), &self.point(b), &self.point(c)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_area() {
        let poly = PolyData {
            points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            polys: vec![vec![0, 1, 2, 3]],
            ..PolyData::default()
        };
        assert!((poly.area() - 1.0).abs() < 1e-15);
        assert_eq!(poly.triangles().count(), 2);
    }

    #[test]
    fn empty_connectivity_is_omitted_from_json() {
        let poly = PolyData {
            points: vec![[0.0; 3]],
            ..PolyData::default()
        };
        let json = serde_json::to_string(&poly).unwrap();
        assert!(!json.contains("polys"));
        assert!(json.contains("point_data"));
    }
}
