//! Small geometric kernels: boxes, tetrahedra, triangles.

use rf_core::Vec3;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box around `points`; `None` when empty.
    pub fn around<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |b, p| Self {
            min: b.min.inf(p),
            max: b.max.sup(p),
        }))
    }

    pub fn expanded(&self, by: f64) -> Self {
        let d = Vec3::repeat(by);
        Self {
            min: self.min - d,
            max: self.max + d,
        }
    }

    pub fn contains(&self, p: &Vec3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }
}

/// Signed volume of tetrahedron `abcd`.
pub fn tet_volume(a: &Vec3, b: &Vec3, c: &Vec3, d: &Vec3) -> f64 {
    (b - a).cross(&(c - a)).dot(&(d - a)) / 6.0
}

/// Barycentric coordinates of `p` in tetrahedron `t`; `None` if degenerate.
pub fn barycentric(p: &Vec3, t: [&Vec3; 4]) -> Option<[f64; 4]> {
    let v = tet_volume(t[0], t[1], t[2], t[3]);
    if v.abs() < f64::EPSILON * (t[1] - t[0]).norm().powi(3) {
        return None;
    }
    let l0 = tet_volume(p, t[1], t[2], t[3]) / v;
    let l1 = tet_volume(t[0], p, t[2], t[3]) / v;
    let l2 = tet_volume(t[0], t[1], p, t[3]) / v;
    Some([l0, l1, l2, 1.0 - l0 - l1 - l2])
}

pub fn triangle_area(a: &Vec3, b: &Vec3, c: &Vec3) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_core::vec3;

    fn unit_tet() -> [Vec3; 4] {
        [
            vec3([0.0, 0.0, 0.0]),
            vec3([1.0, 0.0, 0.0]),
            vec3([0.0, 1.0, 0.0]),
            vec3([0.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn unit_tet_volume() {
        let [a, b, c, d] = unit_tet();
        assert!((tet_volume(&a, &b, &c, &d) - 1.0 / 6.0).abs() < 1e-15);
        assert!((tet_volume(&a, &c, &b, &d) + 1.0 / 6.0).abs() < 1e-15);
    }

    #[test]
    fn barycentric_of_vertices_and_centroid() {
        let t = unit_tet();
        let refs = [&t[0], &t[1], &t[2], &t[3]];
        let l = barycentric(&t[2], refs).unwrap();
        assert!((l[2] - 1.0).abs() < 1e-12);

        let centroid = (t[0] + t[1] + t[2] + t[3]) / 4.0;
        for w in barycentric(&centroid, refs).unwrap() {
            assert!((w - 0.25).abs() < 1e-12);
        }

        let outside = vec3([1.0, 1.0, 1.0]);
        assert!(barycentric(&outside, refs).unwrap()[0] < 0.0);
    }

    #[test]
    fn flat_tet_has_no_coordinates() {
        let a = vec3([0.0, 0.0, 0.0]);
        let b = vec3([1.0, 0.0, 0.0]);
        let c = vec3([0.0, 1.0, 0.0]);
        let d = vec3([1.0, 1.0, 0.0]);
        assert!(barycentric(&a, [&a, &b, &c, &d]).is_none());
    }

    #[test]
    fn box_contains_its_corners() {
        let t = unit_tet();
        let b = Aabb::around(&t).unwrap();
        assert!(t.iter().all(|p| b.contains(p)));
        assert!(!b.contains(&vec3([1.1, 0.0, 0.0])));
        assert!(b.expanded(0.2).contains(&vec3([1.1, 0.0, 0.0])));
    }
}
