//! 3-component helpers shared by the mesh and model layers.

use nalgebra::Vector3;

use crate::Real;

/// Points and directions in model space.
pub type Vec3 = Vector3<Real>;

/// Build a `Vec3` from a plain array (the shape callers pass across the API).
pub fn vec3(v: [Real; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

/// `[x, y, z, |v|]`, the probe/integral reporting shape.
pub fn with_magnitude(v: [Real; 3]) -> [Real; 4] {
    let mag = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0], v[1], v[2], mag]
}
