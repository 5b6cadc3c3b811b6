//! Streamline tracing from a seed sphere, and tube generation.

use std::f64::consts::PI;

use rf_core::{Vec3, vec3};
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::field::{self, FieldArray};
use crate::grid::UnstructuredGrid;
use crate::locate::{CellLocator, Location};
use crate::polydata::PolyData;

/// Speeds below this stop a streamline.
const STAGNATION_SPEED: f64 = 1e-12;

/// Tube radius at the fastest point, relative to the slowest.
pub const TUBE_RADIUS_FACTOR: f64 = 10.0;

/// Seeding and integration controls. Steps are fractions of the local cell
/// length (bounding-box diagonal).
#[derive(Clone, Debug, PartialEq)]
pub struct StreamlineParams {
    pub center: [f64; 3],
    pub radius: f64,
    /// Maximum arc length of each line.
    pub propagation: f64,
    pub resolution: usize,
    pub initial_step: f64,
    pub min_step: f64,
    pub max_steps: usize,
}

/// Points of a UV sphere with `resolution` divisions in both angles
/// (clamped to at least 3): two poles plus the interior latitude rings.
pub fn sphere_seeds(center: [f64; 3], radius: f64, resolution: usize) -> Vec<Vec3> {
    let res = resolution.max(3);
    let c = vec3(center);
    let mut seeds = vec![c + Vec3::new(0.0, 0.0, radius), c - Vec3::new(0.0, 0.0, radius)];
    for i in 0..res {
        let theta = 2.0 * PI * i as f64 / res as f64;
        for j in 1..res - 1 {
            let phi = PI * j as f64 / (res - 1) as f64;
            seeds.push(
                c + radius * Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()),
            );
        }
    }
    seeds
}

struct Tracer<'a> {
    grid: &'a UnstructuredGrid,
    locator: &'a CellLocator,
    vectors: &'a FieldArray,
}

impl Tracer<'_> {
    fn velocity(&self, loc: &Location) -> Vec3 {
        let v = self.vectors.interpolate(&loc.weights);
        Vec3::new(v[0], v[1], v[2])
    }

    /// Unit direction at `x`, or `None` outside the grid or at stagnation.
    fn direction(&self, x: &Vec3) -> Option<Vec3> {
        let v = self.velocity(&self.locator.locate(self.grid, x)?);
        let speed = v.norm();
        (speed > STAGNATION_SPEED).then(|| v / speed)
    }

    /// One classical RK4 step of length `h` along the unit direction field.
    fn rk4(&self, x: &Vec3, h: f64) -> Option<(Vec3, Location)> {
        let k1 = self.direction(x)?;
        let k2 = self.direction(&(x + 0.5 * h * k1))?;
        let k3 = self.direction(&(x + 0.5 * h * k2))?;
        let k4 = self.direction(&(x + h * k3))?;
        let next = x + h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
        let loc = self.locator.locate(self.grid, &next)?;
        Some((next, loc))
    }

    fn trace(&self, seed: Vec3, first: Location, params: &StreamlineParams) -> Vec<(Vec3, Location)> {
        let mut line = vec![(seed, first)];
        let mut length = 0.0;

        for _ in 0..params.max_steps {
            let remaining = params.propagation - length;
            if remaining <= 0.0 {
                break;
            }
            let Some((x, loc)) = line.last() else { break };
            if self.velocity(loc).norm() <= STAGNATION_SPEED {
                break;
            }
            let cell_length = self.grid.cell_length(loc.cell);
            let mut h = (params.initial_step * cell_length).min(remaining);
            let min_h = (params.min_step * cell_length).min(h);

            let step = loop {
                if let Some(step) = self.rk4(x, h) {
                    break Some(step);
                }
                if h <= min_h {
                    break None;
                }
                h = (h * 0.5).max(min_h);
            };
            let Some((next, next_loc)) = step else { break };
            length += (next - x).norm();
            line.push((next, next_loc));
        }
        line
    }
}

/// Trace forward streamlines of the point vector field `field` from seeds on
/// a sphere. Every point array is interpolated onto the line points.
pub fn trace(
    grid: &UnstructuredGrid,
    locator: &CellLocator,
    point_data: &[FieldArray],
    field_name: &str,
    params: &StreamlineParams,
) -> MeshResult<PolyData> {
    let vectors = field::find(point_data, field_name)?;
    if vectors.components != 3 {
        return Err(MeshError::FieldShape {
            name: field_name.to_string(),
            what: format!("streamlines need a vector field, got {} components", vectors.components),
        });
    }
    for f in point_data {
        f.expect_tuples(grid.n_points())?;
    }
    rf_core::ensure_positive(params.propagation, "propagation")?;
    rf_core::ensure_positive(params.initial_step, "initial step")?;
    rf_core::ensure_positive(params.min_step, "minimum step")?;

    let tracer = Tracer {
        grid,
        locator,
        vectors,
    };
    let mut out = PolyData::default();
    let mut values = vec![Vec::new(); point_data.len()];
    let mut outside = 0;

    for seed in sphere_seeds(params.center, params.radius, params.resolution) {
        let Some(first) = locator.locate(grid, &seed) else {
            outside += 1;
            continue;
        };
        let line = tracer.trace(seed, first, params);
        if line.len() < 2 {
            continue;
        }
        let base = out.points.len();
        for (x, loc) in &line {
            out.points.push([x.x, x.y, x.z]);
            for (k, f) in point_data.iter().enumerate() {
                values[k].extend(f.interpolate(&loc.weights));
            }
        }
        out.lines.push((base..base + line.len()).collect());
    }

    out.point_data = point_data
        .iter()
        .zip(values)
        .map(|(f, v)| FieldArray::new(f.name.clone(), f.components, v))
        .collect::<MeshResult<_>>()?;
    debug!(lines = out.lines.len(), seeds_outside = outside, "streamlines traced");
    Ok(out)
}

fn perpendicular(t: &Vec3) -> Vec3 {
    let axis = if t.x.abs() <= t.y.abs() && t.x.abs() <= t.z.abs() {
        Vec3::x()
    } else if t.y.abs() <= t.z.abs() {
        Vec3::y()
    } else {
        Vec3::z()
    };
    (axis - t * axis.dot(t)).normalize()
}

/// Wrap every polyline in a tube of `sides` quads per segment.
///
/// The radius varies linearly with the magnitude of `field_name`, from
/// `radius` at the slowest point to `TUBE_RADIUS_FACTOR * radius` at the
/// fastest. Point data is copied onto every ring point.
pub fn tubes(lines: &PolyData, field_name: &str, radius: f64, sides: usize) -> MeshResult<PolyData> {
    if sides < 3 || !(radius > 0.0) {
        return Err(MeshError::InvalidArgument {
            what: format!("tube needs radius > 0 and at least 3 sides, got {radius} and {sides}"),
        });
    }
    let vectors = lines.point_field(field_name)?;
    let (vmin, vmax) = (0..vectors.n_tuples())
        .map(|i| vectors.magnitude(i))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| (lo.min(m), hi.max(m)));
    let scale = |i: usize| {
        if vmax > vmin {
            1.0 + (TUBE_RADIUS_FACTOR - 1.0) * (vectors.magnitude(i) - vmin) / (vmax - vmin)
        } else {
            1.0
        }
    };

    let mut out = PolyData::default();
    let mut values = vec![Vec::new(); lines.point_data.len()];

    for line in lines.lines.iter().filter(|l| l.len() >= 2) {
        let n = line.len();
        let pts: Vec<Vec3> = line.iter().map(|&i| lines.point(i)).collect();
        let mut normal: Option<Vec3> = None;
        let mut tangent = Vec3::x();
        let base = out.points.len();

        for (k, &pid) in line.iter().enumerate() {
            let d = pts[(k + 1).min(n - 1)] - pts[k.saturating_sub(1)];
            if d.norm() > 0.0 {
                tangent = d.normalize();
            }
            let nk = match normal {
                Some(prev) => {
                    let projected = prev - prev.dot(&tangent) * tangent;
                    if projected.norm() > 1e-12 {
                        projected.normalize()
                    } else {
                        perpendicular(&tangent)
                    }
                }
                None => perpendicular(&tangent),
            };
            normal = Some(nk);
            let binormal = tangent.cross(&nk);
            let r = radius * scale(pid);

            for s in 0..sides {
                let angle = 2.0 * PI * s as f64 / sides as f64;
                let p = pts[k] + r * (angle.cos() * nk + angle.sin() * binormal);
                out.points.push([p.x, p.y, p.z]);
                for (f, v) in lines.point_data.iter().zip(values.iter_mut()) {
                    v.extend_from_slice(f.tuple(pid));
                }
            }
        }

        for k in 0..n - 1 {
            for s in 0..sides {
                let a = base + k * sides;
                let b = base + (k + 1) * sides;
                let s1 = (s + 1) % sides;
                out.polys.push(vec![a + s, a + s1, b + s1, b + s]);
            }
        }
    }

    out.point_data = lines
        .point_data
        .iter()
        .zip(values)
        .map(|(f, v)| FieldArray::new(f.name.clone(), f.components, v))
        .collect::<MeshResult<_>>()?;
    Ok(out)
}
