//! Native ROM engine on `nalgebra`.
//!
//! Unknowns are `y = [a; b]` (velocity then pressure coefficients). The
//! residual has one momentum row per velocity mode, one stabilization row
//! per pressure mode, and the first `n_bc` momentum rows are replaced by the
//! boundary conditions `a_j = u_j`.

use nalgebra::{DMatrix, DVector};
use rf_archive::{Matrix, ModelTopology, Stabilization};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{AppendSequence, MatrixSlot, OnlineSolution, Reconstruction, RomEngine};
use crate::error::{RomError, RomResult};
use crate::jacobian::finite_difference_jacobian;
use crate::newton::{NewtonConfig, newton_solve};
use crate::rbf::RbfInterpolator;

/// Tuning for the online solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeEngineConfig {
    pub newton: NewtonConfig,
    /// Relative perturbation of the finite-difference Jacobian.
    pub fd_epsilon: f64,
    /// Gaussian kernel shape `ε`.
    pub rbf_shape: f64,
}

impl Default for NativeEngineConfig {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            fd_epsilon: 1e-7,
            rbf_shape: 1.0,
        }
    }
}

#[derive(Default)]
struct Operators {
    k: Option<DMatrix<f64>>,
    b: Option<DMatrix<f64>>,
    bt: Option<DMatrix<f64>>,
    coeff_l2: Option<DMatrix<f64>>,
    mu: Option<DMatrix<f64>>,
    d: Option<DMatrix<f64>>,
    bc3: Option<DMatrix<f64>>,
    p: Option<DMatrix<f64>>,
    modes_u: Option<DMatrix<f64>>,
    modes_p: Option<DMatrix<f64>>,
    modes_nut: Option<DMatrix<f64>>,
    weights: Vec<DVector<f64>>,
    c: Vec<DMatrix<f64>>,
    ct1: Vec<DMatrix<f64>>,
    ct2: Vec<DMatrix<f64>>,
    g: Vec<DMatrix<f64>>,
}

/// Reduced Navier-Stokes engine with RBF eddy-viscosity closure.
pub struct NativeRomEngine {
    config: NativeEngineConfig,
    topology: Option<ModelTopology>,
    ops: Operators,
    rbf: Option<RbfInterpolator>,
    viscosity: Option<f64>,
    solution: Option<OnlineSolution>,
}

impl NativeRomEngine {
    pub fn new(config: NativeEngineConfig) -> Self {
        Self {
            config,
            topology: None,
            ops: Operators::default(),
            rbf: None,
            viscosity: None,
            solution: None,
        }
    }

    /// Training turbulent-viscosity coefficients (`coeffL2`), one column per run.
    pub fn training_nut_coefficients(&self) -> Option<&DMatrix<f64>> {
        self.ops.coeff_l2.as_ref()
    }

    /// Latest online solution, if any.
    pub fn solution(&self) -> Option<&OnlineSolution> {
        self.solution.as_ref()
    }

    fn topology(&self) -> RomResult<ModelTopology> {
        self.topology.ok_or_else(|| RomError::Protocol {
            what: "engine used before initialize".to_string(),
        })
    }

    fn check_shape(what: &str, m: &Matrix, rows: Option<usize>, cols: usize) -> RomResult<()> {
        let rows_ok = rows.is_none_or(|r| r == m.rows());
        if rows_ok && m.cols() == cols {
            return Ok(());
        }
        let expected_rows = rows.map_or_else(|| "*".to_string(), |r| r.to_string());
        Err(RomError::Dimension {
            what: format!(
                "{what} is {}x{}, expected {expected_rows}x{cols}",
                m.rows(),
                m.cols()
            ),
        })
    }

    fn require<'a>(m: &'a Option<DMatrix<f64>>, what: &str) -> RomResult<&'a DMatrix<f64>> {
        m.as_ref().ok_or_else(|| RomError::Protocol {
            what: format!("{what} was never set"),
        })
    }

    fn require_count(&self, sequence: AppendSequence, expected: usize) -> RomResult<()> {
        let actual = match sequence {
            AppendSequence::Weights => self.ops.weights.len(),
            AppendSequence::C => self.ops.c.len(),
            AppendSequence::Ct1 => self.ops.ct1.len(),
            AppendSequence::Ct2 => self.ops.ct2.len(),
            AppendSequence::G => self.ops.g.len(),
        };
        if actual == expected {
            Ok(())
        } else {
            Err(RomError::AppendCount {
                sequence,
                expected,
                actual,
            })
        }
    }

    /// RBF query point: inlet velocity restricted to the parameter dimension.
    fn rbf_query(rbf: &RbfInterpolator, velocity: [f64; 2]) -> RomResult<Vec<f64>> {
        match rbf.dim() {
            1 => Ok(vec![velocity[0]]),
            2 => Ok(velocity.to_vec()),
            d => Err(RomError::Dimension {
                what: format!("parameter samples have {d} columns, expected 1 or 2"),
            }),
        }
    }
}

impl Default for NativeRomEngine {
    fn default() -> Self {
        Self::new(NativeEngineConfig::default())
    }
}

/// Borrowed operators for one online solve.
struct OnlineSystem<'a> {
    topology: ModelTopology,
    nu: f64,
    velocity: [f64; 2],
    /// `B + bt`
    diffusion: DMatrix<f64>,
    /// Row `i` is `g_nutᵀ (Ct1_i + Ct2_i)`.
    turbulent: DMatrix<f64>,
    k: &'a DMatrix<f64>,
    c: &'a [DMatrix<f64>],
    stabilization: Stabilizer<'a>,
}

enum Stabilizer<'a> {
    Ppe {
        d: &'a DMatrix<f64>,
        bc3: &'a DMatrix<f64>,
        g: &'a [DMatrix<f64>],
    },
    Supremizer {
        p: &'a DMatrix<f64>,
    },
}

impl OnlineSystem<'_> {
    fn residual(&self, y: &DVector<f64>) -> RomResult<DVector<f64>> {
        let n_u = self.topology.n_phi_u;
        let n_p = self.topology.n_phi_p;
        let a = y.rows(0, n_u).into_owned();
        let b = y.rows(n_u, n_p).into_owned();

        let mut r = DVector::zeros(n_u + n_p);
        let linear = self.nu * (&self.diffusion * &a) + &self.turbulent * &a - self.k * &b;
        for i in 0..n_u {
            r[i] = linear[i] - a.dot(&(&self.c[i] * &a));
        }

        match &self.stabilization {
            Stabilizer::Supremizer { p } => {
                r.rows_mut(n_u, n_p).copy_from(&(*p * &a));
            }
            Stabilizer::Ppe { d, bc3, g } => {
                let pressure = *d * &b - self.nu * (*bc3 * &a);
                for j in 0..n_p {
                    r[n_u + j] = pressure[j] + a.dot(&(&g[j] * &a));
                }
            }
        }

        for j in 0..self.topology.n_bc {
            r[j] = a[j] - self.velocity[j];
        }
        Ok(r)
    }
}

impl RomEngine for NativeRomEngine {
    fn initialize(&mut self, topology: &ModelTopology) -> RomResult<()> {
        if topology.n_phi_u < topology.n_bc || topology.n_bc > 2 {
            return Err(RomError::Dimension {
                what: format!(
                    "{} velocity modes cannot carry {} boundary conditions",
                    topology.n_phi_u, topology.n_bc
                ),
            });
        }
        self.topology = Some(*topology);
        self.ops = Operators::default();
        self.rbf = None;
        self.viscosity = None;
        self.solution = None;
        Ok(())
    }

    fn set_matrix(&mut self, slot: MatrixSlot, matrix: &Matrix) -> RomResult<()> {
        let t = self.topology()?;
        let (n_u, n_p, n_nut) = (t.n_phi_u, t.n_phi_p, t.n_phi_nut);
        let name = slot.file().file_name();
        match slot {
            MatrixSlot::K => Self::check_shape(&name, matrix, Some(n_u), n_p)?,
            MatrixSlot::B | MatrixSlot::Bt => Self::check_shape(&name, matrix, Some(n_u), n_u)?,
            MatrixSlot::CoeffL2 => Self::check_shape(&name, matrix, Some(n_nut), t.n_runs)?,
            MatrixSlot::Mu => {
                if matrix.rows() != t.n_runs {
                    return Err(RomError::Dimension {
                        what: format!("{name} has {} samples, expected {}", matrix.rows(), t.n_runs),
                    });
                }
            }
            MatrixSlot::D => Self::check_shape(&name, matrix, Some(n_p), n_p)?,
            MatrixSlot::Bc3 | MatrixSlot::P => Self::check_shape(&name, matrix, Some(n_p), n_u)?,
            MatrixSlot::ModesU => {
                Self::check_shape(&name, matrix, None, n_u)?;
                if matrix.rows() % 3 != 0 {
                    return Err(RomError::Dimension {
                        what: format!("{name} has {} rows, not a multiple of 3", matrix.rows()),
                    });
                }
            }
            MatrixSlot::ModesP => Self::check_shape(&name, matrix, None, n_p)?,
            MatrixSlot::ModesNut => Self::check_shape(&name, matrix, None, n_nut)?,
        }

        let m = Some(matrix.to_dmatrix());
        let ops = &mut self.ops;
        match slot {
            MatrixSlot::K => ops.k = m,
            MatrixSlot::B => ops.b = m,
            MatrixSlot::Bt => ops.bt = m,
            MatrixSlot::CoeffL2 => ops.coeff_l2 = m,
            MatrixSlot::Mu => ops.mu = m,
            MatrixSlot::D => ops.d = m,
            MatrixSlot::Bc3 => ops.bc3 = m,
            MatrixSlot::P => ops.p = m,
            MatrixSlot::ModesU => ops.modes_u = m,
            MatrixSlot::ModesP => ops.modes_p = m,
            MatrixSlot::ModesNut => ops.modes_nut = m,
        }
        Ok(())
    }

    fn append(&mut self, sequence: AppendSequence, matrix: &Matrix) -> RomResult<usize> {
        let t = self.topology()?;
        let name = sequence.to_string();
        let (store, limit) = match sequence {
            AppendSequence::Weights => {
                if self.rbf.is_some() {
                    return Err(RomError::Protocol {
                        what: "weights appended after RBF finalization".to_string(),
                    });
                }
                Self::check_shape(&name, matrix, Some(t.n_runs), 1)?;
                self.ops.weights.push(DVector::from_column_slice(matrix.values()));
                return Ok(self.ops.weights.len() - 1);
            }
            AppendSequence::C => {
                Self::check_shape(&name, matrix, Some(t.n_phi_u), t.n_phi_u)?;
                (&mut self.ops.c, t.n_phi_u)
            }
            AppendSequence::Ct1 => {
                Self::check_shape(&name, matrix, Some(t.n_phi_nut), t.n_phi_u)?;
                (&mut self.ops.ct1, t.n_phi_u)
            }
            AppendSequence::Ct2 => {
                Self::check_shape(&name, matrix, Some(t.n_phi_nut), t.n_phi_u)?;
                (&mut self.ops.ct2, t.n_phi_u)
            }
            AppendSequence::G => {
                if t.stabilization != Stabilization::Ppe {
                    return Err(RomError::Protocol {
                        what: "G tensor appended to a supremizer model".to_string(),
                    });
                }
                Self::check_shape(&name, matrix, Some(t.n_phi_u), t.n_phi_u)?;
                (&mut self.ops.g, t.n_phi_p)
            }
        };
        if store.len() == limit {
            return Err(RomError::AppendCount {
                sequence,
                expected: limit,
                actual: limit + 1,
            });
        }
        store.push(matrix.to_dmatrix());
        Ok(store.len() - 1)
    }

    fn finalize_rbf(&mut self) -> RomResult<()> {
        let t = self.topology()?;
        self.require_count(AppendSequence::Weights, t.n_phi_nut)?;
        let mu = Self::require(&self.ops.mu, "mu")?.clone();
        self.rbf = Some(RbfInterpolator::new(mu, &self.ops.weights, self.config.rbf_shape)?);
        Ok(())
    }

    fn set_viscosity(&mut self, nu: f64) -> RomResult<()> {
        rf_core::ensure_positive(nu, "viscosity")?;
        self.viscosity = Some(nu);
        Ok(())
    }

    fn solve_online(&mut self, velocity: [f64; 2]) -> RomResult<OnlineSolution> {
        let t = self.topology()?;
        let nu = self.viscosity.ok_or_else(|| RomError::Protocol {
            what: "solve before set_viscosity".to_string(),
        })?;
        let rbf = self.rbf.as_ref().ok_or_else(|| RomError::Protocol {
            what: "solve before RBF finalization".to_string(),
        })?;
        for sequence in [AppendSequence::C, AppendSequence::Ct1, AppendSequence::Ct2] {
            self.require_count(sequence, t.n_phi_u)?;
        }

        let g_nut = rbf.evaluate(&Self::rbf_query(rbf, velocity)?)?;
        let ops = &self.ops;
        let turbulent = DMatrix::from_fn(t.n_phi_u, t.n_phi_u, |i, j| {
            (0..t.n_phi_nut)
                .map(|k| g_nut[k] * (ops.ct1[i][(k, j)] + ops.ct2[i][(k, j)]))
                .sum()
        });
        let stabilization = match t.stabilization {
            Stabilization::Ppe => {
                self.require_count(AppendSequence::G, t.n_phi_p)?;
                Stabilizer::Ppe {
                    d: Self::require(&ops.d, "D")?,
                    bc3: Self::require(&ops.bc3, "BC3")?,
                    g: &ops.g,
                }
            }
            Stabilization::Supremizer => Stabilizer::Supremizer {
                p: Self::require(&ops.p, "P")?,
            },
        };
        let system = OnlineSystem {
            topology: t,
            nu,
            velocity,
            diffusion: Self::require(&ops.b, "B")? + Self::require(&ops.bt, "bt")?,
            turbulent,
            k: Self::require(&ops.k, "K")?,
            c: &ops.c,
            stabilization,
        };

        let mut y0 = DVector::zeros(t.n_phi_u + t.n_phi_p);
        for j in 0..t.n_bc {
            y0[j] = velocity[j];
        }
        let eps = self.config.fd_epsilon;
        let result = newton_solve(
            y0,
            |y| system.residual(y),
            |y| finite_difference_jacobian(y, |v| system.residual(v), eps),
            &self.config.newton,
        )?;
        debug!(
            iterations = result.iterations,
            residual = result.residual_norm,
            nu,
            "online solve converged"
        );

        let solution = OnlineSolution {
            a: result.x.rows(0, t.n_phi_u).iter().copied().collect(),
            b: result.x.rows(t.n_phi_u, t.n_phi_p).iter().copied().collect(),
            g_nut: g_nut.iter().copied().collect(),
            iterations: result.iterations,
            residual_norm: result.residual_norm,
        };
        self.solution = Some(solution.clone());
        Ok(solution)
    }

    fn reconstruct(&self) -> RomResult<Reconstruction> {
        let solution = self.solution.as_ref().ok_or_else(|| RomError::Protocol {
            what: "reconstruct before an online solve".to_string(),
        })?;
        let project = |modes: &DMatrix<f64>, coeffs: &[f64]| -> Vec<f64> {
            (modes * DVector::from_column_slice(coeffs)).iter().copied().collect()
        };
        let modes_u = self
            .ops
            .modes_u
            .as_ref()
            .ok_or(RomError::MissingModes { what: "velocity" })?;
        Ok(Reconstruction {
            velocity: project(modes_u, &solution.a),
            pressure: self.ops.modes_p.as_ref().map(|m| project(m, &solution.b)),
            nut: self.ops.modes_nut.as_ref().map(|m| project(m, &solution.g_nut)),
        })
    }
}
