//! Damped Newton iteration for the reduced online system.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RomError, RomResult};

/// Newton solver configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abs_tol: 1e-10,
            rel_tol: 1e-12,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    pub x: DVector<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
}

/// Newton solve with backtracking line search.
///
/// Fails with [`RomError::ConvergenceFailed`] when the iteration budget runs
/// out or the step length collapses.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> RomResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> RomResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> RomResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if !r_norm.is_finite() {
            return Err(RomError::Numeric {
                what: format!("non-finite residual at iteration {iter}"),
            });
        }
        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = jacobian_fn(&x)?;
        let dx = jac.lu().solve(&(-&r)).ok_or_else(|| RomError::Numeric {
            what: format!("singular Jacobian at iteration {iter}"),
        })?;

        let mut alpha = 1.0;
        let mut x_new = &x + &dx;
        let mut r_new = residual_fn(&x_new)?;
        let mut r_new_norm = r_new.norm();
        let mut reduced = r_new_norm < r_norm;

        for _ in 0..config.max_line_search_iters {
            if reduced {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = &x + alpha * &dx;
            r_new = residual_fn(&x_new)?;
            r_new_norm = r_new.norm();
            reduced = r_new_norm < r_norm;
        }
        if !reduced {
            warn!(iteration = iter, alpha, residual = r_norm, "line search found no reduction, taking damped step");
        }

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;

        if alpha < 1e-10 {
            return Err(RomError::ConvergenceFailed {
                what: format!("line search stagnated at iteration {iter}"),
            });
        }
    }

    if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }
    Err(RomError::ConvergenceFailed {
        what: format!(
            "maximum iterations {} reached, residual = {r_norm:e}",
            config.max_iterations
        ),
    })
}
