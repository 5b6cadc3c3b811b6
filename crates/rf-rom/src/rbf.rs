//! Gaussian radial basis interpolation of turbulent-viscosity coefficients.
//!
//! Each turbulent-viscosity mode `k` carries one weight per training run:
//! `g_k(x) = Σ_r w_k[r] · exp(-(ε ‖x − μ_r‖)²)` where `μ_r` are the training
//! parameter samples.

use nalgebra::{DMatrix, DVector};

use crate::error::{RomError, RomResult};

/// RBF interpolator over the training parameter samples.
#[derive(Clone, Debug)]
pub struct RbfInterpolator {
    /// One center per row.
    centers: DMatrix<f64>,
    /// One column per turbulent-viscosity mode.
    weights: DMatrix<f64>,
    shape: f64,
}

impl RbfInterpolator {
    /// Build from `centers` (`n_runs × dim`) and per-mode weight vectors.
    pub fn new(centers: DMatrix<f64>, weights: &[DVector<f64>], shape: f64) -> RomResult<Self> {
        if !(shape.is_finite() && shape > 0.0) {
            return Err(RomError::Numeric {
                what: format!("RBF shape parameter must be positive, got {shape}"),
            });
        }
        let n_runs = centers.nrows();
        if let Some((k, w)) = weights.iter().enumerate().find(|(_, w)| w.len() != n_runs) {
            return Err(RomError::Dimension {
                what: format!("RBF weights {k} have {} entries, expected {n_runs}", w.len()),
            });
        }
        let weights = if weights.is_empty() {
            DMatrix::zeros(n_runs, 0)
        } else {
            DMatrix::from_columns(weights)
        };
        Ok(Self {
            centers,
            weights,
            shape,
        })
    }

    /// Parameter dimension (columns of the center matrix).
    pub fn dim(&self) -> usize {
        self.centers.ncols()
    }

    /// Number of interpolated coefficients.
    pub fn n_outputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn kernel(&self, r: f64) -> f64 {
        (-(self.shape * r).powi(2)).exp()
    }

    /// Interpolated coefficients at `x`.
    pub fn evaluate(&self, x: &[f64]) -> RomResult<DVector<f64>> {
        if x.len() != self.dim() {
            return Err(RomError::Dimension {
                what: format!("RBF query has {} coordinates, centers have {}", x.len(), self.dim()),
            });
        }
        let phi = DVector::from_iterator(
            self.centers.nrows(),
            self.centers.row_iter().map(|c| {
                let r2: f64 = c.iter().zip(x).map(|(ci, xi)| (ci - xi).powi(2)).sum();
                self.kernel(r2.sqrt())
            }),
        );
        Ok(self.weights.tr_mul(&phi))
    }
}
