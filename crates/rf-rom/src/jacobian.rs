//! Finite difference Jacobian computation.

use nalgebra::{DMatrix, DVector};

use crate::error::RomResult;

/// Forward-difference Jacobian of `f` at `x`.
///
/// Column `j` perturbs `x[j]` by `epsilon * max(|x[j]|, 1)`.
pub fn finite_difference_jacobian<F>(x: &DVector<f64>, f: F, epsilon: f64) -> RomResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> RomResult<DVector<f64>>,
{
    let n = x.len();
    let f_x = f(x)?;
    let mut jac = DMatrix::zeros(f_x.len(), n);

    let mut x_perturbed = x.clone();
    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] = x[j] + dx;
        let df = (f(&x_perturbed)? - &f_x) / dx;
        jac.set_column(j, &df);
        x_perturbed[j] = x[j];
    }

    Ok(jac)
}
