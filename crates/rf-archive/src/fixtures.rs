//! Synthetic model archives.
//!
//! The generated models are small and well conditioned: the boundary rows and
//! the stabilization rows pin the velocity coefficients, and the convective
//! and turbulent terms are weak, so the online Newton solve converges in a
//! handful of iterations for viscosities in `[1e-2, 1]`.

use crate::bundle::ArchiveBuilder;
use crate::matrix::Matrix;
use crate::names::MatrixFile;
use crate::topology::{N_BC, Stabilization};

/// Recipe for a synthetic archive. `n_phi_p` is always `n_phi_u - 2`.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticRom {
    pub stabilization: Stabilization,
    pub n_phi_u: usize,
    pub n_phi_nut: usize,
    pub n_runs: usize,
    /// Cell count the eigenmode bases are sized for; `0` omits the bases.
    pub n_cells: usize,
}

impl SyntheticRom {
    pub fn new(stabilization: Stabilization, n_cells: usize) -> Self {
        Self {
            stabilization,
            n_phi_u: 4,
            n_phi_nut: 2,
            n_runs: 5,
            n_cells,
        }
    }

    pub fn n_phi_p(&self) -> usize {
        self.n_phi_u.saturating_sub(N_BC)
    }

    /// Every matrix of the archive in file order.
    pub fn matrices(&self) -> Vec<(MatrixFile, Matrix)> {
        let nu = self.n_phi_u;
        let np = self.n_phi_p();
        let nnut = self.n_phi_nut;
        let runs = self.n_runs;
        let wave = |a: usize, b: usize, scale: f64| scale * (((a + 1) * (b + 2)) as f64 * 0.37).sin();

        let mut out = vec![
            (
                MatrixFile::K,
                Matrix::from_fn(nu, np, |r, c| match self.stabilization {
                    Stabilization::Supremizer if r >= N_BC && r - N_BC == c => 1.0,
                    Stabilization::Supremizer => 0.0,
                    Stabilization::Ppe => wave(r, c, 0.01),
                }),
            ),
            (
                MatrixFile::B,
                Matrix::from_fn(nu, nu, |r, c| if r == c { -1.0 } else { wave(r, c, 0.05) }),
            ),
            (MatrixFile::Bt, Matrix::from_fn(nu, nu, |r, c| wave(c, r, 0.02))),
            (
                MatrixFile::CoeffL2,
                Matrix::from_fn(nnut, runs, |r, c| 0.01 * (r + c) as f64),
            ),
            (MatrixFile::Par, Matrix::from_fn(runs, 1, |r, _| 1.0 + r as f64)),
        ];

        match self.stabilization {
            Stabilization::Ppe => {
                out.push((MatrixFile::D, Matrix::from_fn(np, np, |r, c| f64::from(r == c))));
                out.push((MatrixFile::Bc3, Matrix::from_fn(np, nu, |r, c| wave(r, c, 0.1))));
            }
            Stabilization::Supremizer => {
                out.push((
                    MatrixFile::P,
                    Matrix::from_fn(np, nu, |r, c| {
                        if c < N_BC {
                            wave(r, c, 0.5)
                        } else {
                            f64::from(c - N_BC == r)
                        }
                    }),
                ));
            }
        }

        if self.n_cells > 0 {
            let n = self.n_cells;
            out.push((MatrixFile::ModesU, Matrix::from_fn(3 * n, nu, |r, c| wave(r, c, 1.0))));
            out.push((MatrixFile::ModesP, Matrix::from_fn(n, np, |r, c| wave(c, r, 1.0))));
            out.push((MatrixFile::ModesNut, Matrix::from_fn(n, nnut, |r, c| wave(r, c, 1e-3))));
        }

        for i in 0..nnut {
            out.push((
                MatrixFile::Weights(i),
                Matrix::from_fn(runs, 1, |r, _| 0.1 * (i + 1) as f64 / (r + 1) as f64),
            ));
        }
        for i in 0..nu {
            out.push((MatrixFile::C(i), Matrix::from_fn(nu, nu, |r, c| wave(i + r, c, 1e-3))));
            out.push((MatrixFile::Ct1(i), Matrix::from_fn(nnut, nu, |r, c| wave(i, r + c, 1e-3))));
            out.push((MatrixFile::Ct2(i), Matrix::from_fn(nnut, nu, |r, c| wave(r, i + c, 1e-3))));
        }
        if self.stabilization == Stabilization::Ppe {
            for j in 0..np {
                out.push((MatrixFile::G(j), Matrix::from_fn(nu, nu, |r, c| wave(j + c, r, 1e-3))));
            }
        }
        out
    }

    pub fn builder(&self) -> ArchiveBuilder {
        self.matrices()
            .iter()
            .fold(ArchiveBuilder::new(), |b, (file, m)| b.matrix(*file, m))
    }
}
