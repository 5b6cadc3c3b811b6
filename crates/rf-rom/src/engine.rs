//! The numeric engine seam driven by the assembly protocol.

use std::fmt;

use rf_archive::{Matrix, MatrixFile, ModelTopology};

use crate::error::RomResult;

/// Matrices set directly on the engine (as opposed to appended per mode).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatrixSlot {
    K,
    B,
    Bt,
    CoeffL2,
    /// Training parameter samples, read from `par.txt`.
    Mu,
    D,
    Bc3,
    P,
    ModesU,
    ModesP,
    ModesNut,
}

impl MatrixSlot {
    /// Archive file the slot is filled from.
    pub fn file(self) -> MatrixFile {
        match self {
            MatrixSlot::K => MatrixFile::K,
            MatrixSlot::B => MatrixFile::B,
            MatrixSlot::Bt => MatrixFile::Bt,
            MatrixSlot::CoeffL2 => MatrixFile::CoeffL2,
            MatrixSlot::Mu => MatrixFile::Par,
            MatrixSlot::D => MatrixFile::D,
            MatrixSlot::Bc3 => MatrixFile::Bc3,
            MatrixSlot::P => MatrixFile::P,
            MatrixSlot::ModesU => MatrixFile::ModesU,
            MatrixSlot::ModesP => MatrixFile::ModesP,
            MatrixSlot::ModesNut => MatrixFile::ModesNut,
        }
    }
}

/// Per-mode matrices registered through ordered appends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AppendSequence {
    /// RBF weights, one per turbulent-viscosity mode.
    Weights,
    /// Convective tensor slices, one per velocity mode.
    C,
    /// First turbulent tensor slices, one per velocity mode.
    Ct1,
    /// Second turbulent tensor slices, one per velocity mode.
    Ct2,
    /// PPE pressure tensor slices, one per pressure mode.
    G,
}

impl AppendSequence {
    pub const ALL: [AppendSequence; 5] = [
        AppendSequence::Weights,
        AppendSequence::C,
        AppendSequence::Ct1,
        AppendSequence::Ct2,
        AppendSequence::G,
    ];

    /// Archive file holding entry `index` of this sequence.
    pub fn file(self, index: usize) -> MatrixFile {
        match self {
            AppendSequence::Weights => MatrixFile::Weights(index),
            AppendSequence::C => MatrixFile::C(index),
            AppendSequence::Ct1 => MatrixFile::Ct1(index),
            AppendSequence::Ct2 => MatrixFile::Ct2(index),
            AppendSequence::G => MatrixFile::G(index),
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AppendSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppendSequence::Weights => "Weights",
            AppendSequence::C => "C",
            AppendSequence::Ct1 => "Ct1",
            AppendSequence::Ct2 => "Ct2",
            AppendSequence::G => "G",
        };
        f.write_str(s)
    }
}

/// Reduced coefficients from one online solve.
#[derive(Clone, Debug, PartialEq)]
pub struct OnlineSolution {
    /// Velocity coefficients.
    pub a: Vec<f64>,
    /// Pressure coefficients.
    pub b: Vec<f64>,
    /// Turbulent-viscosity coefficients predicted by the RBF.
    pub g_nut: Vec<f64>,
    pub iterations: usize,
    pub residual_norm: f64,
}

/// Full-order fields projected back from the reduced solution.
///
/// Velocity uses blocked layout: all x components, then all y, then all z.
/// Pressure and turbulent viscosity are present only when the archive
/// shipped their bases.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reconstruction {
    pub velocity: Vec<f64>,
    pub pressure: Option<Vec<f64>>,
    pub nut: Option<Vec<f64>>,
}

/// Capabilities the assembly protocol and the evaluator need from a ROM engine.
///
/// Engines are stateful and not idempotent: `initialize` must come first,
/// appends register matrices at consecutive positions, and a failure at any
/// point leaves the instance unusable.
pub trait RomEngine: Send {
    /// Allocate storage for `topology`. Must precede every other call.
    fn initialize(&mut self, topology: &ModelTopology) -> RomResult<()>;

    /// Set a directly addressed matrix.
    fn set_matrix(&mut self, slot: MatrixSlot, matrix: &Matrix) -> RomResult<()>;

    /// Register the next matrix of `sequence`, returning the 0-based position
    /// it was stored at.
    fn append(&mut self, sequence: AppendSequence, matrix: &Matrix) -> RomResult<usize>;

    /// Build the RBF interpolation structures from the appended weights.
    fn finalize_rbf(&mut self) -> RomResult<()>;

    fn set_viscosity(&mut self, nu: f64) -> RomResult<()>;

    /// Solve the reduced system for the inlet `velocity`.
    fn solve_online(&mut self, velocity: [f64; 2]) -> RomResult<OnlineSolution>;

    /// Project the latest online solution onto the eigenmode bases.
    ///
    /// Fails with `MissingModes` when no velocity basis was set.
    fn reconstruct(&self) -> RomResult<Reconstruction>;
}

/// Creates a fresh engine for each assembly attempt.
pub type EngineFactory = Box<dyn Fn() -> Box<dyn RomEngine> + Send + Sync>;
