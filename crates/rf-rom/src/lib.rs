//! Reduced-order model assembly and online evaluation.
//!
//! This crate owns the protocol that loads a decoded model archive into a
//! numeric engine (`assemble`) and the `RomEngine` seam the protocol drives.
//! `NativeRomEngine` is the bundled engine: it solves the reduced
//! Navier-Stokes system with a Newton iteration, predicts turbulent-viscosity
//! coefficients with Gaussian RBF interpolation, and reconstructs full-order
//! fields from the eigenmode bases.

pub mod assemble;
pub mod engine;
pub mod error;
pub mod jacobian;
pub mod native;
pub mod newton;
pub mod rbf;

pub use assemble::{AssembledRom, AssemblyProtocol, AssemblyStage, assemble};
pub use engine::{
    AppendSequence, EngineFactory, MatrixSlot, OnlineSolution, Reconstruction, RomEngine,
};
pub use error::{RomError, RomResult};
pub use native::{NativeEngineConfig, NativeRomEngine};
pub use newton::{NewtonConfig, NewtonResult};
pub use rbf::RbfInterpolator;
