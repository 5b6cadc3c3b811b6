//! Ordered assembly of a decoded archive into a ROM engine.
//!
//! The engine is stateful and not idempotent, so every step is checked
//! against an [`AssemblyProtocol`] before it reaches the engine, and every
//! append position and count is verified after it. The first failure aborts
//! assembly and drops the engine.

use rf_archive::{ModelArchive, ModelTopology, Stabilization};
use tracing::{debug, info};

use crate::engine::{AppendSequence, MatrixSlot, OnlineSolution, Reconstruction, RomEngine};
use crate::error::{RomError, RomResult};

/// Assembly steps in the only order the engine accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssemblyStage {
    Fresh,
    Initialized,
    BaseMatrices,
    Stabilization,
    Modes,
    Weights,
    Tensors,
    Pressure,
    RbfFinalized,
}

/// Tracks assembly progress and rejects out-of-order steps.
#[derive(Clone, Debug)]
pub struct AssemblyProtocol {
    topology: ModelTopology,
    stage: AssemblyStage,
    counts: [usize; 5],
}

impl AssemblyProtocol {
    pub fn new(topology: ModelTopology) -> Self {
        Self {
            topology,
            stage: AssemblyStage::Fresh,
            counts: [0; 5],
        }
    }

    pub fn stage(&self) -> AssemblyStage {
        self.stage
    }

    /// Number of matrices registered so far in `sequence`.
    pub fn count(&self, sequence: AppendSequence) -> usize {
        self.counts[sequence.slot()]
    }

    /// Expected final length of `sequence` for this topology.
    pub fn expected(&self, sequence: AppendSequence) -> usize {
        let t = &self.topology;
        match sequence {
            AppendSequence::Weights => t.n_phi_nut,
            AppendSequence::C | AppendSequence::Ct1 | AppendSequence::Ct2 => t.n_phi_u,
            AppendSequence::G => match t.stabilization {
                Stabilization::Ppe => t.n_phi_p,
                Stabilization::Supremizer => 0,
            },
        }
    }

    /// Move to `next`, which must not precede the current stage.
    pub fn advance(&mut self, next: AssemblyStage) -> RomResult<()> {
        if self.stage == AssemblyStage::Fresh && next != AssemblyStage::Initialized {
            return Err(RomError::Protocol {
                what: format!("{next:?} requested before initialize"),
            });
        }
        if next < self.stage || (next == AssemblyStage::Initialized && self.stage != AssemblyStage::Fresh) {
            return Err(RomError::Protocol {
                what: format!("{next:?} requested after {:?}", self.stage),
            });
        }
        if next == AssemblyStage::RbfFinalized {
            self.check_complete(AppendSequence::Weights)?;
        }
        self.stage = next;
        Ok(())
    }

    /// Check an engine-reported append position against the loop index and
    /// record it.
    pub fn record_append(&mut self, sequence: AppendSequence, expected: usize, actual: usize) -> RomResult<()> {
        if actual != expected || self.count(sequence) != expected {
            return Err(RomError::AppendOutOfSequence {
                sequence,
                expected,
                actual,
            });
        }
        let limit = self.expected(sequence);
        if expected >= limit {
            return Err(RomError::AppendCount {
                sequence,
                expected: limit,
                actual: expected + 1,
            });
        }
        self.counts[sequence.slot()] += 1;
        Ok(())
    }

    /// Fail unless `sequence` holds exactly its expected number of matrices.
    pub fn check_complete(&self, sequence: AppendSequence) -> RomResult<()> {
        let expected = self.expected(sequence);
        let actual = self.count(sequence);
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
}

/// An engine that completed assembly.
pub struct AssembledRom {
    engine: Box<dyn RomEngine>,
    topology: ModelTopology,
}

impl AssembledRom {
    pub fn topology(&self) -> &ModelTopology {
        &self.topology
    }

    /// Set viscosity and solve the reduced system for `velocity`.
    pub fn solve(&mut self, viscosity: f64, velocity: [f64; 2]) -> RomResult<OnlineSolution> {
        self.engine.set_viscosity(viscosity)?;
        self.engine.solve_online(velocity)
    }

    /// Solve, then reconstruct the full-order fields.
    pub fn evaluate(&mut self, viscosity: f64, velocity: [f64; 2]) -> RomResult<Reconstruction> {
        self.solve(viscosity, velocity)?;
        self.engine.reconstruct()
    }
}

impl std::fmt::Debug for AssembledRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledRom")
            .field("topology", &self.topology)
            .finish_non_exhaustive()
    }
}

fn set(
    engine: &mut dyn RomEngine,
    archive: &ModelArchive,
    slot: MatrixSlot,
) -> RomResult<()> {
    let matrix = archive.get(slot.file())?;
    debug!(slot = ?slot, rows = matrix.rows(), cols = matrix.cols(), "set matrix");
    engine.set_matrix(slot, matrix)
}

fn append(
    engine: &mut dyn RomEngine,
    protocol: &mut AssemblyProtocol,
    archive: &ModelArchive,
    sequence: AppendSequence,
    index: usize,
) -> RomResult<()> {
    let matrix = archive.get(sequence.file(index))?;
    let position = engine.append(sequence, matrix)?;
    debug!(%sequence, index, position, "append");
    protocol.record_append(sequence, index, position)
}

/// Load `archive` into `engine` following the assembly protocol.
///
/// On error the engine is dropped; callers build a new one for the next
/// attempt.
pub fn assemble(
    mut engine: Box<dyn RomEngine>,
    topology: &ModelTopology,
    archive: &ModelArchive,
) -> RomResult<AssembledRom> {
    let mut protocol = AssemblyProtocol::new(*topology);
    let e = engine.as_mut();

    protocol.advance(AssemblyStage::Initialized)?;
    e.initialize(topology)?;

    protocol.advance(AssemblyStage::BaseMatrices)?;
    for slot in [
        MatrixSlot::K,
        MatrixSlot::B,
        MatrixSlot::Bt,
        MatrixSlot::CoeffL2,
        MatrixSlot::Mu,
    ] {
        set(e, archive, slot)?;
    }

    protocol.advance(AssemblyStage::Stabilization)?;
    match topology.stabilization {
        Stabilization::Ppe => {
            set(e, archive, MatrixSlot::D)?;
            set(e, archive, MatrixSlot::Bc3)?;
        }
        Stabilization::Supremizer => set(e, archive, MatrixSlot::P)?,
    }

    protocol.advance(AssemblyStage::Modes)?;
    for slot in [MatrixSlot::ModesU, MatrixSlot::ModesP, MatrixSlot::ModesNut] {
        if archive.has(slot.file()) {
            set(e, archive, slot)?;
        }
    }

    protocol.advance(AssemblyStage::Weights)?;
    for i in 0..topology.n_phi_nut {
        append(e, &mut protocol, archive, AppendSequence::Weights, i)?;
    }
    protocol.check_complete(AppendSequence::Weights)?;

    protocol.advance(AssemblyStage::Tensors)?;
    for i in 0..topology.n_phi_u {
        for sequence in [AppendSequence::C, AppendSequence::Ct1, AppendSequence::Ct2] {
            append(e, &mut protocol, archive, sequence, i)?;
        }
    }
    for sequence in [AppendSequence::C, AppendSequence::Ct1, AppendSequence::Ct2] {
        protocol.check_complete(sequence)?;
    }

    protocol.advance(AssemblyStage::Pressure)?;
    if topology.stabilization == Stabilization::Ppe {
        for j in 0..topology.n_phi_p {
            append(e, &mut protocol, archive, AppendSequence::G, j)?;
        }
    }
    protocol.check_complete(AppendSequence::G)?;

    protocol.advance(AssemblyStage::RbfFinalized)?;
    e.finalize_rbf()?;

    info!(
        stabilization = %topology.stabilization,
        n_phi_u = topology.n_phi_u,
        n_phi_p = topology.n_phi_p,
        n_phi_nut = topology.n_phi_nut,
        "model assembled"
    );
    Ok(AssembledRom {
        engine,
        topology: *topology,
    })
}
