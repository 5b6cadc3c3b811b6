//! Load plan and the decoded model archive.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{ArchiveError, ArchiveResult};
use crate::matrix::Matrix;
use crate::names::MatrixFile;
use crate::reader::ArchiveReader;
use crate::topology::{MandatoryMatrices, ModelTopology, Stabilization, resolve_topology};

/// Every file an assembly of a given topology will consume, in assembly order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadPlan {
    files: Vec<MatrixFile>,
}

impl LoadPlan {
    /// Build the plan for `topology`. `present` reports which optional
    /// eigenmode files the archive carries.
    pub fn for_topology(topology: &ModelTopology, present: impl Fn(MatrixFile) -> bool) -> Self {
        let mut files = MatrixFile::MANDATORY.to_vec();

        match topology.stabilization {
            Stabilization::Ppe => files.extend([MatrixFile::D, MatrixFile::Bc3]),
            Stabilization::Supremizer => files.push(MatrixFile::P),
        }

        files.extend(MatrixFile::MODES.into_iter().filter(|&f| present(f)));
        files.extend((0..topology.n_phi_nut).map(MatrixFile::Weights));
        for i in 0..topology.n_phi_u {
            files.extend([MatrixFile::C(i), MatrixFile::Ct1(i), MatrixFile::Ct2(i)]);
        }
        if topology.stabilization == Stabilization::Ppe {
            files.extend((0..topology.n_phi_p).map(MatrixFile::G));
        }

        Self { files }
    }

    pub fn files(&self) -> &[MatrixFile] {
        &self.files
    }

    pub fn contains(&self, file: MatrixFile) -> bool {
        self.files.contains(&file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Decoded matrices keyed by file, plus presence flags for the optional bases.
///
/// Only lives for the duration of a model load.
#[derive(Clone, Debug, Default)]
pub struct ModelArchive {
    matrices: HashMap<MatrixFile, Matrix>,
}

impl ModelArchive {
    /// Decode every file in `plan` that has not been decoded yet.
    pub fn load(reader: &mut ArchiveReader, plan: &LoadPlan, mut seed: ModelArchive) -> ArchiveResult<Self> {
        let pending: Vec<MatrixFile> = plan
            .files()
            .iter()
            .copied()
            .filter(|f| !seed.matrices.contains_key(f))
            .collect();
        debug!(count = pending.len(), "decoding archive entries");
        for (file, matrix) in reader.read_matrices(&pending)? {
            seed.matrices.insert(file, matrix);
        }
        Ok(seed)
    }

    pub fn insert(&mut self, file: MatrixFile, matrix: Matrix) {
        self.matrices.insert(file, matrix);
    }

    pub fn get(&self, file: MatrixFile) -> ArchiveResult<&Matrix> {
        self.matrices
            .get(&file)
            .ok_or_else(|| ArchiveError::MissingMatrix(file.file_name()))
    }

    pub fn has(&self, file: MatrixFile) -> bool {
        self.matrices.contains_key(&file)
    }

    pub fn has_velocity_modes(&self) -> bool {
        self.has(MatrixFile::ModesU)
    }

    pub fn has_pressure_modes(&self) -> bool {
        self.has(MatrixFile::ModesP)
    }

    pub fn has_nut_modes(&self) -> bool {
        self.has(MatrixFile::ModesNut)
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

/// Resolve the topology and decode everything its assembly needs.
///
/// Mandatory files are decoded first so the topology can be derived; the rest
/// of the plan is decoded afterwards. Files outside the plan are never read.
pub fn load_from_reader(reader: &mut ArchiveReader) -> ArchiveResult<(ModelTopology, ModelArchive)> {
    let present: Vec<MatrixFile> = MatrixFile::MANDATORY
        .into_iter()
        .filter(|&f| reader.contains(f))
        .collect();

    let mut archive = ModelArchive::default();
    for (file, matrix) in reader.read_matrices(&present)? {
        archive.insert(file, matrix);
    }

    let mandatory = MandatoryMatrices {
        k: archive.matrices.get(&MatrixFile::K),
        b: archive.matrices.get(&MatrixFile::B),
        bt: archive.matrices.get(&MatrixFile::Bt),
        coeff_l2: archive.matrices.get(&MatrixFile::CoeffL2),
        par: archive.matrices.get(&MatrixFile::Par),
    };
    let topology = resolve_topology(reader.contains(MatrixFile::PPE_MARKER), &mandatory)?;

    let plan = LoadPlan::for_topology(&topology, |f| reader.contains(f));
    let archive = ModelArchive::load(reader, &plan, archive)?;
    info!(matrices = archive.len(), "model archive decoded");
    Ok((topology, archive))
}

/// Open an in-memory ZIP bundle and decode it.
pub fn open_model(bytes: Vec<u8>) -> ArchiveResult<(ModelTopology, ModelArchive)> {
    let mut reader = ArchiveReader::from_bytes(bytes)?;
    load_from_reader(&mut reader)
}
