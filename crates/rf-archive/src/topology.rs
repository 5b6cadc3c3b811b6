//! Model topology resolution.

use std::fmt;

use tracing::info;

use crate::error::{ArchiveError, ArchiveResult};
use crate::matrix::Matrix;
use crate::names::MatrixFile;

/// Number of boundary-condition coefficients (two inlet-velocity components).
pub const N_BC: usize = 2;

/// Pressure stabilization scheme the offline stage trained the model with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stabilization {
    /// Pressure Poisson equation: needs `D`, `BC3` and the `G` tensor.
    Ppe,
    /// Supremizer enrichment: needs `P`.
    Supremizer,
}

impl fmt::Display for Stabilization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stabilization::Ppe => f.write_str("PPE"),
            Stabilization::Supremizer => f.write_str("supremizer"),
        }
    }
}

/// Shape of a reduced model, derived once from the archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelTopology {
    pub stabilization: Stabilization,
    /// Velocity modes.
    pub n_phi_u: usize,
    /// Pressure modes.
    pub n_phi_p: usize,
    /// Turbulent-viscosity modes.
    pub n_phi_nut: usize,
    /// Offline training snapshots.
    pub n_runs: usize,
    pub n_bc: usize,
}

/// Mandatory matrices needed to resolve a topology.
pub struct MandatoryMatrices<'a> {
    pub k: Option<&'a Matrix>,
    pub b: Option<&'a Matrix>,
    pub bt: Option<&'a Matrix>,
    pub coeff_l2: Option<&'a Matrix>,
    pub par: Option<&'a Matrix>,
}

/// Pick the stabilization scheme and derive mode counts.
///
/// `has_ppe_marker` is whether `G0_mat.txt` exists in the archive.
pub fn resolve_topology(
    has_ppe_marker: bool,
    mandatory: &MandatoryMatrices<'_>,
) -> ArchiveResult<ModelTopology> {
    let slots = [
        (MatrixFile::K, mandatory.k),
        (MatrixFile::B, mandatory.b),
        (MatrixFile::Bt, mandatory.bt),
        (MatrixFile::CoeffL2, mandatory.coeff_l2),
        (MatrixFile::Par, mandatory.par),
    ];
    let missing: Vec<String> = slots
        .iter()
        .filter(|(_, m)| m.is_none())
        .map(|(f, _)| f.file_name())
        .collect();

    let (Some(k), Some(b), Some(_), Some(coeff_l2), Some(_)) = (
        mandatory.k,
        mandatory.b,
        mandatory.bt,
        mandatory.coeff_l2,
        mandatory.par,
    ) else {
        return Err(ArchiveError::IncompleteArchive { missing });
    };

    let stabilization = if has_ppe_marker {
        Stabilization::Ppe
    } else {
        Stabilization::Supremizer
    };

    let topology = ModelTopology {
        stabilization,
        n_phi_u: b.rows(),
        n_phi_p: k.cols(),
        n_phi_nut: coeff_l2.rows(),
        n_runs: coeff_l2.cols(),
        n_bc: N_BC,
    };

    if topology.n_phi_u < topology.n_bc {
        return Err(ArchiveError::Shape {
            what: format!(
                "B has {} velocity modes, fewer than the {} boundary coefficients",
                topology.n_phi_u, topology.n_bc
            ),
        });
    }

    info!(
        stabilization = %topology.stabilization,
        n_phi_u = topology.n_phi_u,
        n_phi_p = topology.n_phi_p,
        n_phi_nut = topology.n_phi_nut,
        n_runs = topology.n_runs,
        "resolved model topology"
    );
    Ok(topology)
}
