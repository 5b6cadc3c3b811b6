//! Archive file-name convention.

use std::fmt;

/// Every matrix file a model archive may carry.
///
/// Indexed variants are the per-mode entries registered through the ordered
/// append sequences during assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatrixFile {
    K,
    B,
    Bt,
    CoeffL2,
    /// Training parameter samples (`par.txt`), set on the engine as `mu`.
    Par,
    D,
    Bc3,
    P,
    ModesU,
    ModesP,
    ModesNut,
    /// RBF weights for turbulent-viscosity mode `i`.
    Weights(usize),
    C(usize),
    Ct1(usize),
    Ct2(usize),
    G(usize),
}

impl MatrixFile {
    /// The five entries every archive must contain.
    pub const MANDATORY: [MatrixFile; 5] = [
        MatrixFile::K,
        MatrixFile::B,
        MatrixFile::Bt,
        MatrixFile::CoeffL2,
        MatrixFile::Par,
    ];

    /// Optional eigenmode bases.
    pub const MODES: [MatrixFile; 3] = [MatrixFile::ModesU, MatrixFile::ModesP, MatrixFile::ModesNut];

    /// The file whose presence selects the PPE topology.
    pub const PPE_MARKER: MatrixFile = MatrixFile::G(0);

    pub fn file_name(&self) -> String {
        match self {
            MatrixFile::K => "K_mat.txt".to_string(),
            MatrixFile::B => "B_mat.txt".to_string(),
            MatrixFile::Bt => "bt_mat.txt".to_string(),
            MatrixFile::CoeffL2 => "coeffL2_mat.txt".to_string(),
            MatrixFile::Par => "par.txt".to_string(),
            MatrixFile::D => "D_mat.txt".to_string(),
            MatrixFile::Bc3 => "BC3_mat.txt".to_string(),
            MatrixFile::P => "P_mat.txt".to_string(),
            MatrixFile::ModesU => "EigenModes_U_mat.txt".to_string(),
            MatrixFile::ModesP => "EigenModes_p_mat.txt".to_string(),
            MatrixFile::ModesNut => "EigenModes_nut_mat.txt".to_string(),
            MatrixFile::Weights(i) => format!("wRBF_{i}_mat.txt"),
            MatrixFile::C(i) => format!("C{i}_mat.txt"),
            MatrixFile::Ct1(i) => format!("ct1_{i}_mat.txt"),
            MatrixFile::Ct2(i) => format!("ct2_{i}_mat.txt"),
            MatrixFile::G(i) => format!("G{i}_mat.txt"),
        }
    }
}

impl fmt::Display for MatrixFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_names_follow_convention() {
        assert_eq!(MatrixFile::Weights(3).file_name(), "wRBF_3_mat.txt");
        assert_eq!(MatrixFile::C(12).file_name(), "C12_mat.txt");
        assert_eq!(MatrixFile::Ct1(0).file_name(), "ct1_0_mat.txt");
        assert_eq!(MatrixFile::Ct2(4).file_name(), "ct2_4_mat.txt");
        assert_eq!(MatrixFile::PPE_MARKER.file_name(), "G0_mat.txt");
    }

    #[test]
    fn mandatory_set() {
        let names: Vec<String> = MatrixFile::MANDATORY.iter().map(|f| f.to_string()).collect();
        assert_eq!(
            names,
            ["K_mat.txt", "B_mat.txt", "bt_mat.txt", "coeffL2_mat.txt", "par.txt"]
        );
    }
}
