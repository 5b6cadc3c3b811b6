//! Assembly protocol against a recording engine.

use std::sync::{Arc, Mutex};

use rf_archive::fixtures::SyntheticRom;
use rf_archive::{ArchiveError, Matrix, MatrixFile, ModelArchive, ModelTopology, Stabilization, open_model};
use rf_rom::{
    AppendSequence, MatrixSlot, OnlineSolution, Reconstruction, RomEngine, RomError, RomResult, assemble,
};

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Initialize,
    Set(MatrixSlot),
    Append(AppendSequence),
    FinalizeRbf,
}

/// Records every call; optionally misreports one append position.
struct RecordingEngine {
    log: Arc<Mutex<Vec<Call>>>,
    counts: [usize; 5],
    skew: Option<(AppendSequence, usize)>,
}

impl RecordingEngine {
    fn new(log: Arc<Mutex<Vec<Call>>>) -> Self {
        Self {
            log,
            counts: [0; 5],
            skew: None,
        }
    }

    fn push(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

fn slot(sequence: AppendSequence) -> usize {
    AppendSequence::ALL.iter().position(|s| *s == sequence).unwrap()
}

impl RomEngine for RecordingEngine {
    fn initialize(&mut self, _topology: &ModelTopology) -> RomResult<()> {
        self.push(Call::Initialize);
        Ok(())
    }

    fn set_matrix(&mut self, slot: MatrixSlot, _matrix: &Matrix) -> RomResult<()> {
        self.push(Call::Set(slot));
        Ok(())
    }

    fn append(&mut self, sequence: AppendSequence, _matrix: &Matrix) -> RomResult<usize> {
        self.push(Call::Append(sequence));
        let position = self.counts[slot(sequence)];
        self.counts[slot(sequence)] += 1;
        match self.skew {
            Some((s, at)) if s == sequence && at == position => Ok(position + 1),
            _ => Ok(position),
        }
    }

    fn finalize_rbf(&mut self) -> RomResult<()> {
        self.push(Call::FinalizeRbf);
        Ok(())
    }

    fn set_viscosity(&mut self, _nu: f64) -> RomResult<()> {
        Ok(())
    }

    fn solve_online(&mut self, _velocity: [f64; 2]) -> RomResult<OnlineSolution> {
        Err(RomError::Protocol {
            what: "recording engine cannot solve".to_string(),
        })
    }

    fn reconstruct(&self) -> RomResult<Reconstruction> {
        Ok(Reconstruction::default())
    }
}

fn record(recipe: SyntheticRom) -> (ModelTopology, Vec<Call>) {
    let (topology, archive) = open_model(recipe.builder().to_zip_bytes().unwrap()).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    assemble(Box::new(RecordingEngine::new(log.clone())), &topology, &archive).unwrap();
    let calls = log.lock().unwrap().clone();
    (topology, calls)
}

fn appends(calls: &[Call], sequence: AppendSequence) -> usize {
    calls.iter().filter(|c| **c == Call::Append(sequence)).count()
}

#[test]
fn ppe_assembly_registers_exact_counts() {
    let (t, calls) = record(SyntheticRom::new(Stabilization::Ppe, 0));
    assert_eq!(appends(&calls, AppendSequence::Weights), t.n_phi_nut);
    assert_eq!(appends(&calls, AppendSequence::C), t.n_phi_u);
    assert_eq!(appends(&calls, AppendSequence::Ct1), t.n_phi_u);
    assert_eq!(appends(&calls, AppendSequence::Ct2), t.n_phi_u);
    assert_eq!(appends(&calls, AppendSequence::G), t.n_phi_p);
    assert!(calls.contains(&Call::Set(MatrixSlot::D)));
    assert!(calls.contains(&Call::Set(MatrixSlot::Bc3)));
    assert!(!calls.contains(&Call::Set(MatrixSlot::P)));
}

#[test]
fn supremizer_assembly_skips_ppe_steps() {
    let (t, calls) = record(SyntheticRom::new(Stabilization::Supremizer, 0));
    assert_eq!(appends(&calls, AppendSequence::G), 0);
    assert_eq!(appends(&calls, AppendSequence::C), t.n_phi_u);
    assert!(calls.contains(&Call::Set(MatrixSlot::P)));
    assert!(!calls.contains(&Call::Set(MatrixSlot::D)));
}

#[test]
fn calls_follow_protocol_order() {
    let (t, calls) = record(SyntheticRom::new(Stabilization::Ppe, 6));
    assert_eq!(calls.first(), Some(&Call::Initialize));
    assert_eq!(calls.last(), Some(&Call::FinalizeRbf));
    assert_eq!(
        &calls[1..6],
        &[
            Call::Set(MatrixSlot::K),
            Call::Set(MatrixSlot::B),
            Call::Set(MatrixSlot::Bt),
            Call::Set(MatrixSlot::CoeffL2),
            Call::Set(MatrixSlot::Mu),
        ]
    );

    let pos = |call: &Call| calls.iter().position(|c| c == call).unwrap();
    let last_weight = calls
        .iter()
        .rposition(|c| *c == Call::Append(AppendSequence::Weights))
        .unwrap();
    assert!(pos(&Call::Set(MatrixSlot::ModesNut)) < pos(&Call::Append(AppendSequence::Weights)));
    assert!(last_weight < pos(&Call::Append(AppendSequence::C)));

    // C, Ct1, Ct2 interleave per velocity mode.
    let tensors: Vec<&Call> = calls
        .iter()
        .filter(|c| {
            matches!(
                c,
                Call::Append(AppendSequence::C | AppendSequence::Ct1 | AppendSequence::Ct2)
            )
        })
        .collect();
    assert_eq!(tensors.len(), 3 * t.n_phi_u);
    for chunk in tensors.chunks(3) {
        assert_eq!(
            chunk,
            [
                &Call::Append(AppendSequence::C),
                &Call::Append(AppendSequence::Ct1),
                &Call::Append(AppendSequence::Ct2)
            ]
        );
    }
}

#[test]
fn missing_tensor_slice_aborts_assembly() {
    let mut recipe = SyntheticRom::new(Stabilization::Supremizer, 0);
    recipe.n_phi_u = 5;
    let (topology, _) = open_model(recipe.builder().to_zip_bytes().unwrap()).unwrap();

    // Hand-built archive that bypassed the load plan.
    let mut archive = ModelArchive::default();
    for (file, matrix) in recipe.matrices() {
        if file != MatrixFile::C(3) {
            archive.insert(file, matrix);
        }
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    let err = assemble(Box::new(RecordingEngine::new(log.clone())), &topology, &archive).unwrap_err();
    assert!(matches!(
        err,
        RomError::Archive(ArchiveError::MissingMatrix(ref name)) if name == "C3_mat.txt"
    ));
    let calls = log.lock().unwrap();
    assert_eq!(appends(&calls, AppendSequence::C), 3);
    assert!(!calls.contains(&Call::FinalizeRbf));
}

#[test]
fn misreported_position_aborts_assembly() {
    let recipe = SyntheticRom::new(Stabilization::Ppe, 0);
    let (topology, archive) = open_model(recipe.builder().to_zip_bytes().unwrap()).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut engine = RecordingEngine::new(log.clone());
    engine.skew = Some((AppendSequence::Ct1, 2));

    let err = assemble(Box::new(engine), &topology, &archive).unwrap_err();
    assert!(matches!(
        err,
        RomError::AppendOutOfSequence {
            sequence: AppendSequence::Ct1,
            expected: 2,
            actual: 3
        }
    ));
    // Nothing after the failing append reached the engine.
    let calls = log.lock().unwrap();
    assert_eq!(calls.last(), Some(&Call::Append(AppendSequence::Ct1)));
    assert!(!calls.contains(&Call::FinalizeRbf));
}
