//! Archive loading against synthetic bundles.

use rf_archive::fixtures::SyntheticRom;
use rf_archive::{
    ArchiveError, ArchiveReader, MatrixFile, Stabilization, load_from_reader, open_model,
};

#[test]
fn ppe_archive_never_reads_p() {
    // A malformed P next to G0 must not matter: PPE never touches it.
    let bytes = SyntheticRom::new(Stabilization::Ppe, 4)
        .builder()
        .text("P_mat.txt", "not a number\n")
        .to_zip_bytes()
        .unwrap();

    let mut reader = ArchiveReader::from_bytes(bytes).unwrap();
    let (topology, archive) = load_from_reader(&mut reader).unwrap();

    assert_eq!(topology.stabilization, Stabilization::Ppe);
    assert!(!archive.has(MatrixFile::P));
    assert!(reader.entries_read().iter().all(|n| n != "P_mat.txt"));
    assert!(reader.entries_read().iter().any(|n| n == "G1_mat.txt"));
}

#[test]
fn supremizer_archive_never_reads_ppe_files() {
    let bytes = SyntheticRom::new(Stabilization::Supremizer, 4)
        .builder()
        .text("D_mat.txt", "x\n")
        .text("BC3_mat.txt", "y\n")
        .text("G1_mat.txt", "z\n")
        .to_zip_bytes()
        .unwrap();

    let mut reader = ArchiveReader::from_bytes(bytes).unwrap();
    let (topology, _) = load_from_reader(&mut reader).unwrap();

    assert_eq!(topology.stabilization, Stabilization::Supremizer);
    for name in reader.entries_read() {
        assert!(
            name != "D_mat.txt" && name != "BC3_mat.txt" && !name.starts_with('G'),
            "unexpected read of {name}"
        );
    }
}

#[test]
fn missing_per_mode_file_fails_instead_of_registering_fewer_modes() {
    let mut recipe = SyntheticRom::new(Stabilization::Supremizer, 0);
    recipe.n_phi_u = 5;
    let bytes = recipe
        .builder()
        .without(MatrixFile::C(3))
        .to_zip_bytes()
        .unwrap();

    match open_model(bytes) {
        Err(ArchiveError::MissingMatrix(name)) => assert_eq!(name, "C3_mat.txt"),
        other => panic!("expected MissingMatrix, got {other:?}"),
    }
}

#[test]
fn missing_mandatory_file_is_incomplete_archive() {
    let bytes = SyntheticRom::new(Stabilization::Ppe, 0)
        .builder()
        .without(MatrixFile::CoeffL2)
        .to_zip_bytes()
        .unwrap();

    match open_model(bytes) {
        Err(ArchiveError::IncompleteArchive { missing }) => {
            assert_eq!(missing, vec!["coeffL2_mat.txt".to_string()]);
        }
        other => panic!("expected IncompleteArchive, got {other:?}"),
    }
}

#[test]
fn malformed_planned_file_reports_its_name_and_position() {
    let bytes = SyntheticRom::new(Stabilization::Supremizer, 0)
        .builder()
        .text("ct1_2_mat.txt", "0.1 0.2 0.3 0.4\n0.5 NaNx 0.7 0.8\n")
        .to_zip_bytes()
        .unwrap();

    match open_model(bytes) {
        Err(ArchiveError::Parse { name, row, col }) => {
            assert_eq!(name, "ct1_2_mat.txt");
            assert_eq!((row, col), (1, 1));
        }
        other => panic!("expected Parse, got {other:?}"),
    }
}

#[test]
fn optional_modes_are_flagged_by_presence() {
    let bytes = SyntheticRom::new(Stabilization::Ppe, 3)
        .builder()
        .without(MatrixFile::ModesP)
        .to_zip_bytes()
        .unwrap();

    let (_, archive) = open_model(bytes).unwrap();
    assert!(archive.has_velocity_modes());
    assert!(!archive.has_pressure_modes());
    assert!(archive.has_nut_modes());
}
