//! Online solve and reconstruction with the native engine.

use rf_archive::fixtures::SyntheticRom;
use rf_archive::{Stabilization, open_model};
use rf_rom::{AssembledRom, NativeEngineConfig, NativeRomEngine, RomError, assemble};

const N_CELLS: usize = 12;

fn assembled(recipe: SyntheticRom) -> AssembledRom {
    let (topology, archive) = open_model(recipe.builder().to_zip_bytes().unwrap()).unwrap();
    assemble(Box::new(NativeRomEngine::default()), &topology, &archive).unwrap()
}

#[test]
fn identical_archives_give_bit_identical_fields() {
    for stabilization in [Stabilization::Ppe, Stabilization::Supremizer] {
        let recipe = SyntheticRom::new(stabilization, N_CELLS);
        let first = assembled(recipe).evaluate(0.05, [1.0, 0.2]).unwrap();
        let second = assembled(recipe).evaluate(0.05, [1.0, 0.2]).unwrap();

        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first.velocity), bits(&second.velocity));
        assert_eq!(
            bits(first.pressure.as_deref().unwrap()),
            bits(second.pressure.as_deref().unwrap())
        );
        assert_eq!(bits(first.nut.as_deref().unwrap()), bits(second.nut.as_deref().unwrap()));
    }
}

#[test]
fn reconstruction_is_sized_to_the_mesh() {
    let mut rom = assembled(SyntheticRom::new(Stabilization::Supremizer, N_CELLS));
    let fields = rom.evaluate(0.1, [0.8, 0.0]).unwrap();
    assert_eq!(fields.velocity.len(), 3 * N_CELLS);
    assert_eq!(fields.pressure.unwrap().len(), N_CELLS);
    assert_eq!(fields.nut.unwrap().len(), N_CELLS);
}

#[test]
fn boundary_coefficients_match_inlet_velocity() {
    for stabilization in [Stabilization::Ppe, Stabilization::Supremizer] {
        let recipe = SyntheticRom::new(stabilization, 0);
        let mut rom = assembled(recipe);
        let solution = rom.solve(0.2, [1.25, -0.5]).unwrap();

        assert!((solution.a[0] - 1.25).abs() < 1e-9);
        assert!((solution.a[1] + 0.5).abs() < 1e-9);
        assert_eq!(solution.b.len(), recipe.n_phi_p());
        assert_eq!(solution.g_nut.len(), recipe.n_phi_nut);
        assert!(solution.residual_norm < 1e-8);
    }
}

#[test]
fn tighter_newton_tolerance_still_converges() {
    let recipe = SyntheticRom::new(Stabilization::Ppe, N_CELLS);
    let (topology, archive) = open_model(recipe.builder().to_zip_bytes().unwrap()).unwrap();
    let mut config = NativeEngineConfig::default();
    config.newton.abs_tol = 1e-12;
    config.newton.rel_tol = 0.0;
    let mut rom = assemble(Box::new(NativeRomEngine::new(config)), &topology, &archive).unwrap();
    let solution = rom.solve(0.1, [1.0, 0.5]).unwrap();
    assert!(solution.residual_norm < 1e-12);
}

#[test]
fn viscosity_changes_the_solution() {
    let mut rom = assembled(SyntheticRom::new(Stabilization::Ppe, N_CELLS));
    let low = rom.evaluate(0.05, [1.0, 0.0]).unwrap();
    let high = rom.evaluate(0.5, [1.0, 0.0]).unwrap();
    assert_ne!(low.pressure, high.pressure);
}

#[test]
fn non_positive_viscosity_is_rejected() {
    let mut rom = assembled(SyntheticRom::new(Stabilization::Ppe, N_CELLS));
    assert!(matches!(rom.evaluate(0.0, [1.0, 0.0]), Err(RomError::Core(_))));
}

#[test]
fn model_without_velocity_basis_cannot_reconstruct() {
    let mut rom = assembled(SyntheticRom::new(Stabilization::Supremizer, 0));
    assert!(matches!(
        rom.evaluate(0.1, [1.0, 0.0]),
        Err(RomError::MissingModes { what: "velocity" })
    ));
}
