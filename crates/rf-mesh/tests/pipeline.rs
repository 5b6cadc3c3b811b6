use proptest::prelude::*;
use rf_mesh::{
    CellLocator, ColorMode, FieldArray, IntegralSum, MeshError, StreamlineParams, UnstructuredGrid,
    cell_to_point, integrate_grid, integrate_poly, plane_cut, probe, render, surface, trace, tubes,
};

/// Two hexahedra side by side plus a wedge roof, as a JSON document.
const MIXED_GRID: &str = r#"{
  "points": [
    [0,0,0],[1,0,0],[2,0,0],[0,1,0],[1,1,0],[2,1,0],
    [0,0,1],[1,0,1],[2,0,1],[0,1,1],[1,1,1],[2,1,1],
    [0,0.5,2],[2,0.5,2]
  ],
  "cells": [
    { "kind": "hexahedron", "nodes": [0,1,4,3,6,7,10,9] },
    { "kind": "hexahedron", "nodes": [1,2,5,4,7,8,11,10] },
    { "kind": "wedge", "nodes": [6,12,9,8,13,11] }
  ],
  "cell_data": [
    { "name": "p", "components": 1, "values": [1.0, 2.0, 3.0] }
  ]
}"#;

fn chain(n: usize) -> UnstructuredGrid {
    UnstructuredGrid::structured_box([n, 1, 1], [0.0; 3], [n as f64, 1.0, 1.0]).unwrap()
}

#[test]
fn mixed_grid_document_loads_with_exact_volume() {
    let grid = UnstructuredGrid::from_json_str(MIXED_GRID).unwrap();
    assert_eq!(grid.n_cells(), 3);
    // two unit cubes and a prism of cross-section 0.5 over length 2
    assert!((grid.total_volume() - 3.0).abs() < 1e-12);
    assert_eq!(grid.cell_data()[0].name, "p");
}

#[test]
fn cell_data_averages_onto_points_for_render_range() {
    let grid = chain(10);
    let cells = FieldArray::new("s", 1, (0..10).map(f64::from).collect()).unwrap();
    let points = cell_to_point(&grid, &cells).unwrap();
    let rendered = render(&points, ColorMode::Magnitude, None).unwrap();
    assert_eq!(rendered.range, [0.0, 9.0]);
    assert_eq!(rendered.colors.len(), 4 * grid.n_points());
}

#[test]
fn uniform_scalar_integral_is_value_times_volume() {
    let grid = UnstructuredGrid::structured_box([2, 2, 2], [0.0; 3], [1.0; 3]).unwrap();
    let c = FieldArray::new("c", 1, vec![0.75; grid.n_points()]).unwrap();
    let integral = integrate_grid(&grid, &c).unwrap();
    assert!((integral.extent - 1.0).abs() < 1e-12);
    let IntegralSum::Scalar(v) = integral.sum else {
        panic!("scalar expected");
    };
    assert!((v - 0.75).abs() < 1e-12);
}

#[test]
fn surface_integral_uses_area() {
    let grid = UnstructuredGrid::structured_box([2, 2, 2], [0.0; 3], [1.0, 2.0, 3.0]).unwrap();
    let c = FieldArray::new("c", 1, vec![2.0; grid.n_points()]).unwrap();
    let skin = surface(&grid, &[c]).unwrap();
    let integral = integrate_poly(&skin, "c").unwrap();
    assert!((integral.extent - 22.0).abs() < 1e-12);
    assert!(matches!(integral.sum, IntegralSum::Scalar(v) if (v - 44.0).abs() < 1e-9));
}

#[test]
fn plane_cut_of_mixed_grid_crosses_both_hexahedra() {
    let grid = UnstructuredGrid::from_json_str(MIXED_GRID).unwrap();
    let p = cell_to_point(&grid, &grid.cell_data()[0]).unwrap();
    let cut = plane_cut(&grid, &[p], [1.0, 0.5, 0.5], [0.0, 0.0, 1.0]).unwrap();
    assert!((cut.area() - 2.0).abs() < 1e-9);
    assert_eq!(cut.point_field("p").unwrap().n_tuples(), cut.n_points());
}

#[test]
fn streamline_tubes_carry_the_flow() {
    let grid = chain(6);
    let locator = CellLocator::new(&grid, 1e-9);
    let u = FieldArray::new(
        "U",
        3,
        grid.points().iter().flat_map(|p| [1.0 + 0.1 * p.x, 0.0, 0.0]).collect(),
    )
    .unwrap();
    let params = StreamlineParams {
        center: [1.0, 0.5, 0.5],
        radius: 0.2,
        propagation: 3.0,
        resolution: 5,
        initial_step: 0.5,
        min_step: 0.1,
        max_steps: 500,
    };
    let lines = trace(&grid, &locator, &[u], "U", &params).unwrap();
    assert_eq!(lines.lines.len(), 2 + 5 * 3);
    let tube = tubes(&lines, "U", 0.01, 8).unwrap();
    assert_eq!(tube.n_points(), 8 * lines.n_points());
    assert!(!tube.polys.is_empty());
}

#[test]
fn probing_outside_reports_the_point() {
    let grid = chain(2);
    let locator = CellLocator::new(&grid, 1e-6);
    let s = FieldArray::new("s", 1, vec![0.0; grid.n_points()]).unwrap();
    match probe(&grid, &locator, &s, [0.5, 0.5, 7.0]) {
        Err(MeshError::OutOfDomain { point }) => assert_eq!(point, [0.5, 0.5, 7.0]),
        other => panic!("expected OutOfDomain, got {other:?}"),
    }
}

proptest! {
    #[test]
    fn colors_stay_in_unit_interval(
        values in prop::collection::vec(-1e6f64..1e6, 1..64),
        lo in -10.0f64..0.0,
        width in 0.0f64..20.0,
        explicit in any::<bool>(),
    ) {
        let f = FieldArray::new("s", 1, values).unwrap();
        let range = explicit.then_some([lo, lo + width]);
        let r = render(&f, ColorMode::Magnitude, range).unwrap();
        prop_assert_eq!(r.colors.len(), 4 * f.n_tuples());
        prop_assert!(r.colors.iter().all(|c| (0.0..=1.0).contains(c)));
        prop_assert!(r.range[0] <= r.range[1]);
    }
}
