//! Small hand-checked inputs with known outputs.

use tilecorr::{
    compare, Baseline, Grid, Kernel, Mismatch, Problem, TileShape, TiledConfig, TiledEvaluator,
    Verdict, DEFAULT_TOLERANCE,
};

fn tiled(tile: usize) -> TiledEvaluator {
    TiledEvaluator::new(TiledConfig {
        tile: TileShape::square(tile),
        workers: Some(2),
    })
    .unwrap()
}

#[test]
fn uniform_inputs_give_window_area() {
    let field = Grid::filled(5, 5, 1.0).unwrap();
    let template = Grid::filled(2, 2, 1.0).unwrap();
    let problem = Problem::new(field, template, 4).unwrap();

    let baseline = Baseline.evaluate(&problem).unwrap();
    for tile in [1, 2, 3, 4] {
        let out = tiled(tile).evaluate(&problem).unwrap();
        assert_eq!(out.rows(), 4);
        assert!(out.as_slice().iter().all(|&v| v == 4.0), "tile={tile}");
    }
    assert!(baseline.as_slice().iter().all(|&v| v == 4.0));
}

#[test]
fn corner_template_extracts_field() {
    let field =
        Grid::from_vec((0..49).map(|v| (v as f32).sin() * 10.0).collect(), 7, 7).unwrap();
    let template = Grid::from_vec(vec![1.0, 0.0, 0.0, 0.0], 2, 2).unwrap();
    let problem = Problem::new(field.clone(), template, 6).unwrap();

    let baseline = Baseline.evaluate(&problem).unwrap();
    let out = tiled(4).evaluate(&problem).unwrap();
    for k in 0..6 {
        for l in 0..6 {
            assert_eq!(out.get(k, l), field.get(k, l));
            assert_eq!(baseline.get(k, l), field.get(k, l));
        }
    }
}

#[test]
fn oracle_reports_single_flipped_cell() {
    let baseline = Grid::zeros(6, 6).unwrap();
    let mut optimized = Grid::zeros(6, 6).unwrap();
    optimized.as_mut_slice()[2 * 6 + 3] = 1.0;

    let verdict = compare(&baseline, &optimized, DEFAULT_TOLERANCE).unwrap();
    assert_eq!(
        verdict,
        Verdict::Fail(Mismatch {
            row: 2,
            col: 3,
            expected: 0.0,
            actual: 1.0,
        })
    );
    assert!(!verdict.is_pass());
}
