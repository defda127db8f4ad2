mod util;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::f64::consts::PI;
use ug_partition::coarsen::coarsen_step;
use ug_partition::coarsen::spring::{interpolate, restrict};
use ug_partition::config::{CoarsenConfig, EigenConfig, LanczosVariant};
use ug_partition::eigen::eigensolve;
use ug_partition::workspace::Workspace;
use util::*;

fn cfg(variant: LanczosVariant, eigtol: f64) -> EigenConfig {
    EigenConfig {
        variant,
        eigtol,
        ..Default::default()
    }
}

#[test]
fn full_ortho_path_and_cycle_converge() {
    let ws = Workspace::unlimited();
    let eigtol = 1e-6;
    for n in [50, 200] {
        for (name, g, exact) in [
            ("path", path(n), 2.0 - 2.0 * (PI / n as f64).cos()),
            ("cycle", cycle(n), 2.0 - 2.0 * (2.0 * PI / n as f64).cos()),
        ] {
            let mut rng = SmallRng::seed_from_u64(n as u64);
            let sol = eigensolve(&g, 1, &cfg(LanczosVariant::FullOrtho, eigtol), &mut rng, &ws)
                .unwrap();
            let pair = &sol.pairs[0];
            let res = laplacian_residual(&g, &pair.vector, pair.value);
            assert!(res < eigtol, "{name} {n}: residual {res}");
            assert!(pair.residual < eigtol, "{name} {n}: reported {}", pair.residual);
            assert!((pair.value - exact).abs() < eigtol, "{name} {n}: {} vs {exact}", pair.value);
        }
    }
}

#[test]
fn path_fiedler_vector_is_monotone() {
    let g = path(80);
    let ws = Workspace::unlimited();
    let mut rng = SmallRng::seed_from_u64(1);
    let sol = eigensolve(&g, 1, &cfg(LanczosVariant::FullOrtho, 1e-8), &mut rng, &ws).unwrap();
    let y = &sol.pairs[0].vector;
    let up = y[1] > y[0];
    assert!(y.windows(2).all(|w| (w[1] > w[0]) == up));
}

#[test]
fn other_variants_meet_a_loose_tolerance() {
    let g = grid(15, 12);
    let ws = Workspace::unlimited();
    let eigtol = 1e-3;
    for variant in [
        LanczosVariant::FullOrthoInverse,
        LanczosVariant::SelectiveBothEnds,
        LanczosVariant::SelectiveLeftEnd,
        LanczosVariant::SelectiveLeftEndFixedPause,
    ] {
        let mut rng = SmallRng::seed_from_u64(11);
        let sol = eigensolve(&g, 2, &cfg(variant, eigtol), &mut rng, &ws).unwrap();
        assert_eq!(sol.pairs.len(), 2, "{variant:?}");
        for pair in &sol.pairs {
            let res = laplacian_residual(&g, &pair.vector, pair.value);
            assert!(res < eigtol, "{variant:?}: residual {res}");
        }
        // Smallest nontrivial eigenvalue of a 15 × 12 grid comes from the
        // longer side.
        let exact = 2.0 - 2.0 * (PI / 15.0).cos();
        assert!((sol.pairs[0].value - exact).abs() < 1e-3, "{variant:?}: {}", sol.pairs[0].value);
    }
}

#[test]
fn restrict_undoes_interpolate() {
    let g = grid(10, 10);
    let ws = Workspace::unlimited();
    let mut rng = SmallRng::seed_from_u64(4);
    let level = coarsen_step(&g, &CoarsenConfig::default(), &mut rng, &ws).unwrap();
    assert!(level.graph.len() < g.len());
    let coarse: Vec<f64> = (0..level.graph.len())
        .map(|c| ((c * 37) % 11) as f64 - 5.0)
        .collect();
    let fine = interpolate(&level, &g, &coarse, &ws).unwrap();
    let back = restrict(&level, &g, &fine, &ws).unwrap();
    for (a, b) in coarse.iter().zip(&back) {
        assert!((a - b).abs() < 1e-12, "{a} vs {b}");
    }
}
