mod util;

use ug_partition::assign::median::median;
use ug_partition::graph::connect::{is_connected, make_connected, make_unconnected};
use ug_partition::prelude::*;
use ug_partition::workspace::Workspace;
use util::*;

#[test]
fn square_splits_into_adjacent_pairs() {
    // 0 - 1
    // |   |
    // 2 - 3
    let g = grid(2, 2);
    let part = partition(
        &g,
        &Target::hypercube(1),
        Some(&[2.0, 2.0]),
        None,
        &PartitionerConfig::default(),
    )
    .unwrap();
    assert_eq!(part.metrics.set_weights, vec![2, 2]);
    // Any balanced split of a 4-cycle into adjacent pairs cuts two edges.
    assert_eq!(part.metrics.cut_edges, 2);
    for set in members(&part.assignment, 2) {
        assert!(g.neighbors(set[0]).contains(&set[1]), "{set:?} not adjacent");
    }
}

#[test]
fn bridge_vertex_separates_the_triangles() {
    let g = triangles_with_bridge();
    let part = partition(
        &g,
        &Target::hypercube(1),
        None,
        None,
        &PartitionerConfig::default(),
    )
    .unwrap();
    assert_eq!(part.metrics.cut_edges, 1);
    let mut weights = part.metrics.set_weights.clone();
    weights.sort_unstable();
    assert_eq!(weights, vec![3, 4]);
    let a = &part.assignment;
    assert!(a[0] == a[1] && a[1] == a[2]);
    assert!(a[4] == a[5] && a[5] == a[6]);
    assert_ne!(a[0], a[4]);
}

#[test]
fn disconnected_graph_splits_along_components() {
    let g = two_triangles();
    let before = g.clone();
    for make_connected in [true, false] {
        let cfg = PartitionerConfig {
            make_connected,
            ..Default::default()
        };
        let part = partition(&g, &Target::hypercube(1), None, None, &cfg).unwrap();
        assert_eq!(part.metrics.cut_edges, 0, "make_connected={make_connected}");
        assert_eq!(part.metrics.set_weights, vec![3, 3]);
    }
    assert_eq!(g, before);
}

#[test]
fn phantom_edges_are_removed_exactly() {
    let ws = Workspace::unlimited();
    let mut g = two_triangles();
    let before = g.clone();
    assert!(!is_connected(&g));
    let undo = make_connected(&mut g, &ws).unwrap();
    assert_eq!(undo.added_edges, 1);
    assert!(is_connected(&g));
    assert_eq!(g.nedges(), before.nedges() + 1);
    make_unconnected(&mut g, undo);
    assert_eq!(g, before);
}

#[test]
fn zero_goal_set_receives_nothing() {
    let g = path(4);
    let part = partition(
        &g,
        &Target::hypercube(1),
        Some(&[4.0, 0.0]),
        None,
        &PartitionerConfig::default(),
    )
    .unwrap();
    assert_eq!(part.assignment, vec![0; 4]);
    assert_eq!(part.metrics.cut_edges, 0);

    let mut sets = vec![1; 4];
    let steps = median(&[0.3, -0.1, 0.7, 0.2], &[1.0; 4], [4.0, 0.0], &mut sets);
    assert_eq!(steps, 0);
    assert_eq!(sets, vec![0; 4]);
}

#[test]
fn grid_into_eight_on_a_mesh() {
    let g = grid(8, 8);
    let target = Target::mesh(2, 2, 2);
    let cfg = PartitionerConfig {
        dims_per_step: 3,
        ..Default::default()
    };
    let part = partition(&g, &target, None, None, &cfg).unwrap();
    assert_complete(&part.assignment, 64, 8);
    assert_balanced(&part.metrics.set_weights, &[8.0; 8], 1.0);
    assert!(part.metrics.hop_cut >= part.metrics.cut_weight);
}

#[test]
fn inertial_cuts_a_strip_across_its_length() {
    let (nx, ny) = (12, 3);
    let g = grid(nx, ny);
    let xs: Vec<f64> = (0..nx * ny).map(|v| (v % nx) as f64).collect();
    let ys: Vec<f64> = (0..nx * ny).map(|v| (v / nx) as f64).collect();
    let cfg = PartitionerConfig {
        global_method: GlobalMethod::Inertial,
        dims_per_step: 2,
        ..Default::default()
    };
    let coords = [xs.as_slice(), ys.as_slice()];
    let part = partition(&g, &Target::hypercube(2), None, Some(&coords), &cfg).unwrap();
    assert_eq!(part.metrics.set_weights, vec![9, 9, 9, 9]);
    // Slabs across the long axis: three columns each, three cuts of ny edges.
    assert_eq!(part.metrics.cut_edges, 3 * ny);
    // Gray-coded slabs put neighbouring slabs one hop apart.
    assert_eq!(part.metrics.hop_cut, part.metrics.cut_weight);
}

#[test]
fn huge_vertex_weights_survive_coarsening() {
    // Any two of these weights overflow an i32 sum.
    let n = 100;
    let g = path(n).with_vertex_weights(&vec![1 << 30; n]);
    let cfg = PartitionerConfig {
        global_method: GlobalMethod::MultilevelKl,
        coarsen: CoarsenConfig {
            vmax: 8,
            ..Default::default()
        },
        ..Default::default()
    };
    validate(&g, &Target::hypercube(1), None, None, &cfg).unwrap();
    let part = partition(&g, &Target::hypercube(1), None, None, &cfg).unwrap();
    assert_complete(&part.assignment, n, 2);
    let sum: i64 = part.metrics.set_weights.iter().sum();
    assert_eq!(sum, n as i64 * (1 << 30));
}
