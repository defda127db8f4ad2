mod util;

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ug_partition::prelude::*;
use ug_partition::refine::{hop_cost, kl_refine};
use ug_partition::workspace::Workspace;
use util::*;

/// Random graph on `n` vertices with about `density · n` edges.
fn random_graph(n: usize, density: f64, seed: u64) -> Graph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let m = (density * n as f64) as usize;
    let edges: Vec<(usize, usize)> = (0..m)
        .map(|_| (rng.gen_range(0..n), rng.gen_range(0..n)))
        .collect();
    Graph::from_edges(n, &edges)
}

/// Like [`random_graph`], with edge weights spread over nine decades.
fn random_weighted_graph(n: usize, density: f64, seed: u64) -> Graph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let m = (density * n as f64) as usize;
    let edges: Vec<(usize, usize, f32)> = (0..m)
        .map(|_| {
            let w = 10f32.powf(rng.gen_range(-5.0..4.0));
            (rng.gen_range(0..n), rng.gen_range(0..n), w)
        })
        .collect();
    Graph::from_weighted_edges(n, &edges)
}

fn weights_of(assignment: &[usize], vwgts: &[i32], nsets: usize) -> Vec<i64> {
    let mut w = vec![0i64; nsets];
    for (&s, &x) in assignment.iter().zip(vwgts) {
        w[s] += x as i64;
    }
    w
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn single_step_split_is_complete_and_balanced(
        k in 2usize..8,
        dims in 1usize..=3,
        density in 0.5f64..3.0,
        seed in any::<u64>(),
    ) {
        let nsets = 1 << dims;
        let n = nsets * k;
        let g = random_graph(n, density, seed);
        let cfg = PartitionerConfig {
            dims_per_step: dims,
            rng_seed: seed,
            ..Default::default()
        };
        let part = partition(&g, &Target::hypercube(dims), None, None, &cfg).unwrap();
        assert_complete(&part.assignment, n, nsets);
        assert_balanced(&part.metrics.set_weights, &vec![k as f64; nsets], 1.0);
    }

    #[test]
    fn weighted_bisection_within_one_vertex(
        n in 6usize..60,
        density in 0.5f64..3.0,
        seed in any::<u64>(),
    ) {
        let mut rng = SmallRng::seed_from_u64(seed ^ 0x5eed);
        let vwgts: Vec<i32> = (0..n).map(|_| rng.gen_range(1..=4)).collect();
        let g = random_graph(n, density, seed).with_vertex_weights(&vwgts);
        let cfg = PartitionerConfig { rng_seed: seed, ..Default::default() };
        let part = partition(&g, &Target::hypercube(1), None, None, &cfg).unwrap();
        assert_complete(&part.assignment, n, 2);
        let half = g.total_vwgt() as f64 / 2.0;
        assert_balanced(&part.metrics.set_weights, &[half, half], g.max_vwgt() as f64);
    }

    #[test]
    fn every_method_assigns_every_vertex(
        n in 9usize..50,
        density in 0.5f64..3.0,
        seed in any::<u64>(),
        method in prop_oneof![
            Just(GlobalMethod::MultilevelKl),
            Just(GlobalMethod::Spectral),
            Just(GlobalMethod::Linear),
            Just(GlobalMethod::Random),
            Just(GlobalMethod::Scattered),
        ],
    ) {
        let g = random_graph(n, density, seed);
        let cfg = PartitionerConfig {
            global_method: method,
            rng_seed: seed,
            coarsen: CoarsenConfig { vmax: 8, ..Default::default() },
            ..Default::default()
        };
        let part = partition(&g, &Target::hypercube(2), None, None, &cfg).unwrap();
        assert_complete(&part.assignment, n, 4);
        let sum: i64 = part.metrics.set_weights.iter().sum();
        prop_assert_eq!(sum, n as i64);
    }

    #[test]
    fn kl_never_worsens_a_balanced_start(
        k in 3usize..12,
        nsets in prop_oneof![Just(2usize), Just(4), Just(8)],
        density in 1.0f64..4.0,
        seed in any::<u64>(),
    ) {
        let n = k * nsets;
        let g = random_graph(n, density, seed);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut assignment: Vec<usize> = (0..n).map(|v| v % nsets).collect();
        assignment.shuffle(&mut rng);
        let hops = Target::hypercube(nsets.trailing_zeros() as usize)
            .hop_matrix(&Workspace::unlimited())
            .unwrap();
        let goals = vec![k as f64; nsets];
        let before = hop_cost(&g, &assignment, &hops);
        let stats = kl_refine(
            &g,
            &mut assignment,
            &hops,
            &goals,
            &KlConfig::default(),
            &mut rng,
            &Workspace::unlimited(),
        )
        .unwrap();
        let after = hop_cost(&g, &assignment, &hops);
        prop_assert!(after <= before, "{after} > {before}");
        prop_assert_eq!(stats.initial_cost, before);
        prop_assert_eq!(stats.final_cost, after);
        let w = weights_of(&assignment, &vec![1; n], nsets);
        assert_balanced(&w, &goals, 1.0);
    }

    #[test]
    fn kl_never_worsens_a_balanced_start_with_fractional_weights(
        k in 2usize..10,
        nsets in prop_oneof![Just(2usize), Just(4)],
        density in 1.0f64..4.0,
        seed in any::<u64>(),
    ) {
        let n = k * nsets;
        let g = random_weighted_graph(n, density, seed);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut assignment: Vec<usize> = (0..n).map(|v| v % nsets).collect();
        assignment.shuffle(&mut rng);
        let ws = Workspace::unlimited();
        let hops = Target::hypercube(nsets.trailing_zeros() as usize)
            .hop_matrix(&ws)
            .unwrap();
        let goals = vec![k as f64; nsets];
        let before = hop_cost(&g, &assignment, &hops);
        kl_refine(&g, &mut assignment, &hops, &goals, &KlConfig::default(), &mut rng, &ws)
            .unwrap();
        let after = hop_cost(&g, &assignment, &hops);
        prop_assert!(after <= before, "{after} > {before}");
    }
}
