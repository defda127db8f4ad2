//! Partition quality metrics.
//!
//! These are reporting helpers: nothing in the partitioning path depends on
//! them except the balance test, which KL and the tests share.

use crate::graph::Graph;
use crate::target::HopMatrix;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionMetrics {
    /// Edges whose endpoints lie in different sets.
    pub cut_edges: usize,
    /// Total weight of those edges.
    pub cut_weight: f64,
    /// Cut weight with every edge multiplied by the hops between its sets.
    pub hop_cut: f64,
    pub set_weights: Vec<i64>,
    pub max_set_weight: i64,
    pub min_set_weight: i64,
    /// Vertices with at least one neighbour in another set.
    pub boundary_vertices: usize,
    /// `max_set_weight / (total / nsets)`; 1.0 is perfect.
    pub imbalance: f64,
}

/// Weight of each set.
pub fn set_weights(graph: &Graph, assignment: &[usize], nsets: usize) -> Vec<i64> {
    let mut w = vec![0i64; nsets];
    for (v, &s) in assignment.iter().enumerate() {
        w[s] += graph.vertex(v).vwgt as i64;
    }
    w
}

/// `max(w - goal) + max(goal - w)` over all sets.
pub fn balance_deviation(weights: &[f64], goals: &[f64]) -> f64 {
    let over = weights
        .iter()
        .zip(goals)
        .map(|(w, g)| w - g)
        .fold(f64::NEG_INFINITY, f64::max);
    let under = weights
        .iter()
        .zip(goals)
        .map(|(w, g)| g - w)
        .fold(f64::NEG_INFINITY, f64::max);
    over.max(0.0) + under.max(0.0)
}

/// A set of weights is balanced when no single vertex move could improve it.
pub fn is_balanced(weights: &[f64], goals: &[f64], max_vwgt: f64) -> bool {
    balance_deviation(weights, goals) <= max_vwgt
}

/// Evaluate `assignment` (values `< hops.len()`) on `graph`.
pub fn evaluate(graph: &Graph, assignment: &[usize], hops: &HopMatrix) -> PartitionMetrics {
    let nsets = hops.len();
    let mut cut_edges = 0;
    let mut cut_weight = 0.0;
    let mut hop_cut = 0.0;
    let mut boundary_vertices = 0;
    for (v, vtx) in graph.vertices().iter().enumerate() {
        let sv = assignment[v];
        let mut boundary = false;
        for (u, w) in vtx.weighted_neighbors() {
            let su = assignment[u];
            if su == sv {
                continue;
            }
            boundary = true;
            if v < u {
                cut_edges += 1;
                cut_weight += w;
                hop_cut += w * hops.hop(sv, su) as f64;
            }
        }
        if boundary {
            boundary_vertices += 1;
        }
    }
    let set_weights = set_weights(graph, assignment, nsets);
    let (min_set_weight, max_set_weight) =
        set_weights.iter().copied().minmax().into_option().unwrap_or((0, 0));
    let mean = graph.total_vwgt() as f64 / nsets.max(1) as f64;
    let imbalance = if mean > 0.0 {
        max_set_weight as f64 / mean
    } else {
        1.0
    };
    PartitionMetrics {
        cut_edges,
        cut_weight,
        hop_cut,
        set_weights,
        max_set_weight,
        min_set_weight,
        boundary_vertices,
        imbalance,
    }
}
