//! Randomized maximal matching.

use crate::graph::Graph;
use rand::Rng;
use rand::seq::SliceRandom;

/// Match vertices greedily in random order.
///
/// Each unmatched vertex picks an unmatched neighbour with probability
/// proportional to `w(v, u) / (vwgt(v) + vwgt(u))`, favouring heavy edges
/// between light vertices; a vertex with a single candidate takes it. The
/// result is maximal: no edge joins two unmatched vertices.
pub fn maxmatch<R: Rng + ?Sized>(graph: &Graph, rng: &mut R) -> Vec<Option<usize>> {
    let n = graph.len();
    let mut mate: Vec<Option<usize>> = vec![None; n];
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    let mut cand: Vec<(usize, f64)> = Vec::new();

    for &v in &order {
        if mate[v].is_some() {
            continue;
        }
        let vtx = graph.vertex(v);
        cand.clear();
        cand.extend(
            vtx.weighted_neighbors()
                .filter(|&(u, _)| mate[u].is_none())
                .map(|(u, w)| {
                    let m = vtx.vwgt as f64 + graph.vertex(u).vwgt as f64;
                    (u, w / m)
                }),
        );
        let pick = match cand.len() {
            0 => continue,
            1 => cand[0].0,
            _ => {
                let total: f64 = cand.iter().map(|c| c.1).sum();
                let mut r = rng.gen_range(0.0..total);
                let mut chosen = cand[cand.len() - 1].0;
                for &(u, p) in &cand {
                    if r < p {
                        chosen = u;
                        break;
                    }
                    r -= p;
                }
                chosen
            }
        };
        mate[v] = Some(pick);
        mate[pick] = Some(v);
    }
    mate
}
