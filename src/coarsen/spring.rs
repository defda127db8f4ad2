//! Spring model for contracted edges.
//!
//! Treat edge weights as spring constants. When `u` and `v` merge into a
//! coarse vertex `c` at their centre of mass, an edge from `u` to an outside
//! neighbour `x` becomes three springs in series: `x`–`u`, `u`–`c` and, on
//! the coarse side, `c`–`cx`. With `k` the weight of the matched edge and
//! `M = m_u + m_v`, the `u`–`c` segment has constant `k·M/m_v`, so every
//! simple edge of `u` is scaled by
//!
//! ```text
//! r_u = k_uc / (k_uc + s_u),   k_uc = k·M/m_v,   s_u = Σ simple weights of u
//! ```
//!
//! Edges to a neighbour adjacent to both `u` and `v` (triangle) or to a
//! vertex whose partner is adjacent to `v` (square) keep their weight: the
//! contraction already sums them with their twin.
//!
//! Interpolation undoes the contraction of one pair by choosing positions
//! that keep the weighted centre of mass and minimize spring energy against
//! neighbours held at their coarse positions ([`displace`]).

use super::{CoarseLevel, Merge};
use crate::error::PartitionError;
use crate::graph::Graph;
use crate::workspace::Workspace;

/// Per-edge scale factors for one contraction.
#[derive(Debug, Clone)]
pub struct Springs {
    offsets: Vec<usize>,
    factor: Vec<f64>,
    /// `r_u` for matched vertices, 1 otherwise.
    pub reduction: Vec<f64>,
}

impl Springs {
    /// Scale applied to the edge in slot `k` of `u` (product of both ends).
    #[inline]
    pub fn edge_factor(&self, u: usize, k: usize) -> f64 {
        self.factor[self.offsets[u] + k]
    }
}

/// Compute reduction factors for every merged pair.
pub fn reduce(
    graph: &Graph,
    merges: &[Merge],
    mflag: &[Option<usize>],
    enabled: bool,
    ws: &Workspace,
) -> Result<Springs, PartitionError> {
    let n = graph.len();
    let mut offsets = ws.alloc_empty(n + 1)?;
    offsets.push(0);
    for vtx in graph.vertices() {
        let last = offsets[offsets.len() - 1];
        offsets.push(last + vtx.edges.len());
    }
    let total = offsets[n];
    let mut own: Vec<f64> = ws.alloc(total, 1.0)?;
    let mut reduction: Vec<f64> = ws.alloc(n, 1.0)?;

    if enabled {
        let mut mark: Vec<usize> = ws.alloc(n, usize::MAX)?;
        let mut simple = Vec::new();
        for m in merges {
            let Merge::Pair(u, v) = *m else { continue };
            let k0 = edge_weight(graph, u, v);
            let mass = graph.vertex(u).vwgt as f64 + graph.vertex(v).vwgt as f64;
            for (a, b) in [(u, v), (v, u)] {
                for &y in graph.neighbors(b) {
                    mark[y] = a;
                }
                simple.clear();
                let mut s = 0.0;
                for (k, (x, w)) in graph.vertex(a).weighted_neighbors().enumerate() {
                    if x == b {
                        continue;
                    }
                    let triangle = mark[x] == a;
                    let square = mflag[x].is_some_and(|x2| x2 != a && mark[x2] == a);
                    if !triangle && !square {
                        s += w;
                        simple.push(k + 1);
                    }
                }
                let k_ac = k0 * mass / graph.vertex(b).vwgt as f64;
                let r = if s > 0.0 { k_ac / (k_ac + s) } else { 1.0 };
                reduction[a] = r;
                for &k in &simple {
                    own[offsets[a] + k] = r;
                }
            }
        }
    }

    let mut factor: Vec<f64> = ws.alloc(total, 1.0)?;
    for (u, vtx) in graph.vertices().iter().enumerate() {
        for k in 1..vtx.edges.len() {
            let x = vtx.edges[k];
            if x < u {
                continue;
            }
            let fu = own[offsets[u] + k];
            let j = graph
                .vertex(x)
                .edges
                .iter()
                .skip(1)
                .position(|&y| y == u)
                .map_or(0, |p| p + 1);
            let fx = if j > 0 { own[offsets[x] + j] } else { 1.0 };
            factor[offsets[u] + k] = fu * fx;
            if j > 0 {
                factor[offsets[x] + j] = fu * fx;
            }
        }
    }
    Ok(Springs {
        offsets,
        factor,
        reduction,
    })
}

fn edge_weight(graph: &Graph, u: usize, v: usize) -> f64 {
    graph
        .vertex(u)
        .weighted_neighbors()
        .find(|&(x, _)| x == v)
        .map_or(1.0, |(_, w)| w)
}

/// Positions `(y_u, y_v)` for a pair merged at coarse value `yc`.
///
/// With `y_u = yc + m_v·t` and `y_v = yc − m_u·t` the centre of mass is
/// fixed; `t` minimizes `Σ w_ux (y_u − ŷ_x)² + Σ w_vx (y_v − ŷ_x)² +
/// k (y_u − y_v)²`, where `ŷ_x` is the coarse value of neighbour `x`.
pub fn displace(
    fine: &Graph,
    level: &CoarseLevel,
    u: usize,
    v: usize,
    coarse_vals: &[f64],
) -> (f64, f64) {
    let yc = coarse_vals[level.v2cv[u]];
    let mu = fine.vertex(u).vwgt as f64;
    let mv = fine.vertex(v).vwgt as f64;
    let mass = mu + mv;
    let k0 = edge_weight(fine, u, v);
    let sums = |a: usize, b: usize| {
        fine.vertex(a)
            .weighted_neighbors()
            .filter(|&(x, _)| x != b)
            .fold((0.0, 0.0), |(sa, sb), (x, w)| {
                (sa + w, sb + w * coarse_vals[level.v2cv[x]])
            })
    };
    let (au, bu) = sums(u, v);
    let (av, bv) = sums(v, u);
    let denom = k0 * mass * mass + au * mv * mv + av * mu * mu;
    let t = if denom > 0.0 {
        (mv * (bu - au * yc) - mu * (bv - av * yc)) / denom
    } else {
        0.0
    };
    (yc + mv * t, yc - mu * t)
}

/// Fine values from coarse values.
pub fn interpolate(
    level: &CoarseLevel,
    fine: &Graph,
    coarse_vals: &[f64],
    ws: &Workspace,
) -> Result<Vec<f64>, PartitionError> {
    let mut out: Vec<f64> = ws.alloc(level.nfine(), 0.0)?;
    for (c, m) in level.merges.iter().enumerate() {
        match *m {
            Merge::Single(v) => out[v] = coarse_vals[c],
            Merge::Pair(u, v) => {
                let (yu, yv) = displace(fine, level, u, v, coarse_vals);
                out[u] = yu;
                out[v] = yv;
            }
        }
    }
    Ok(out)
}

/// Coarse values as mass-weighted averages of fine ones; the left inverse
/// of [`interpolate`].
pub fn restrict(
    level: &CoarseLevel,
    fine: &Graph,
    fine_vals: &[f64],
    ws: &Workspace,
) -> Result<Vec<f64>, PartitionError> {
    let mut out = ws.alloc_empty(level.merges.len())?;
    for m in &level.merges {
        let (mut num, mut den) = (0.0, 0.0);
        for v in m.members() {
            let w = fine.vertex(v).vwgt as f64;
            num += w * fine_vals[v];
            den += w;
        }
        out.push(num / den);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coarsen::CoarseLevel;

    fn level_for(graph: &Graph, merges: Vec<Merge>) -> CoarseLevel {
        let ws = Workspace::unlimited();
        let (v2cv, mflag) = CoarseLevel::derive_maps(&merges, graph.len());
        let springs = reduce(graph, &merges, &mflag, true, &ws).unwrap();
        CoarseLevel {
            graph: Graph::default(),
            merges,
            v2cv,
            mflag,
            reduction: springs.reduction,
        }
    }

    #[test]
    fn path_reduction_matches_series_springs() {
        // 0 - 1 = 2 - 3, merging 1 and 2 (unit weights and masses).
        let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        let level = level_for(
            &g,
            vec![Merge::Single(0), Merge::Pair(1, 2), Merge::Single(3)],
        );
        // k_uc = 1·2/1 = 2, s_u = 1, r = 2/3.
        assert!((level.reduction[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(level.reduction[0], 1.0);
    }

    #[test]
    fn triangle_edges_are_not_reduced() {
        let g = Graph::from_edges(3, &[(0, 1), (1, 2), (2, 0)]);
        let merges = vec![Merge::Pair(0, 1), Merge::Single(2)];
        let ws = Workspace::unlimited();
        let (_, mflag) = CoarseLevel::derive_maps(&merges, 3);
        let springs = reduce(&g, &merges, &mflag, true, &ws).unwrap();
        assert_eq!(springs.reduction[0], 1.0);
        for k in 1..3 {
            assert_eq!(springs.edge_factor(0, k), 1.0);
        }
    }

    #[test]
    fn interpolation_keeps_centre_of_mass() {
        let ws = Workspace::unlimited();
        let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).with_vertex_weights(&[1, 2, 3, 1]);
        let level = level_for(
            &g,
            vec![Merge::Single(0), Merge::Pair(1, 2), Merge::Single(3)],
        );
        let coarse = [-1.0, 0.2, 1.0];
        let fine = interpolate(&level, &g, &coarse, &ws).unwrap();
        assert!(fine[1] < fine[2], "pair spreads toward its neighbours: {fine:?}");
        let back = restrict(&level, &g, &fine, &ws).unwrap();
        for (a, b) in back.iter().zip(&coarse) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
