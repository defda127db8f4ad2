//! Graph coarsening by matching and contraction.
//!
//! One [`CoarseLevel`] records how a fine graph was contracted: each coarse
//! vertex is a single fine vertex or a matched pair ([`Merge`]). The maps
//! `v2cv` and `mflag` are derived from the merge list and can be rebuilt
//! with [`CoarseLevel::derive_maps`].
//!
//! Edge weights of the coarse graph are sums of the fine weights they
//! replace, except that "simple" edges of a merged vertex are scaled by that
//! vertex's spring reduction factor (see [`spring::reduce`]).

pub mod matching;
pub mod multilevel;
pub mod spring;

use crate::config::CoarsenConfig;
use crate::error::PartitionError;
use crate::graph::{Graph, Vertex};
use crate::workspace::Workspace;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Single(usize),
    /// Matched pair, smaller index first.
    Pair(usize, usize),
}

impl Merge {
    pub fn members(self) -> impl Iterator<Item = usize> {
        let (a, b) = match self {
            Merge::Single(v) => (v, None),
            Merge::Pair(u, v) => (u, Some(v)),
        };
        std::iter::once(a).chain(b)
    }
}

#[derive(Debug, Clone)]
pub struct CoarseLevel {
    pub graph: Graph,
    /// One entry per coarse vertex.
    pub merges: Vec<Merge>,
    /// Fine vertex to coarse vertex.
    pub v2cv: Vec<usize>,
    /// Fine vertex to its matched partner.
    pub mflag: Vec<Option<usize>>,
    /// Spring reduction factor applied to each fine vertex's simple edges
    /// (1 for unmatched vertices).
    pub reduction: Vec<f64>,
}

impl CoarseLevel {
    /// Rebuild `(v2cv, mflag)` from a merge list over `nfine` vertices.
    pub fn derive_maps(merges: &[Merge], nfine: usize) -> (Vec<usize>, Vec<Option<usize>>) {
        let mut v2cv = vec![0; nfine];
        let mut mflag = vec![None; nfine];
        for (c, m) in merges.iter().enumerate() {
            match *m {
                Merge::Single(v) => v2cv[v] = c,
                Merge::Pair(u, v) => {
                    v2cv[u] = c;
                    v2cv[v] = c;
                    mflag[u] = Some(v);
                    mflag[v] = Some(u);
                }
            }
        }
        (v2cv, mflag)
    }

    pub fn nfine(&self) -> usize {
        self.v2cv.len()
    }

    /// Fine assignment induced by a coarse one.
    pub fn project_assignment(&self, coarse: &[usize]) -> Vec<usize> {
        self.v2cv.iter().map(|&c| coarse[c]).collect()
    }
}

/// Contract a maximal matching of `graph` into a coarser graph.
pub fn coarsen_step<R: Rng + ?Sized>(
    graph: &Graph,
    cfg: &CoarsenConfig,
    rng: &mut R,
    ws: &Workspace,
) -> Result<CoarseLevel, PartitionError> {
    let n = graph.len();
    let mate = matching::maxmatch(graph, rng);
    let mut merges = ws.alloc_empty(n)?;
    for v in 0..n {
        match mate[v] {
            None => merges.push(Merge::Single(v)),
            Some(u) if v < u => merges.push(Merge::Pair(v, u)),
            Some(_) => {}
        }
    }
    let (v2cv, mflag) = CoarseLevel::derive_maps(&merges, n);
    let springs = spring::reduce(graph, &merges, &mflag, cfg.spring_reduction, ws)?;

    let nc = merges.len();
    let mut slot: Vec<usize> = ws.alloc(nc, usize::MAX)?;
    let mut rows: Vec<(i32, Vec<usize>, Vec<f64>)> = ws.alloc_empty(nc)?;
    for (c, m) in merges.iter().enumerate() {
        let mut edges = vec![c];
        let mut wts = vec![0.0f64];
        let mut vwgt = 0i32;
        for u in m.members() {
            let vtx = graph.vertex(u);
            vwgt = vwgt.saturating_add(vtx.vwgt);
            for (k, (x, w)) in vtx.weighted_neighbors().enumerate() {
                let cx = v2cv[x];
                if cx == c {
                    continue;
                }
                let scaled = w * springs.edge_factor(u, k + 1);
                if slot[cx] == usize::MAX || edges.get(slot[cx]) != Some(&cx) {
                    slot[cx] = edges.len();
                    edges.push(cx);
                    wts.push(scaled);
                } else {
                    wts[slot[cx]] += scaled;
                }
            }
        }
        rows.push((vwgt, edges, wts));
    }
    // Sums may differ in the last bit between the two ends of an edge; the
    // lower-numbered end's value is used for both.
    for c in 0..nc {
        for k in 1..rows[c].1.len() {
            let cx = rows[c].1[k];
            if cx < c {
                if let Some(j) = rows[cx].1.iter().position(|&y| y == c) {
                    rows[c].2[k] = rows[cx].2[j];
                }
            }
        }
    }
    let mut vertices = ws.alloc_empty(nc)?;
    for (vwgt, edges, wts) in rows {
        let mut ewgts: Vec<f32> = wts.iter().map(|&w| w as f32).collect();
        ewgts[0] = -ewgts[1..].iter().sum::<f32>();
        vertices.push(Vertex {
            vwgt,
            edges,
            ewgts: Some(ewgts),
        });
    }
    let coarse = Graph::from_vertices(vertices);
    log::debug!(
        "coarsen: {} -> {} vertices, {} -> {} edges",
        n,
        nc,
        graph.nedges(),
        coarse.nedges()
    );
    let level = CoarseLevel {
        graph: coarse,
        merges,
        v2cv,
        mflag,
        reduction: springs.reduction,
    };
    crate::debug_invariants!(
        crate::debug_invariants::DebugInvariants::validate_invariants(&level),
        "coarse level"
    );
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::check::check_graph;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn grid(nx: usize, ny: usize) -> Graph {
        let mut edges = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                let v = j * nx + i;
                if i + 1 < nx {
                    edges.push((v, v + 1));
                }
                if j + 1 < ny {
                    edges.push((v, v + nx));
                }
            }
        }
        Graph::from_edges(nx * ny, &edges)
    }

    #[test]
    fn coarse_graph_is_well_formed_and_conserves_weight() {
        let ws = Workspace::unlimited();
        let g = grid(6, 5);
        let mut rng = SmallRng::seed_from_u64(9);
        let level = coarsen_step(&g, &CoarsenConfig::default(), &mut rng, &ws).unwrap();
        assert!(check_graph(&level.graph).is_empty());
        assert_eq!(level.graph.total_vwgt(), g.total_vwgt());
        assert!(level.graph.len() < g.len());
        assert_eq!(level.nfine(), 30);
        let (v2cv, mflag) = CoarseLevel::derive_maps(&level.merges, g.len());
        assert_eq!(v2cv, level.v2cv);
        assert_eq!(mflag, level.mflag);
    }

    #[test]
    fn without_reduction_weights_are_plain_sums() {
        let ws = Workspace::unlimited();
        // Square 0-1-2-3-0: whatever the matching, each coarse edge sums fine edges.
        let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let cfg = CoarsenConfig {
            spring_reduction: false,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let level = coarsen_step(&g, &cfg, &mut rng, &ws).unwrap();
        assert_eq!(level.graph.len(), 2);
        assert_eq!(level.graph.vertex(0).ewgts.as_deref(), Some(&[-2.0, 2.0][..]));
    }

    #[test]
    fn projected_assignment_follows_merges() {
        let merges = [Merge::Pair(0, 2), Merge::Single(1)];
        let (v2cv, mflag) = CoarseLevel::derive_maps(&merges, 3);
        assert_eq!(v2cv, vec![0, 1, 0]);
        assert_eq!(mflag, vec![Some(2), None, Some(0)]);
        assert_eq!(Merge::Pair(0, 2).members().collect::<Vec<_>>(), vec![0, 2]);
    }
}
