//! Adjacency-list graph used by every partitioning stage.
//!
//! Vertices are numbered `0..n`. Each vertex stores its neighbour list with
//! the vertex itself in slot 0; when edge weights are in use the parallel
//! weight list stores the negated row sum in slot 0, so slot 0 of a row is
//! the Laplacian diagonal up to sign:
//!
//! ```text
//! edges  = [v,      u1,  u2,  ...]
//! ewgts  = [-Σw,    w1,  w2,  ...]
//! ```
//!
//! Graphs without edge weights behave as if every weight were 1.

pub mod check;
pub mod connect;
pub mod subgraph;

use crate::error::{GraphViolation, PartitionError, Violations};
use crate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub vwgt: i32,
    /// `edges[0]` is the vertex itself.
    pub edges: Vec<usize>,
    /// `ewgts[0]` is the negated sum of `ewgts[1..]`.
    pub ewgts: Option<Vec<f32>>,
}

impl Vertex {
    /// Number of neighbours (self slot excluded).
    #[inline]
    pub fn degree(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    #[inline]
    pub fn neighbors(&self) -> &[usize] {
        self.edges.get(1..).unwrap_or(&[])
    }

    /// Weight of the edge in slot `k` (`k ≥ 1`).
    #[inline]
    pub fn weight_at(&self, k: usize) -> f64 {
        match &self.ewgts {
            Some(w) => w[k] as f64,
            None => 1.0,
        }
    }

    /// `(neighbour, weight)` pairs.
    pub fn weighted_neighbors(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (1..self.edges.len()).map(move |k| (self.edges[k], self.weight_at(k)))
    }

    /// Sum of incident edge weights (the Laplacian diagonal).
    pub fn diagonal(&self) -> f64 {
        match &self.ewgts {
            Some(w) => -(w[0] as f64),
            None => self.degree() as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    using_ewgts: bool,
}

impl Graph {
    /// Wrap raw vertex records. No checking is done; see [`check::check_graph`].
    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        let using_ewgts = vertices.iter().any(|v| v.ewgts.is_some());
        Self {
            vertices,
            using_ewgts,
        }
    }

    /// Build from CSR arrays without self loops (`xadj.len() == n + 1`).
    ///
    /// `ewgts`, if given, is parallel to `adjncy`.
    pub fn from_csr(
        xadj: &[usize],
        adjncy: &[usize],
        vwgts: Option<&[i32]>,
        ewgts: Option<&[f32]>,
    ) -> Result<Self, PartitionError> {
        let mut bad = Violations::default();
        if xadj.is_empty() {
            bad.push(GraphViolation::Malformed("xadj must hold n + 1 offsets"));
            return Err(PartitionError::InvalidInput(bad));
        }
        let n = xadj.len() - 1;
        if xadj.windows(2).any(|w| w[0] > w[1]) || xadj[n] != adjncy.len() {
            bad.push(GraphViolation::Malformed("xadj offsets do not cover adjncy"));
        }
        if vwgts.is_some_and(|w| w.len() != n) {
            bad.push(GraphViolation::Malformed("vertex weight count differs from n"));
        }
        if ewgts.is_some_and(|w| w.len() != adjncy.len()) {
            bad.push(GraphViolation::Malformed("edge weight count differs from adjncy"));
        }
        bad.into_result()?;

        let vertices = (0..n)
            .map(|v| {
                let range = xadj[v]..xadj[v + 1];
                let mut edges = Vec::with_capacity(range.len() + 1);
                edges.push(v);
                edges.extend_from_slice(&adjncy[range.clone()]);
                let ewgts = ewgts.map(|w| {
                    let row = &w[range];
                    let mut out = Vec::with_capacity(row.len() + 1);
                    out.push(-row.iter().sum::<f32>());
                    out.extend_from_slice(row);
                    out
                });
                Vertex {
                    vwgt: vwgts.map_or(1, |w| w[v]),
                    edges,
                    ewgts,
                }
            })
            .collect();
        Ok(Self {
            vertices,
            using_ewgts: ewgts.is_some(),
        })
    }

    /// Unit-weight graph from an undirected edge list; duplicates and self
    /// loops are dropped.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut adj = vec![Vec::new(); n];
        for &(u, v) in edges {
            if u != v && u < n && v < n {
                adj[u].push(v);
                adj[v].push(u);
            }
        }
        let vertices = adj
            .into_iter()
            .enumerate()
            .map(|(v, mut nbrs)| {
                nbrs.sort_unstable();
                nbrs.dedup();
                let mut row = Vec::with_capacity(nbrs.len() + 1);
                row.push(v);
                row.extend(nbrs);
                Vertex {
                    vwgt: 1,
                    edges: row,
                    ewgts: None,
                }
            })
            .collect();
        Self {
            vertices,
            using_ewgts: false,
        }
    }

    /// Weighted graph from an undirected edge list; repeated edges add up.
    pub fn from_weighted_edges(n: usize, edges: &[(usize, usize, f32)]) -> Self {
        let mut adj: Vec<Vec<(usize, f32)>> = vec![Vec::new(); n];
        for &(u, v, w) in edges {
            if u != v && u < n && v < n {
                adj[u].push((v, w));
                adj[v].push((u, w));
            }
        }
        let vertices = adj
            .into_iter()
            .enumerate()
            .map(|(v, mut nbrs)| {
                nbrs.sort_unstable_by_key(|&(u, _)| u);
                let mut row = vec![v];
                let mut wts = vec![0.0f32];
                for (u, w) in nbrs {
                    if row.len() > 1 && row[row.len() - 1] == u {
                        if let Some(last) = wts.last_mut() {
                            *last += w;
                        }
                    } else {
                        row.push(u);
                        wts.push(w);
                    }
                }
                wts[0] = -wts[1..].iter().sum::<f32>();
                Vertex {
                    vwgt: 1,
                    edges: row,
                    ewgts: Some(wts),
                }
            })
            .collect();
        Self {
            vertices,
            using_ewgts: true,
        }
    }

    /// Replace vertex weights (`vwgts.len()` must equal `n`).
    pub fn with_vertex_weights(mut self, vwgts: &[i32]) -> Self {
        for (v, &w) in self.vertices.iter_mut().zip(vwgts) {
            v.vwgt = w;
        }
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn vertex(&self, v: usize) -> &Vertex {
        &self.vertices[v]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    #[inline]
    pub fn using_ewgts(&self) -> bool {
        self.using_ewgts
    }

    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        self.vertices[v].neighbors()
    }

    /// Number of undirected edges.
    pub fn nedges(&self) -> usize {
        self.vertices.iter().map(Vertex::degree).sum::<usize>() / 2
    }

    pub fn total_vwgt(&self) -> i64 {
        self.vertices.iter().map(|v| v.vwgt as i64).sum()
    }

    pub fn max_vwgt(&self) -> i32 {
        self.vertices.iter().map(|v| v.vwgt).max().unwrap_or(0)
    }

    /// Vertex weights as floats, charged to the workspace.
    pub fn vwgts_f64(&self, ws: &Workspace) -> Result<Vec<f64>, PartitionError> {
        let mut out = ws.alloc_empty(self.len())?;
        out.extend(self.vertices.iter().map(|v| v.vwgt as f64));
        Ok(out)
    }

    /// Whether every edge weight is a whole number.
    pub fn integral_ewgts(&self) -> bool {
        self.vertices.iter().all(|v| match &v.ewgts {
            Some(w) => w[1..].iter().all(|x| x.fract() == 0.0),
            None => true,
        })
    }

    /// Bytes a deep copy of this graph occupies, for workspace accounting.
    pub fn footprint(&self) -> usize {
        use std::mem::size_of;
        self.vertices
            .iter()
            .map(|v| {
                size_of::<Vertex>()
                    + v.edges.len() * size_of::<usize>()
                    + v.ewgts.as_ref().map_or(0, |w| w.len() * size_of::<f32>())
            })
            .sum()
    }

    /// Deep copy charged to the workspace.
    pub fn clone_in(&self, ws: &Workspace) -> Result<Self, PartitionError> {
        ws.charge(self.footprint())?;
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_puts_self_first_and_sums_diagonal() {
        // path 0-1-2 with weights 2 and 3
        let xadj = [0, 1, 3, 4];
        let adjncy = [1, 0, 2, 1];
        let ewgts = [2.0, 2.0, 3.0, 3.0];
        let g = Graph::from_csr(&xadj, &adjncy, None, Some(&ewgts)).unwrap();
        assert_eq!(g.vertex(1).edges, vec![1, 0, 2]);
        assert_eq!(g.vertex(1).ewgts.as_deref(), Some(&[-5.0, 2.0, 3.0][..]));
        assert_eq!(g.vertex(1).diagonal(), 5.0);
        assert!(g.using_ewgts());
        assert!(check::check_graph(&g).is_empty());
    }

    #[test]
    fn csr_rejects_bad_shapes() {
        let err = Graph::from_csr(&[0, 2], &[1], Some(&[1, 1]), None).unwrap_err();
        match err {
            PartitionError::InvalidInput(v) => assert_eq!(v.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn edges_dedup_and_drop_loops() {
        let g = Graph::from_edges(3, &[(0, 1), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(g.neighbors(1), &[0, 2]);
        assert_eq!(g.nedges(), 2);
        assert_eq!(g.vertex(0).diagonal(), 1.0);
    }

    #[test]
    fn weighted_edges_accumulate() {
        let g = Graph::from_weighted_edges(2, &[(0, 1, 1.5), (1, 0, 0.5)]);
        assert_eq!(g.vertex(0).ewgts.as_deref(), Some(&[-2.0, 2.0][..]));
        assert!(g.integral_ewgts());
    }
}
