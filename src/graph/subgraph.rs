//! Vertex-induced subgraphs.

use super::{Graph, Vertex};
use crate::error::PartitionError;
use crate::workspace::Workspace;

impl Graph {
    /// Subgraph induced by `keep` (global indices, any order).
    ///
    /// Returns the subgraph and its local-to-global map, which is `keep`
    /// itself. Edges leaving the set are dropped and the diagonal weight is
    /// recomputed from the edges that remain.
    pub fn subgraph(
        &self,
        keep: &[usize],
        ws: &Workspace,
    ) -> Result<(Graph, Vec<usize>), PartitionError> {
        let mut glob2loc: Vec<usize> = ws.alloc(self.len(), usize::MAX)?;
        for (l, &g) in keep.iter().enumerate() {
            glob2loc[g] = l;
        }
        let mut vertices = ws.alloc_empty(keep.len())?;
        for (l, &g) in keep.iter().enumerate() {
            let src = &self.vertices[g];
            let mut edges = ws.alloc_empty(src.edges.len())?;
            edges.push(l);
            let mut ewgts = match &src.ewgts {
                Some(_) => {
                    let mut w = ws.alloc_empty(src.edges.len())?;
                    w.push(0.0f32);
                    Some(w)
                }
                None => None,
            };
            for k in 1..src.edges.len() {
                let u = glob2loc[src.edges[k]];
                if u == usize::MAX {
                    continue;
                }
                edges.push(u);
                if let (Some(w), Some(sw)) = (ewgts.as_mut(), src.ewgts.as_ref()) {
                    w.push(sw[k]);
                }
            }
            if let Some(w) = ewgts.as_mut() {
                w[0] = -w[1..].iter().sum::<f32>();
            }
            vertices.push(Vertex {
                vwgt: src.vwgt,
                edges,
                ewgts,
            });
        }
        let sub = Graph {
            vertices,
            using_ewgts: self.using_ewgts,
        };
        Ok((sub, ws.alloc_copy(keep)?))
    }
}
