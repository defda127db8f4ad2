//! Structural checks on input graphs.

use super::Graph;
use crate::error::GraphViolation;

/// Relative slack allowed when comparing `f32` row sums.
const ROW_SUM_TOL: f32 = 1e-4;

/// Check every structural rule and return all violations found.
///
/// Rules: self reference first, neighbours in range and distinct, symmetric
/// edges with equal weights, positive vertex and edge weights, and rows of
/// edge weights summing to zero.
pub fn check_graph(graph: &Graph) -> Vec<GraphViolation> {
    let n = graph.len();
    let mut out = Vec::new();
    let mut seen = vec![usize::MAX; n];
    // Rows whose weights line up with their edges; others are never indexed.
    let rows_ok: Vec<bool> = graph
        .vertices()
        .iter()
        .map(|vtx| vtx.ewgts.as_ref().is_none_or(|w| w.len() == vtx.edges.len()))
        .collect();

    for (v, vtx) in graph.vertices().iter().enumerate() {
        if vtx.edges.first() != Some(&v) {
            out.push(GraphViolation::SelfNotFirst(v));
        }
        if vtx.vwgt <= 0 {
            out.push(GraphViolation::VertexWeight(v));
        }
        if !rows_ok[v] {
            out.push(GraphViolation::WeightCount {
                vertex: v,
                edges: vtx.edges.len(),
                weights: vtx.ewgts.as_ref().map_or(0, Vec::len),
            });
            continue;
        }
        seen[v] = v;
        for k in 1..vtx.edges.len() {
            let u = vtx.edges[k];
            if u >= n {
                out.push(GraphViolation::NeighborOutOfRange {
                    vertex: v,
                    neighbor: u,
                });
                continue;
            }
            if u == v {
                out.push(GraphViolation::SelfLoop(v));
                continue;
            }
            if seen[u] == v {
                out.push(GraphViolation::DuplicateEdge {
                    vertex: v,
                    neighbor: u,
                });
                continue;
            }
            seen[u] = v;
            let w = vtx.weight_at(k);
            if !(w > 0.0) {
                out.push(GraphViolation::EdgeWeight(v, u));
            }
            // Each unordered pair is checked from its smaller end only.
            if v < u {
                match graph.vertex(u).edges.iter().skip(1).position(|&x| x == v) {
                    None => out.push(GraphViolation::Asymmetric(v, u)),
                    Some(pos) => {
                        if rows_ok[u] && graph.vertex(u).weight_at(pos + 1) != w {
                            out.push(GraphViolation::WeightMismatch(v, u));
                        }
                    }
                }
            } else if !graph.vertex(u).edges.iter().skip(1).any(|&x| x == v) {
                out.push(GraphViolation::Asymmetric(v, u));
            }
        }
        if let Some((diag, rest)) = vtx.ewgts.as_deref().and_then(<[f32]>::split_first) {
            let sum: f32 = rest.iter().sum();
            if (diag + sum).abs() > ROW_SUM_TOL * sum.abs().max(1.0) {
                out.push(GraphViolation::RowSum(v));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Vertex;

    fn vtx(edges: Vec<usize>) -> Vertex {
        Vertex {
            vwgt: 1,
            edges,
            ewgts: None,
        }
    }

    #[test]
    fn well_formed_graph_passes() {
        let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert!(check_graph(&g).is_empty());
    }

    #[test]
    fn all_problems_are_listed() {
        let g = Graph::from_vertices(vec![
            vtx(vec![1, 1]),    // self not first
            vtx(vec![1, 0, 5]), // out of range
            Vertex {
                vwgt: 0,
                edges: vec![2],
                ewgts: None,
            },
        ]);
        let v = check_graph(&g);
        assert!(v.contains(&GraphViolation::SelfNotFirst(0)));
        assert!(v.contains(&GraphViolation::NeighborOutOfRange {
            vertex: 1,
            neighbor: 5
        }));
        assert!(v.contains(&GraphViolation::VertexWeight(2)));
        assert!(v.len() >= 3);
    }

    #[test]
    fn asymmetry_and_weight_mismatch() {
        let g = Graph::from_vertices(vec![
            Vertex {
                vwgt: 1,
                edges: vec![0, 1, 2],
                ewgts: Some(vec![-3.0, 1.0, 2.0]),
            },
            Vertex {
                vwgt: 1,
                edges: vec![1, 0],
                ewgts: Some(vec![-4.0, 4.0]),
            },
            Vertex {
                vwgt: 1,
                edges: vec![2],
                ewgts: Some(vec![0.0]),
            },
        ]);
        let v = check_graph(&g);
        assert!(v.contains(&GraphViolation::WeightMismatch(0, 1)));
        assert!(v.contains(&GraphViolation::Asymmetric(0, 2)));
    }

    #[test]
    fn row_sum_must_vanish() {
        let g = Graph::from_vertices(vec![
            Vertex {
                vwgt: 1,
                edges: vec![0, 1],
                ewgts: Some(vec![-2.0, 1.0]),
            },
            Vertex {
                vwgt: 1,
                edges: vec![1, 0],
                ewgts: Some(vec![-1.0, 1.0]),
            },
        ]);
        assert_eq!(check_graph(&g), vec![GraphViolation::RowSum(0)]);
    }

    #[test]
    fn short_weight_row_on_neighbour_is_reported() {
        // Vertex 0 is well formed; its neighbour carries one weight for two edges.
        let g = Graph::from_vertices(vec![
            Vertex {
                vwgt: 1,
                edges: vec![0, 1],
                ewgts: Some(vec![-1.0, 1.0]),
            },
            Vertex {
                vwgt: 1,
                edges: vec![1, 0],
                ewgts: Some(vec![0.0]),
            },
        ]);
        assert_eq!(
            check_graph(&g),
            vec![GraphViolation::WeightCount {
                vertex: 1,
                edges: 2,
                weights: 1
            }]
        );
    }

    #[test]
    fn empty_rows_do_not_panic() {
        let g = Graph::from_vertices(vec![Vertex {
            vwgt: 1,
            edges: vec![],
            ewgts: Some(vec![]),
        }]);
        assert_eq!(check_graph(&g), vec![GraphViolation::SelfNotFirst(0)]);
    }
}
