//! Connectivity enforcement for spectral methods.
//!
//! The Laplacian of a disconnected graph has one zero eigenvalue per
//! component, which defeats the Fiedler-vector approach. Before spectral
//! work each component is chained to the next by a phantom edge of weight 1;
//! afterwards the saved adjacency rows are put back verbatim.

use super::Graph;
use crate::error::PartitionError;
use crate::workspace::Workspace;
use std::collections::VecDeque;

/// A connected component found by breadth-first search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// First vertex visited.
    pub root: usize,
    /// Last vertex visited.
    pub last: usize,
    pub size: usize,
}

/// Components in order of their smallest-index root.
pub fn find_components(graph: &Graph) -> Vec<Component> {
    let n = graph.len();
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();
    let mut out = Vec::new();
    for root in 0..n {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        queue.push_back(root);
        let mut last = root;
        let mut size = 0;
        while let Some(v) = queue.pop_front() {
            last = v;
            size += 1;
            for &u in graph.neighbors(v) {
                if !visited[u] {
                    visited[u] = true;
                    queue.push_back(u);
                }
            }
        }
        out.push(Component { root, last, size });
    }
    out
}

pub fn is_connected(graph: &Graph) -> bool {
    find_components(graph).len() <= 1
}

/// Saved rows needed to undo [`make_connected`].
#[must_use = "pass the token to make_unconnected to remove the phantom edges"]
#[derive(Debug)]
pub struct ConnectUndo {
    saved: Vec<(usize, Vec<usize>, Option<Vec<f32>>)>,
    /// Number of phantom edges inserted.
    pub added_edges: usize,
}

impl ConnectUndo {
    pub fn is_noop(&self) -> bool {
        self.added_edges == 0
    }
}

/// Add one phantom edge between consecutive components.
///
/// The edge joins the last vertex visited in the previous component to the
/// root of the next one. Rows touched are saved before they grow.
pub fn make_connected(graph: &mut Graph, ws: &Workspace) -> Result<ConnectUndo, PartitionError> {
    let comps = find_components(graph);
    let mut undo = ConnectUndo {
        saved: Vec::new(),
        added_edges: 0,
    };
    if comps.len() <= 1 {
        return Ok(undo);
    }
    let using_ewgts = graph.using_ewgts();
    for pair in comps.windows(2) {
        let (u, v) = (pair[0].last, pair[1].root);
        for x in [u, v] {
            if !undo.saved.iter().any(|(s, _, _)| *s == x) {
                let vtx = graph.vertex(x);
                let edges = ws.alloc_copy(&vtx.edges)?;
                let ewgts = match &vtx.ewgts {
                    Some(w) => Some(ws.alloc_copy(w)?),
                    None => None,
                };
                undo.saved.push((x, edges, ewgts));
            }
        }
        for (a, b) in [(u, v), (v, u)] {
            let vtx = &mut graph.vertices_mut()[a];
            vtx.edges.push(b);
            if using_ewgts {
                if let Some(w) = vtx.ewgts.as_mut() {
                    w.push(1.0);
                    w[0] -= 1.0;
                }
            }
        }
        undo.added_edges += 1;
    }
    log::debug!(
        "make_connected: {} components joined by {} phantom edges",
        comps.len(),
        undo.added_edges
    );
    Ok(undo)
}

/// Restore the rows saved by [`make_connected`].
pub fn make_unconnected(graph: &mut Graph, undo: ConnectUndo) {
    let vertices = graph.vertices_mut();
    for (v, edges, ewgts) in undo.saved.into_iter().rev() {
        vertices[v].edges = edges;
        vertices[v].ewgts = ewgts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles_and_a_point() -> Graph {
        Graph::from_weighted_edges(
            7,
            &[
                (0, 1, 1.0),
                (1, 2, 2.0),
                (2, 0, 1.0),
                (3, 4, 1.0),
                (4, 5, 3.0),
                (5, 3, 1.0),
            ],
        )
    }

    #[test]
    fn components_are_found() {
        let g = two_triangles_and_a_point();
        let comps = find_components(&g);
        assert_eq!(comps.len(), 3);
        assert_eq!(comps.iter().map(|c| c.size).sum::<usize>(), 7);
        assert_eq!(comps[2], Component { root: 6, last: 6, size: 1 });
    }

    #[test]
    fn connect_then_unconnect_round_trips() {
        let ws = Workspace::unlimited();
        let original = two_triangles_and_a_point();
        let mut g = original.clone();
        let undo = make_connected(&mut g, &ws).unwrap();
        assert_eq!(undo.added_edges, 2);
        assert!(is_connected(&g));
        assert_eq!(g.nedges(), original.nedges() + 2);
        assert!(crate::graph::check::check_graph(&g).is_empty());
        make_unconnected(&mut g, undo);
        assert_eq!(g, original);
    }

    #[test]
    fn connected_graph_is_untouched() {
        let ws = Workspace::unlimited();
        let mut g = Graph::from_edges(3, &[(0, 1), (1, 2)]);
        let undo = make_connected(&mut g, &ws).unwrap();
        assert!(undo.is_noop());
        make_unconnected(&mut g, undo);
        assert_eq!(g, Graph::from_edges(3, &[(0, 1), (1, 2)]));
    }
}
