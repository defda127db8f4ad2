#![allow(dead_code)]
use ug_partition::graph::Graph;

/// Edges of an `nx × ny` grid, row-major numbering.
pub fn grid_edges(nx: usize, ny: usize) -> Vec<(usize, usize)> {
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
    edges
}

pub fn grid(nx: usize, ny: usize) -> Graph {
    Graph::from_edges(nx * ny, &grid_edges(nx, ny))
}

pub fn path(n: usize) -> Graph {
    let edges: Vec<_> = (1..n).map(|i| (i - 1, i)).collect();
    Graph::from_edges(n, &edges)
}

pub fn cycle(n: usize) -> Graph {
    let mut edges: Vec<_> = (1..n).map(|i| (i - 1, i)).collect();
    edges.push((n - 1, 0));
    Graph::from_edges(n, &edges)
}

/// Triangles {0,1,2} and {4,5,6} joined through vertex 3.
pub fn triangles_with_bridge() -> Graph {
    Graph::from_edges(
        7,
        &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (5, 6), (4, 6)],
    )
}

/// Two disjoint triangles.
pub fn two_triangles() -> Graph {
    Graph::from_edges(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)])
}

/// Sets in use, with the vertices of each.
pub fn members(assignment: &[usize], nsets: usize) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); nsets];
    for (v, &s) in assignment.iter().enumerate() {
        out[s].push(v);
    }
    out
}

/// Every vertex has a set below `nsets`.
pub fn assert_complete(assignment: &[usize], n: usize, nsets: usize) {
    assert_eq!(assignment.len(), n, "assignment length");
    for (v, &s) in assignment.iter().enumerate() {
        assert!(s < nsets, "vertex {v} assigned to set {s} of {nsets}");
    }
}

/// `|weight(set) - goal(set)| <= tol` for every set.
pub fn assert_balanced(weights: &[i64], goals: &[f64], tol: f64) {
    for (s, (&w, &g)) in weights.iter().zip(goals).enumerate() {
        assert!(
            (w as f64 - g).abs() <= tol + 1e-9,
            "set {s}: weight {w} vs goal {g} (tol {tol})\nweights={weights:?}"
        );
    }
}

/// `‖Lx − λx‖ / ‖x‖` for the unit-weight Laplacian of `graph`.
pub fn laplacian_residual(graph: &Graph, x: &[f64], lambda: f64) -> f64 {
    let mut num = 0.0;
    for (v, vtx) in graph.vertices().iter().enumerate() {
        let mut lx = vtx.diagonal() * x[v];
        for (u, w) in vtx.weighted_neighbors() {
            lx -= w * x[u];
        }
        num += (lx - lambda * x[v]).powi(2);
    }
    let den: f64 = x.iter().map(|a| a * a).sum();
    (num / den).sqrt()
}
