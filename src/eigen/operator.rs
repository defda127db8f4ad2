//! The normalized Laplacian operator `A = W^{-1/2} L W^{-1/2}`.
//!
//! With vertex weights `W` the generalized problem `L x = λ W x` becomes the
//! ordinary symmetric problem `A y = λ y` with `x = W^{-1/2} y`. The null
//! vector of `A` is `W^{1/2} 1`, normalized here once and deflated by every
//! solver.

use super::{dot, normalize};
use crate::error::PartitionError;
use crate::graph::Graph;
use crate::workspace::Workspace;

/// Something that maps a vector to a vector of the same length.
pub trait LinearOperator {
    fn dim(&self) -> usize;
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

pub struct Laplacian<'g> {
    graph: &'g Graph,
    /// `1 / sqrt(vwgt)`.
    inv_sqrt_w: Vec<f64>,
    /// Unit null vector.
    null: Vec<f64>,
    /// Gershgorin bound on the spectrum.
    norm_bound: f64,
}

impl<'g> Laplacian<'g> {
    pub fn new(graph: &'g Graph, ws: &Workspace) -> Result<Self, PartitionError> {
        let n = graph.len();
        let mut inv_sqrt_w = ws.alloc_empty(n)?;
        let mut null = ws.alloc_empty(n)?;
        for vtx in graph.vertices() {
            let s = (vtx.vwgt as f64).sqrt();
            inv_sqrt_w.push(1.0 / s);
            null.push(s);
        }
        normalize(&mut null);
        let mut norm_bound: f64 = 0.0;
        for (v, vtx) in graph.vertices().iter().enumerate() {
            let off: f64 = vtx
                .weighted_neighbors()
                .map(|(u, w)| w * inv_sqrt_w[u])
                .sum::<f64>()
                * inv_sqrt_w[v];
            norm_bound = norm_bound.max(vtx.diagonal() * inv_sqrt_w[v] * inv_sqrt_w[v] + off);
        }
        Ok(Self {
            graph,
            inv_sqrt_w,
            null,
            norm_bound,
        })
    }

    pub fn null_vector(&self) -> &[f64] {
        &self.null
    }

    /// Upper bound on the largest eigenvalue.
    pub fn norm_bound(&self) -> f64 {
        self.norm_bound
    }

    /// Remove the null-vector component of `x`.
    pub fn deflate(&self, x: &mut [f64]) {
        let c = dot(x, &self.null);
        for (xi, ni) in x.iter_mut().zip(&self.null) {
            *xi -= c * ni;
        }
    }

    /// `x = W^{-1/2} y`.
    pub fn to_graph_space(&self, y: &[f64], ws: &Workspace) -> Result<Vec<f64>, PartitionError> {
        let mut x = ws.alloc_copy(y)?;
        for (xi, s) in x.iter_mut().zip(&self.inv_sqrt_w) {
            *xi *= s;
        }
        Ok(x)
    }

    /// `y = W^{1/2} x`.
    pub fn from_graph_space(&self, x: &[f64], ws: &Workspace) -> Result<Vec<f64>, PartitionError> {
        let mut y = ws.alloc_copy(x)?;
        for (yi, s) in y.iter_mut().zip(&self.inv_sqrt_w) {
            *yi /= s;
        }
        Ok(y)
    }

    #[inline]
    fn row(&self, v: usize, x: &[f64]) -> f64 {
        let vtx = self.graph.vertex(v);
        let s = &self.inv_sqrt_w;
        let mut acc = vtx.diagonal() * s[v] * x[v];
        for (u, w) in vtx.weighted_neighbors() {
            acc -= w * s[u] * x[u];
        }
        acc * s[v]
    }
}

impl LinearOperator for Laplacian<'_> {
    fn dim(&self) -> usize {
        self.graph.len()
    }

    #[cfg(not(feature = "parallel"))]
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        for (v, yv) in y.iter_mut().enumerate() {
            *yv = self.row(v, x);
        }
    }

    #[cfg(feature = "parallel")]
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        use rayon::prelude::*;
        y.par_iter_mut()
            .enumerate()
            .for_each(|(v, yv)| *yv = self.row(v, x));
    }
}

/// `P (A - σI) P` where `P` projects out an orthonormal set of vectors.
pub struct Projected<'a, O: LinearOperator> {
    pub op: &'a O,
    pub shift: f64,
    pub against: Vec<&'a [f64]>,
}

impl<O: LinearOperator> Projected<'_, O> {
    pub fn project(&self, x: &mut [f64]) {
        for q in &self.against {
            let c = dot(x, q);
            for (xi, qi) in x.iter_mut().zip(q.iter()) {
                *xi -= c * qi;
            }
        }
    }
}

impl<O: LinearOperator> LinearOperator for Projected<'_, O> {
    fn dim(&self) -> usize {
        self.op.dim()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.op.apply(x, y);
        for (yi, xi) in y.iter_mut().zip(x) {
            *yi -= self.shift * xi;
        }
        self.project(y);
    }
}
