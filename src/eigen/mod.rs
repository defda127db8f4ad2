//! Laplacian eigensolvers.
//!
//! [`eigensolve`] runs Lanczos on a graph directly; the multilevel variant
//! that refines interpolated vectors with RQI lives in
//! [`crate::coarsen::multilevel`]. Both return vectors in graph space
//! (`x = W^{-1/2} y`), ordered by ascending eigenvalue, with the trivial
//! null vector excluded.

pub mod lanczos;
pub mod operator;
pub mod rqi;
pub mod symmlq;
pub mod tridiag;

use crate::config::EigenConfig;
use crate::diagnostics::Warning;
use crate::error::PartitionError;
use crate::graph::Graph;
use crate::workspace::Workspace;
use operator::{Laplacian, LinearOperator};
use rand::Rng;

/// Actual over predicted residual above which orthogonality loss is reported.
pub const ORTHO_LOSS_MINOR: f64 = 10.0;
/// Ratio above which the loss is considered substantial.
pub const ORTHO_LOSS_SUBSTANTIAL: f64 = 1000.0;
/// Convergence is judged relative to `max(|λ|, EIG_FLOOR · ‖A‖)`.
pub(crate) const EIG_FLOOR: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct EigenPair {
    pub value: f64,
    pub vector: Vec<f64>,
    /// `‖Ay − λy‖ / ‖y‖` in operator space.
    pub residual: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EigenSolution {
    pub pairs: Vec<EigenPair>,
    /// Lanczos steps (plus RQI steps for multilevel solves).
    pub iterations: usize,
    pub warnings: Vec<Warning>,
}

/// The `nev` smallest nontrivial eigenpairs of `graph`'s Laplacian.
///
/// # Errors
/// [`PartitionError::ProblemTooSmall`] when `graph` has fewer than
/// `nev + 1` vertices; [`PartitionError::OutOfMemory`] from the workspace.
pub fn eigensolve<R: Rng + ?Sized>(
    graph: &Graph,
    nev: usize,
    cfg: &EigenConfig,
    rng: &mut R,
    ws: &Workspace,
) -> Result<EigenSolution, PartitionError> {
    if graph.len() < nev + 1 {
        return Err(PartitionError::ProblemTooSmall {
            vertices: graph.len(),
            eigenpairs: nev,
        });
    }
    let op = Laplacian::new(graph, ws)?;
    let mut sol = lanczos::lanczos(&op, nev, cfg, rng, ws)?;
    for pair in &mut sol.pairs {
        pair.vector = op.to_graph_space(&pair.vector, ws)?;
    }
    for (i, p) in sol.pairs.iter().enumerate() {
        log::debug!(
            "eigenpair {i}: λ = {:.6e}, residual {:.3e}",
            p.value,
            p.residual
        );
    }
    Ok(sol)
}

/// `‖Ay − λy‖ / ‖y‖`.
pub fn checkeig<O: LinearOperator>(op: &O, y: &[f64], lambda: f64) -> f64 {
    let mut ay = vec![0.0; y.len()];
    op.apply(y, &mut ay);
    let r: f64 = ay
        .iter()
        .zip(y)
        .map(|(a, b)| (a - lambda * b).powi(2))
        .sum::<f64>()
        .sqrt();
    let ny = norm(y);
    if ny > 0.0 { r / ny } else { r }
}

/// Tolerance a residual must meet for eigenvalue `lambda`.
pub(crate) fn residual_target(eigtol: f64, lambda: f64, norm_bound: f64) -> f64 {
    eigtol * lambda.abs().max(EIG_FLOOR * norm_bound)
}

#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// `y += a·x`.
#[inline]
pub fn axpy(a: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += a * xi;
    }
}

/// Scale to unit length and return the old norm (zero vectors are left alone).
pub fn normalize(x: &mut [f64]) -> f64 {
    let n = norm(x);
    if n > 0.0 {
        x.iter_mut().for_each(|v| *v /= n);
    }
    n
}

/// Modified Gram–Schmidt against an orthonormal set.
pub fn orthogonalize<V: AsRef<[f64]>>(x: &mut [f64], basis: &[V]) {
    for q in basis {
        let q = q.as_ref();
        let c = dot(x, q);
        axpy(-c, q, x);
    }
}

/// Random vector in `[-1, 1)^n`.
pub(crate) fn random_vector<R: Rng + ?Sized>(
    n: usize,
    rng: &mut R,
    ws: &Workspace,
) -> Result<Vec<f64>, PartitionError> {
    let mut v = ws.alloc_empty(n)?;
    v.extend((0..n).map(|_| rng.gen_range(-1.0..1.0)));
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn too_small_problem_is_an_error() {
        let ws = Workspace::unlimited();
        let g = Graph::from_edges(2, &[(0, 1)]);
        let mut rng = SmallRng::seed_from_u64(1);
        let err = eigensolve(&g, 2, &EigenConfig::default(), &mut rng, &ws).unwrap_err();
        assert_eq!(
            err,
            PartitionError::ProblemTooSmall {
                vertices: 2,
                eigenpairs: 2
            }
        );
    }

    #[test]
    fn fiedler_vector_of_weighted_pair_chain() {
        // Two heavy pairs joined by a light edge split in the middle.
        let ws = Workspace::unlimited();
        let g = Graph::from_weighted_edges(4, &[(0, 1, 10.0), (1, 2, 0.1), (2, 3, 10.0)]);
        let mut rng = SmallRng::seed_from_u64(7);
        let sol = eigensolve(&g, 1, &EigenConfig::default(), &mut rng, &ws).unwrap();
        let x = &sol.pairs[0].vector;
        assert!(x[0] * x[1] > 0.0 && x[2] * x[3] > 0.0 && x[1] * x[2] < 0.0, "{x:?}");
        assert!(sol.pairs[0].residual < 1e-3);
    }

    #[test]
    fn orthogonalize_removes_components() {
        let e0 = vec![1.0, 0.0, 0.0];
        let mut x = vec![3.0, 4.0, 0.0];
        orthogonalize(&mut x, &[e0]);
        assert_eq!(x, vec![0.0, 4.0, 0.0]);
        assert_eq!(normalize(&mut x), 4.0);
    }
}
