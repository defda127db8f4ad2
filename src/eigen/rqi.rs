//! Rayleigh quotient iteration with SYMMLQ inner solves.
//!
//! Refines an approximate eigenvector, typically one interpolated from a
//! coarser graph. Each step solves `(A − ρI) x = y` for the current
//! Rayleigh quotient `ρ`, restricted to the complement of the null vector
//! and of vectors already refined, with relative tolerance
//! `residual / rqi_factor`.

use super::operator::{Laplacian, LinearOperator, Projected};
use super::symmlq::symmlq;
use super::{checkeig, dot, normalize, orthogonalize};
use crate::config::EigenConfig;
use crate::diagnostics::Warning;
use crate::error::PartitionError;
use crate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq)]
pub struct RqiResult {
    pub value: f64,
    pub residual: f64,
    pub steps: usize,
}

/// Refine `y` in place until `‖Ay − ρy‖ ≤ tol` or the step limit.
///
/// `previous` must be orthonormal; `y` is kept orthogonal to it and to the
/// null vector.
pub fn rqi(
    op: &Laplacian<'_>,
    y: &mut [f64],
    previous: &[Vec<f64>],
    tol: f64,
    cfg: &EigenConfig,
    warnings: &mut Vec<Warning>,
    ws: &Workspace,
) -> Result<RqiResult, PartitionError> {
    let n = op.dim();
    let mut against: Vec<&[f64]> = Vec::with_capacity(previous.len() + 1);
    against.push(op.null_vector());
    against.extend(previous.iter().map(Vec::as_slice));
    orthogonalize(y, &against);
    orthogonalize(y, &against);
    normalize(y);

    let mut ay: Vec<f64> = ws.alloc(n, 0.0)?;
    op.apply(y, &mut ay);
    let mut rho = dot(y, &ay);
    let mut residual = checkeig(op, y, rho);
    let mut steps = 0;
    while residual > tol {
        if steps >= cfg.rqi_max_steps {
            warnings.push(Warning::RqiMaxSteps { residual });
            break;
        }
        steps += 1;
        let shifted = Projected {
            op,
            shift: rho,
            against: against.clone(),
        };
        let rtol = (residual / cfg.rqi_factor).min(0.5);
        let solve = symmlq(&shifted, y, rtol, cfg.symmlq_max_iterations, ws)?;
        if solve.hit_limit {
            warnings.push(Warning::SymmlqMaxIterations {
                residual: solve.residual,
            });
        }
        let mut x = solve.x;
        orthogonalize(&mut x, &against);
        if normalize(&mut x) == 0.0 {
            break;
        }
        op.apply(&x, &mut ay);
        let next_rho = dot(&x, &ay);
        let next_residual = checkeig(op, &x, next_rho);
        log::trace!("rqi step {steps}: ρ = {next_rho:.6e}, residual {next_residual:.3e}");
        y.copy_from_slice(&x);
        rho = next_rho;
        residual = next_residual;
    }
    Ok(RqiResult {
        value: rho,
        residual,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn rqi_sharpens_a_rough_fiedler_guess() {
        let ws = Workspace::unlimited();
        let n = 30;
        let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let g = Graph::from_edges(n, &edges);
        let op = Laplacian::new(&g, &ws).unwrap();
        // Exact Fiedler vector is cos(π(i + 1/2)/n); start from a linear ramp.
        let mut y: Vec<f64> = (0..n).map(|i| (n as f64 / 2.0) - i as f64).collect();
        let mut warnings = Vec::new();
        let cfg = EigenConfig::default();
        let res = rqi(&op, &mut y, &[], 1e-8, &cfg, &mut warnings, &ws).unwrap();
        let exact = 2.0 - 2.0 * (std::f64::consts::PI / n as f64).cos();
        assert!((res.value - exact).abs() < 1e-8, "{res:?}");
        assert!(res.residual <= 1e-8);
        assert!(warnings.is_empty());
    }
}
