//! SYMMLQ for symmetric, possibly indefinite systems `(A − σI) x = b`.
//!
//! Lanczos on `A − σI` started from `b`, with an LQ factorization of the
//! tridiagonal built by plane rotations. Two iterates are available at
//! every step: the SYMMLQ point and the CG point; the residual of the CG
//! point is known in closed form and drives the stopping test. Both points
//! are checked explicitly on exit and the better one returned.

use super::operator::LinearOperator;
use super::{axpy, dot, norm};
use crate::error::PartitionError;
use crate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq)]
pub struct SymmlqResult {
    pub x: Vec<f64>,
    /// `‖b − (A − σI) x‖`.
    pub residual: f64,
    pub iterations: usize,
    /// Stopped by the iteration limit rather than the tolerance.
    pub hit_limit: bool,
}

/// Solve `op · x = b` to relative residual `rtol`.
///
/// `op` already includes the shift; see
/// [`Projected`](super::operator::Projected).
pub fn symmlq<O: LinearOperator>(
    op: &O,
    b: &[f64],
    rtol: f64,
    itnlim: usize,
    ws: &Workspace,
) -> Result<SymmlqResult, PartitionError> {
    let n = op.dim();
    let beta1 = norm(b);
    if beta1 == 0.0 {
        return Ok(SymmlqResult {
            x: ws.alloc(n, 0.0)?,
            residual: 0.0,
            iterations: 0,
            hit_limit: false,
        });
    }
    let frame = ws.frame();
    let mut x: Vec<f64> = ws.alloc(n, 0.0)?;

    let mut v = ws.alloc_copy(b)?;
    v.iter_mut().for_each(|e| *e /= beta1);
    let mut v_prev: Vec<f64> = ws.alloc(n, 0.0)?;
    let mut y: Vec<f64> = ws.alloc(n, 0.0)?;
    op.apply(&v, &mut y);
    let alfa = dot(&v, &y);
    axpy(-alfa, &v, &mut y);
    let mut beta = norm(&y);

    let mut w = ws.alloc_copy(&v)?;
    let mut gbar = alfa;
    let mut dbar = beta;
    let mut rhs1 = beta1;
    let mut rhs2 = 0.0;
    let mut cgnorm = if gbar != 0.0 {
        beta * (beta1 / gbar).abs()
    } else {
        f64::INFINITY
    };
    let tiny = f64::EPSILON * beta1;
    let mut itn = 0;
    let mut hit_limit = false;

    loop {
        if cgnorm <= rtol * beta1 || beta <= tiny {
            break;
        }
        if itn >= itnlim {
            hit_limit = true;
            break;
        }
        itn += 1;

        // Next Lanczos vector.
        std::mem::swap(&mut v_prev, &mut v);
        for (vi, yi) in v.iter_mut().zip(&y) {
            *vi = yi / beta;
        }
        op.apply(&v, &mut y);
        axpy(-beta, &v_prev, &mut y);
        let alfa = dot(&v, &y);
        axpy(-alfa, &v, &mut y);
        let oldb = beta;
        beta = norm(&y);

        // Rotate columns k, k+1 of the tridiagonal.
        let gamma = gbar.hypot(oldb);
        let cs = gbar / gamma;
        let sn = oldb / gamma;
        let delta = cs * dbar + sn * alfa;
        gbar = sn * dbar - cs * alfa;
        let epsln = sn * beta;
        dbar = -cs * beta;

        let z = rhs1 / gamma;
        for i in 0..n {
            x[i] += z * (cs * w[i] + sn * v[i]);
            w[i] = sn * w[i] - cs * v[i];
        }
        rhs1 = rhs2 - delta * z;
        rhs2 = -epsln * z;

        cgnorm = if gbar != 0.0 {
            let zbar = rhs1 / gbar;
            beta * (sn * z - cs * zbar).abs()
        } else {
            f64::INFINITY
        };
        log::trace!("symmlq {itn}: cg residual estimate {cgnorm:.3e}");
    }

    let mut r: Vec<f64> = ws.alloc(n, 0.0)?;
    let lq_res = explicit_residual(op, b, &x, &mut r);
    let mut best = (lq_res, None);
    if gbar != 0.0 {
        let zbar = rhs1 / gbar;
        let mut xc = ws.alloc_copy(&x)?;
        axpy(zbar, &w, &mut xc);
        let cg_res = explicit_residual(op, b, &xc, &mut r);
        if cg_res < lq_res {
            best = (cg_res, Some(xc));
        }
    }
    let (residual, cg) = best;
    let x = cg.unwrap_or(x);
    // Scratch vectors are released; the result is charged afresh.
    drop(frame);
    let x = ws.alloc_copy(&x)?;
    Ok(SymmlqResult {
        x,
        residual,
        iterations: itn,
        hit_limit,
    })
}

fn explicit_residual<O: LinearOperator>(op: &O, b: &[f64], x: &[f64], r: &mut [f64]) -> f64 {
    op.apply(x, r);
    for (ri, bi) in r.iter_mut().zip(b) {
        *ri = bi - *ri;
    }
    norm(r)
}
