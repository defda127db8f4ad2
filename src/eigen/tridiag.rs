//! Symmetric tridiagonal eigenproblems from the Lanczos recurrence.
//!
//! `alpha` is the diagonal (length `j`) and `beta` the off-diagonal
//! (length `j - 1`, `beta[i]` couples rows `i` and `i + 1`).

/// Relative cost of one QL sweep element against one Sturm step element.
const QL_COST_FACTOR: f64 = 8.0;
/// Inverse iteration sweeps used when the recurrence is unreliable.
const INVERSE_ITERATIONS: usize = 3;

/// Gershgorin interval containing every eigenvalue.
pub fn gershgorin(alpha: &[f64], beta: &[f64]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for i in 0..alpha.len() {
        let r = if i > 0 { beta[i - 1].abs() } else { 0.0 }
            + if i < beta.len() { beta[i].abs() } else { 0.0 };
        lo = lo.min(alpha[i] - r);
        hi = hi.max(alpha[i] + r);
    }
    (lo, hi)
}

/// Number of eigenvalues strictly less than `x`.
pub fn sturm_count(alpha: &[f64], beta: &[f64], x: f64) -> usize {
    let mut count = 0;
    let mut q = 1.0;
    for i in 0..alpha.len() {
        let b2 = if i > 0 { beta[i - 1] * beta[i - 1] } else { 0.0 };
        q = alpha[i] - x - if i > 0 { b2 / q } else { 0.0 };
        if q == 0.0 {
            q = f64::EPSILON * (alpha[i].abs() + x.abs()).max(f64::MIN_POSITIVE);
        }
        if q < 0.0 {
            count += 1;
        }
    }
    count
}

/// The `k`-th smallest eigenvalue (0-based) by bisection on Sturm counts.
pub fn bisect(alpha: &[f64], beta: &[f64], k: usize, tol: f64) -> f64 {
    let (mut lo, mut hi) = gershgorin(alpha, beta);
    while hi - lo > tol.max(f64::EPSILON * (lo.abs() + hi.abs())) {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if sturm_count(alpha, beta, mid) > k {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}

/// All eigenvalues, ascending, by implicit QL with Wilkinson shifts.
pub fn ql_eigenvalues(alpha: &[f64], beta: &[f64]) -> Vec<f64> {
    let n = alpha.len();
    let mut d = alpha.to_vec();
    let mut e = vec![0.0; n];
    e[..beta.len()].copy_from_slice(beta);
    for l in 0..n {
        let mut iter = 0;
        loop {
            let mut m = l;
            while m + 1 < n {
                let dd = d[m].abs() + d[m + 1].abs();
                if e[m].abs() <= f64::EPSILON * dd {
                    break;
                }
                m += 1;
            }
            if m == l {
                break;
            }
            iter += 1;
            if iter > 60 {
                log::trace!("ql: no convergence for eigenvalue {l}");
                break;
            }
            let mut g = (d[l + 1] - d[l]) / (2.0 * e[l]);
            let mut r = g.hypot(1.0);
            g = d[m] - d[l] + e[l] / (g + r.copysign(g));
            let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
            let mut i = m;
            let mut underflow = false;
            while i > l {
                i -= 1;
                let f = s * e[i];
                let b = c * e[i];
                r = f.hypot(g);
                e[i + 1] = r;
                if r == 0.0 {
                    d[i + 1] -= p;
                    e[m] = 0.0;
                    underflow = true;
                    break;
                }
                s = f / r;
                c = g / r;
                g = d[i + 1] - p;
                let t = (d[i] - g) * s + 2.0 * c * b;
                p = s * t;
                d[i + 1] = g + p;
                g = c * t - b;
            }
            if underflow {
                continue;
            }
            d[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
    }
    d.sort_by(f64::total_cmp);
    d
}

/// Eigenvalues at the requested ascending indices.
///
/// Chooses bisection when the requested count is small enough that
/// `count × steps × j` undercuts the `O(j²)` cost of a full QL sweep.
pub fn ritz_values(alpha: &[f64], beta: &[f64], which: &[usize]) -> Vec<f64> {
    let j = alpha.len();
    let (lo, hi) = gershgorin(alpha, beta);
    let tol = f64::EPSILON * (lo.abs().max(hi.abs())).max(f64::MIN_POSITIVE);
    let steps = ((hi - lo).max(tol) / tol).log2().ceil().max(1.0);
    let bisect_cost = which.len() as f64 * steps * j as f64;
    let ql_cost = QL_COST_FACTOR * (j * j) as f64;
    if bisect_cost < ql_cost {
        which.iter().map(|&k| bisect(alpha, beta, k, tol)).collect()
    } else {
        let all = ql_eigenvalues(alpha, beta);
        which.iter().map(|&k| all[k]).collect()
    }
}

/// Unit eigenvector of `T` for eigenvalue `lambda`.
///
/// The three-term recurrence is tried first; if it breaks down or its
/// residual is poor, a few steps of inverse iteration are used instead.
pub fn tevec(alpha: &[f64], beta: &[f64], lambda: f64) -> Vec<f64> {
    let j = alpha.len();
    if j == 1 {
        return vec![1.0];
    }
    let scale = alpha
        .iter()
        .chain(beta)
        .fold(0.0f64, |m, x| m.max(x.abs()))
        .max(f64::MIN_POSITIVE);
    if let Some(s) = recurrence(alpha, beta, lambda) {
        if residual(alpha, beta, lambda, &s) <= 1e3 * f64::EPSILON * scale * j as f64 {
            return s;
        }
    }
    inverse_iteration(alpha, beta, lambda, scale)
}

fn recurrence(alpha: &[f64], beta: &[f64], lambda: f64) -> Option<Vec<f64>> {
    let j = alpha.len();
    let mut s = vec![0.0; j];
    s[0] = 1.0;
    for i in 0..j - 1 {
        if beta[i] == 0.0 {
            return None;
        }
        let prev = if i > 0 { beta[i - 1] * s[i - 1] } else { 0.0 };
        s[i + 1] = ((lambda - alpha[i]) * s[i] - prev) / beta[i];
        if !s[i + 1].is_finite() {
            return None;
        }
    }
    let norm = s.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    s.iter_mut().for_each(|x| *x /= norm);
    Some(s)
}

fn residual(alpha: &[f64], beta: &[f64], lambda: f64, s: &[f64]) -> f64 {
    let j = alpha.len();
    let mut r2 = 0.0;
    for i in 0..j {
        let mut t = (alpha[i] - lambda) * s[i];
        if i > 0 {
            t += beta[i - 1] * s[i - 1];
        }
        if i + 1 < j {
            t += beta[i] * s[i + 1];
        }
        r2 += t * t;
    }
    r2.sqrt()
}

/// Solve `(T - σI) z = rhs` by Gaussian elimination with partial pivoting.
fn shifted_solve(alpha: &[f64], beta: &[f64], sigma: f64, rhs: &mut [f64], tiny: f64) {
    let j = alpha.len();
    // Row i after pivoting holds up to three entries: u0 (diag), u1, u2.
    let mut u0 = vec![0.0; j];
    let mut u1 = vec![0.0; j];
    let mut u2 = vec![0.0; j];
    let mut d = alpha[0] - sigma;
    let mut up = if j > 1 { beta[0] } else { 0.0 };
    for i in 0..j - 1 {
        let sub = beta[i];
        let next_d = alpha[i + 1] - sigma;
        let next_up = if i + 2 < j { beta[i + 1] } else { 0.0 };
        if d.abs() >= sub.abs() {
            let piv = if d == 0.0 { tiny } else { d };
            let m = sub / piv;
            u0[i] = piv;
            u1[i] = up;
            u2[i] = 0.0;
            rhs[i + 1] -= m * rhs[i];
            d = next_d - m * up;
            up = next_up;
        } else {
            // swap rows i and i + 1
            let m = d / sub;
            u0[i] = sub;
            u1[i] = next_d;
            u2[i] = next_up;
            rhs.swap(i, i + 1);
            rhs[i + 1] -= m * rhs[i];
            d = up - m * next_d;
            up = -m * next_up;
        }
    }
    u0[j - 1] = if d == 0.0 { tiny } else { d };
    for i in (0..j).rev() {
        let mut t = rhs[i];
        if i + 1 < j {
            t -= u1[i] * rhs[i + 1];
        }
        if i + 2 < j {
            t -= u2[i] * rhs[i + 2];
        }
        rhs[i] = t / u0[i];
    }
}

fn inverse_iteration(alpha: &[f64], beta: &[f64], lambda: f64, scale: f64) -> Vec<f64> {
    let j = alpha.len();
    let tiny = f64::EPSILON * scale;
    let sigma = lambda + tiny;
    // Deterministic, non-degenerate start.
    let mut z: Vec<f64> = (0..j).map(|i| 1.0 + 0.1 * ((i * 7 % 11) as f64)).collect();
    for _ in 0..INVERSE_ITERATIONS {
        shifted_solve(alpha, beta, sigma, &mut z, tiny);
        let norm = z.iter().map(|x| x * x).sum::<f64>().sqrt();
        if !(norm > 0.0) || !norm.is_finite() {
            break;
        }
        z.iter_mut().for_each(|x| *x /= norm);
    }
    z
}
