//! Rotations of 2- and 3-dimensional embeddings before median cuts.
//!
//! Spectral embeddings of meshes tend to form arms or clusters that are not
//! aligned with the coordinate axes. Rotating so that the weighted quartic
//! `Σ w (x²y² + y²z² + z²x²)` is minimal puts the arms on the axes, where
//! axis-wise medians cut between them.

use std::f64::consts::FRAC_PI_2;

/// Coarse samples per angle before golden-section refinement.
const SAMPLES: usize = 32;
const GOLDEN_STEPS: usize = 40;
const SWEEPS: usize = 3;

fn rotate_pair(a: f64, b: f64, theta: f64) -> (f64, f64) {
    let (s, c) = theta.sin_cos();
    (c * a + s * b, -s * a + c * b)
}

fn cost2d(x: &[f64], y: &[f64], w: &[f64], theta: f64) -> f64 {
    x.iter()
        .zip(y)
        .zip(w)
        .map(|((&a, &b), &wt)| {
            let (p, q) = rotate_pair(a, b, theta);
            wt * p * p * q * q
        })
        .sum()
}

/// Minimize `f` over one period `[0, π/2)` of a quarter-turn-symmetric cost.
fn search_angle(f: impl Fn(f64) -> f64) -> f64 {
    let h = FRAC_PI_2 / SAMPLES as f64;
    let (mut best, mut best_val) = (0.0, f(0.0));
    for i in 1..SAMPLES {
        let t = i as f64 * h;
        let val = f(t);
        if val < best_val {
            best = t;
            best_val = val;
        }
    }
    let ratio = 0.5 * (5f64.sqrt() - 1.0);
    let (mut a, mut b) = (best - h, best + h);
    let mut c = b - ratio * (b - a);
    let mut d = a + ratio * (b - a);
    let (mut fc, mut fd) = (f(c), f(d));
    for _ in 0..GOLDEN_STEPS {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - ratio * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + ratio * (b - a);
            fd = f(d);
        }
    }
    let t = 0.5 * (a + b);
    if f(t) < best_val { t } else { best }
}

/// Rotate `(x, y)` in place by the angle minimizing the weighted quartic.
/// Returns the angle.
pub fn opt2d(x: &mut [f64], y: &mut [f64], w: &[f64]) -> f64 {
    let theta = search_angle(|t| cost2d(x, y, w, t));
    for (a, b) in x.iter_mut().zip(y.iter_mut()) {
        (*a, *b) = rotate_pair(*a, *b, theta);
    }
    log::trace!("opt2d: rotated by {theta:.4} rad");
    theta
}

fn cost3d(v: [&[f64]; 3], w: &[f64]) -> f64 {
    (0..w.len())
        .map(|i| {
            let (x2, y2, z2) = (v[0][i] * v[0][i], v[1][i] * v[1][i], v[2][i] * v[2][i]);
            w[i] * (x2 * y2 + y2 * z2 + z2 * x2)
        })
        .sum()
}

/// Rotate `(x, y, z)` in place by plane rotations in the xy, yz and zx
/// planes, sweeping until no plane improves the weighted quartic.
pub fn opt3d(x: &mut [f64], y: &mut [f64], z: &mut [f64], w: &[f64]) {
    let mut current = cost3d([&*x, &*y, &*z], w);
    for sweep in 0..SWEEPS {
        let start = current;
        for plane in 0..3 {
            let (a, b, c): (&mut [f64], &mut [f64], &[f64]) = match plane {
                0 => (&mut *x, &mut *y, &*z),
                1 => (&mut *y, &mut *z, &*x),
                _ => (&mut *z, &mut *x, &*y),
            };
            let eval = |t: f64| {
                (0..w.len())
                    .map(|i| {
                        let (p, q) = rotate_pair(a[i], b[i], t);
                        let r = c[i];
                        w[i] * (p * p * q * q + q * q * r * r + r * r * p * p)
                    })
                    .sum::<f64>()
            };
            let theta = search_angle(eval);
            for (p, q) in a.iter_mut().zip(b.iter_mut()) {
                (*p, *q) = rotate_pair(*p, *q, theta);
            }
        }
        current = cost3d([&*x, &*y, &*z], w);
        log::trace!("opt3d sweep {sweep}: cost {start:.4e} -> {current:.4e}");
        if current >= start * (1.0 - 1e-9) {
            break;
        }
    }
}
