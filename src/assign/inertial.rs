//! Inertial partitioning: project vertex coordinates onto the principal
//! axes of the weighted point cloud.

/// Jacobi rotations before giving up on off-diagonal decay.
const JACOBI_SWEEPS: usize = 50;

/// Eigen-decomposition of a symmetric 3×3 matrix by cyclic Jacobi.
/// Returns eigenvalues and column eigenvectors (`vecs[k]` is the k-th axis).
pub fn jacobi3(mut a: [[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    for _ in 0..JACOBI_SWEEPS {
        let off = a[0][1].abs() + a[0][2].abs() + a[1][2].abs();
        let scale = a[0][0].abs() + a[1][1].abs() + a[2][2].abs();
        if off <= 1e-15 * scale.max(f64::MIN_POSITIVE) {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            if a[p][q] == 0.0 {
                continue;
            }
            let theta = 0.5 * (a[q][q] - a[p][p]) / a[p][q];
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;
            for k in 0..3 {
                let (akp, akq) = (a[k][p], a[k][q]);
                a[k][p] = c * akp - s * akq;
                a[k][q] = s * akp + c * akq;
            }
            for k in 0..3 {
                let (apk, aqk) = (a[p][k], a[q][k]);
                a[p][k] = c * apk - s * aqk;
                a[q][k] = s * apk + c * aqk;
            }
            for row in v.iter_mut() {
                let (vp, vq) = (row[p], row[q]);
                row[p] = c * vp - s * vq;
                row[q] = s * vp + c * vq;
            }
        }
    }
    let vals = [a[0][0], a[1][1], a[2][2]];
    let vecs = [0, 1, 2].map(|k| [v[0][k], v[1][k], v[2][k]]);
    (vals, vecs)
}

/// Coordinates projected on the `naxes` principal axes of largest spread,
/// widest first. `coords` holds one slice per geometric dimension.
pub fn inertial_vectors(coords: &[&[f64]], vwgts: &[f64], naxes: usize) -> Vec<Vec<f64>> {
    let dim = coords.len();
    let n = vwgts.len();
    let total: f64 = vwgts.iter().sum();
    let mut centre = [0.0; 3];
    for (a, c) in coords.iter().enumerate() {
        centre[a] = c.iter().zip(vwgts).map(|(x, w)| x * w).sum::<f64>() / total;
    }
    let mut tensor = [[0.0; 3]; 3];
    for i in 0..n {
        for a in 0..dim {
            let da = coords[a][i] - centre[a];
            for b in a..dim {
                tensor[a][b] += vwgts[i] * da * (coords[b][i] - centre[b]);
            }
        }
    }
    for a in 0..3 {
        for b in 0..a {
            tensor[a][b] = tensor[b][a];
        }
    }
    let (vals, axes) = jacobi3(tensor);
    let mut order: Vec<usize> = (0..dim).collect();
    order.sort_by(|&x, &y| vals[y].total_cmp(&vals[x]));
    log::debug!(
        "inertial: centre {:?}, spreads {:?}",
        &centre[..dim],
        order.iter().map(|&k| vals[k]).collect::<Vec<_>>()
    );
    order
        .into_iter()
        .take(naxes)
        .map(|k| {
            (0..n)
                .map(|i| (0..dim).map(|a| axes[k][a] * (coords[a][i] - centre[a])).sum())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobi_diagonalizes() {
        let m = [[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 1.0]];
        let (vals, vecs) = jacobi3(m);
        for k in 0..3 {
            for r in 0..3 {
                let mv: f64 = (0..3).map(|c| m[r][c] * vecs[k][c]).sum();
                assert!((mv - vals[k] * vecs[k][r]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn principal_axis_of_a_tilted_line() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys: Vec<f64> = (0..20).map(|i| 2.0 * i as f64 + 0.01 * ((i * 7) % 3) as f64).collect();
        let w = vec![1.0; 20];
        let proj = inertial_vectors(&[xs.as_slice(), ys.as_slice()], &w, 1);
        assert_eq!(proj.len(), 1);
        // Projections increase (or decrease) monotonically along the line.
        let increasing = proj[0][1] > proj[0][0];
        for i in 1..20 {
            assert_eq!(proj[0][i] > proj[0][i - 1], increasing);
        }
    }
}
