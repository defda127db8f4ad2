//! Turning continuous vertex coordinates (eigenvectors or principal-axis
//! projections) into set numbers.

pub mod inertial;
pub mod median;
pub mod rotate;
pub mod simple;

use crate::config::{MapperConfig, MedianType};
use crate::diagnostics::Warning;

/// Assign `2^vecs.len()` sets from the vectors in `vecs`.
///
/// `goals[c]` is the desired weight of child `c`; bit `j` of a set number
/// is decided by vector `j`. Vectors are rotated first when configured and
/// there are two or three of them.
pub fn map_vectors(
    mut vecs: Vec<Vec<f64>>,
    vwgts: &[f64],
    goals: &[f64],
    cfg: &MapperConfig,
    warnings: &mut Vec<Warning>,
) -> Vec<usize> {
    let n = vwgts.len();
    let mut sets = vec![0; n];
    debug_assert_eq!(goals.len(), 1 << vecs.len());
    if cfg.rotate {
        match vecs.as_mut_slice() {
            [x, y] => {
                rotate::opt2d(x, y, vwgts);
            }
            [x, y, z] => rotate::opt3d(x, y, z, vwgts),
            _ => {}
        }
    }
    match cfg.median_type {
        MedianType::ZeroCut => median::zero_cut(&vecs, &mut sets),
        MedianType::IndependentMedians => {
            median::independent_medians(&vecs, vwgts, goals, &mut sets)
        }
        MedianType::RecursiveMedian => median::rec_median_k(&vecs, vwgts, goals, &mut sets),
        MedianType::BipartiteMatching => {
            warnings.push(Warning::MapperFallback);
            median::rec_median_k(&vecs, vwgts, goals, &mut sets)
        }
    }
    sets
}

/// Gray-coded slabs along a single vector for `goals.len()` sets.
pub fn map_slabs(vals: &[f64], vwgts: &[f64], goals: &[f64]) -> Vec<usize> {
    let mut sets = vec![0; vwgts.len()];
    median::rec_median_1(vals, vwgts, goals, &mut sets);
    sets
}
