//! Weighted median cuts of eigenvector (or coordinate) values.

/// Split `vals` into set 0 (low values) and set 1 (high values) so that the
/// weight of set 0 approaches `goals[0] / (goals[0] + goals[1])` of the
/// total.
///
/// The split value is found by bracketing between data values: each guess
/// counts the weight at or below it and moves one end of the bracket to the
/// nearest data value on its side, until both ends meet. Vertices that tie
/// at the split value go to set 0 while it is under its share. A zero goal
/// sends everything to the other set without searching.
///
/// Returns the number of bracketing steps.
pub fn median(vals: &[f64], vwgts: &[f64], goals: [f64; 2], sets: &mut [usize]) -> usize {
    if vals.is_empty() {
        return 0;
    }
    if goals[1] <= 0.0 {
        sets.fill(0);
        return 0;
    }
    if goals[0] <= 0.0 {
        sets.fill(1);
        return 0;
    }
    let total: f64 = vwgts.iter().sum();
    let target = total * goals[0] / (goals[0] + goals[1]);

    let mut lo = vals.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut steps = 0;
    while lo < hi {
        steps += 1;
        let mut guess = 0.5 * (lo + hi);
        if guess >= hi {
            guess = lo;
        }
        let mut below = 0.0;
        let mut max_below = f64::NEG_INFINITY;
        let mut min_above = f64::INFINITY;
        for (&x, &w) in vals.iter().zip(vwgts) {
            if x <= guess {
                below += w;
                max_below = max_below.max(x);
            } else {
                min_above = min_above.min(x);
            }
        }
        if below == target {
            lo = max_below;
            hi = max_below;
        } else if below > target {
            hi = max_below;
        } else {
            lo = min_above;
        }
    }

    let split = lo;
    let mut w0 = 0.0;
    for (i, (&x, &w)) in vals.iter().zip(vwgts).enumerate() {
        if x < split {
            sets[i] = 0;
            w0 += w;
        }
    }
    for (i, (&x, &w)) in vals.iter().zip(vwgts).enumerate() {
        if x > split {
            sets[i] = 1;
        } else if x == split {
            if w0 < target {
                sets[i] = 0;
                w0 += w;
            } else {
                sets[i] = 1;
            }
        }
    }
    log::trace!("median: split {split:.4e} after {steps} steps, set 0 weight {w0} of {target}");
    steps
}

/// Reflected binary code of `i`.
#[inline]
pub fn gray(i: usize) -> usize {
    i ^ (i >> 1)
}

/// Cut one vector into `goals.len()` contiguous slabs, lowest values first.
///
/// Slab `i` becomes set `gray(i)`, so neighbouring slabs differ in one bit
/// of the set number. `goals` is indexed by set.
pub fn rec_median_1(vals: &[f64], vwgts: &[f64], goals: &[f64], sets: &mut [usize]) {
    let k = goals.len();
    let mut remaining: Vec<usize> = (0..vals.len()).collect();
    let mut sub_vals = Vec::with_capacity(vals.len());
    let mut sub_wgts = Vec::with_capacity(vals.len());
    let mut sub_sets = Vec::with_capacity(vals.len());
    for slab in 0..k {
        let set = gray(slab);
        if slab + 1 == k {
            for &v in &remaining {
                sets[v] = set;
            }
            break;
        }
        let rest: f64 = (slab + 1..k).map(|s| goals[gray(s)]).sum();
        sub_vals.clear();
        sub_wgts.clear();
        sub_vals.extend(remaining.iter().map(|&v| vals[v]));
        sub_wgts.extend(remaining.iter().map(|&v| vwgts[v]));
        sub_sets.clear();
        sub_sets.resize(remaining.len(), 0);
        median(&sub_vals, &sub_wgts, [goals[set], rest], &mut sub_sets);
        let mut next = Vec::with_capacity(remaining.len());
        for (&v, &side) in remaining.iter().zip(&sub_sets) {
            if side == 0 {
                sets[v] = set;
            } else {
                next.push(v);
            }
        }
        remaining = next;
    }
}

/// Nested medians: vector `j` decides bit `j` of the set number, splitting
/// each group formed by the earlier vectors. `goals` has `2^vecs.len()`
/// entries.
pub fn rec_median_k(vecs: &[Vec<f64>], vwgts: &[f64], goals: &[f64], sets: &mut [usize]) {
    let all: Vec<usize> = (0..vwgts.len()).collect();
    sets.fill(0);
    split_group(vecs, vwgts, goals, &all, 0, 0, sets);
}

fn split_group(
    vecs: &[Vec<f64>],
    vwgts: &[f64],
    goals: &[f64],
    group: &[usize],
    dim: usize,
    prefix: usize,
    sets: &mut [usize],
) {
    if dim == vecs.len() {
        for &v in group {
            sets[v] = prefix;
        }
        return;
    }
    // Sets sharing `prefix` in bits below `dim`, split by bit `dim`.
    let mask = (1 << dim) - 1;
    let mut side_goals = [0.0; 2];
    for (s, &g) in goals.iter().enumerate() {
        if s & mask == prefix {
            side_goals[s >> dim & 1] += g;
        }
    }
    let vals: Vec<f64> = group.iter().map(|&v| vecs[dim][v]).collect();
    let wgts: Vec<f64> = group.iter().map(|&v| vwgts[v]).collect();
    let mut sides = vec![0; group.len()];
    median(&vals, &wgts, side_goals, &mut sides);
    for bit in 0..2 {
        let sub: Vec<usize> = group
            .iter()
            .zip(&sides)
            .filter(|&(_, &s)| s == bit)
            .map(|(&v, _)| v)
            .collect();
        split_group(vecs, vwgts, goals, &sub, dim + 1, prefix | bit << dim, sets);
    }
}

/// Threshold every vector at zero; bit `j` is set where vector `j` is
/// positive.
pub fn zero_cut(vecs: &[Vec<f64>], sets: &mut [usize]) {
    for (v, s) in sets.iter_mut().enumerate() {
        *s = vecs
            .iter()
            .enumerate()
            .fold(0, |acc, (j, x)| acc | usize::from(x[v] > 0.0) << j);
    }
}

/// An independent median of every vector; bit `j` comes from vector `j`.
pub fn independent_medians(vecs: &[Vec<f64>], vwgts: &[f64], goals: &[f64], sets: &mut [usize]) {
    sets.fill(0);
    let mut sides = vec![0; vwgts.len()];
    for (j, vals) in vecs.iter().enumerate() {
        let mut side_goals = [0.0; 2];
        for (s, &g) in goals.iter().enumerate() {
            side_goals[s >> j & 1] += g;
        }
        median(vals, vwgts, side_goals, &mut sides);
        for (s, &side) in sets.iter_mut().zip(&sides) {
            *s |= side << j;
        }
    }
}
