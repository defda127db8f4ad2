//! Partitions that ignore the edges.

use rand::Rng;
use rand::seq::SliceRandom;

/// Fill sets in order along `order`, moving to the next set once the
/// running weight passes the cumulative goal.
fn fill_in_order(order: &[usize], vwgts: &[f64], goals: &[f64], sets: &mut [usize]) {
    let total: f64 = vwgts.iter().sum();
    let gsum: f64 = goals.iter().sum();
    let mut cum = Vec::with_capacity(goals.len());
    let mut acc_goal = 0.0;
    for &g in goals {
        acc_goal += g;
        cum.push(total * acc_goal / gsum);
    }
    let last = goals.len() - 1;
    let mut s = 0;
    let mut acc = 0.0;
    for &v in order {
        let w = vwgts[v];
        while s < last && acc + 0.5 * w > cum[s] {
            s += 1;
        }
        sets[v] = s;
        acc += w;
    }
}

/// Contiguous blocks of vertex numbers.
pub fn linear(vwgts: &[f64], goals: &[f64], sets: &mut [usize]) {
    let order: Vec<usize> = (0..vwgts.len()).collect();
    fill_in_order(&order, vwgts, goals, sets);
}

/// Contiguous blocks of a random permutation.
pub fn random<R: Rng + ?Sized>(vwgts: &[f64], goals: &[f64], rng: &mut R, sets: &mut [usize]) {
    let mut order: Vec<usize> = (0..vwgts.len()).collect();
    order.shuffle(rng);
    fill_in_order(&order, vwgts, goals, sets);
}

/// Deal vertices round-robin to the sets with a positive goal.
pub fn scattered(goals: &[f64], sets: &mut [usize]) {
    let live: Vec<usize> = (0..goals.len()).filter(|&s| goals[s] > 0.0).collect();
    let live = if live.is_empty() { vec![0] } else { live };
    for (v, s) in sets.iter_mut().enumerate() {
        *s = live[v % live.len()];
    }
}
