//! Multi-way Kernighan–Lin refinement of a hop-weighted cut.
//!
//! The cost of an assignment is `Σ w(u,v) · hops(set u, set v)` over edges.
//! Moving `v` from `s` to `t` changes it by `-d`, where
//!
//! ```text
//! d(v, s→t) = Σ_{u ∈ N(v)} w(v,u) · (hops(s, set u) − hops(t, set u))
//! ```
//!
//! Each pass moves every vertex at most once, greedily taking the best
//! allowed move, then keeps only the prefix of moves with the best outcome.
//! Moves are ordered by integer d-values held in buckets, but the kept
//! prefix is chosen on the real gain of the original weights. A balanced
//! outcome always beats an unbalanced one; among balanced outcomes the
//! larger cumulative gain wins, among unbalanced ones the smaller
//! deviation. A pass started from a balanced assignment never increases
//! the cost; one that would is undone.

use super::buckets::Buckets;
use crate::config::KlConfig;
use crate::error::PartitionError;
use crate::graph::Graph;
use crate::metrics::{balance_deviation, is_balanced};
use crate::target::HopMatrix;
use crate::workspace::Workspace;
use rand::Rng;
use std::cmp::Ordering;

/// Largest d-value magnitude after scaling edge weights to integers.
const MAX_DVAL: i64 = 1 << 12;

/// Real gains closer than this, relative to the largest weighted degree,
/// count as equal.
const GAIN_TOL: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlStats {
    pub passes: usize,
    /// Moves kept across all passes.
    pub moves: usize,
    pub initial_cost: f64,
    pub final_cost: f64,
}

/// Hop-weighted cut of `assignment`.
pub fn hop_cost(graph: &Graph, assignment: &[usize], hops: &HopMatrix) -> f64 {
    let mut cost = 0.0;
    for (v, vtx) in graph.vertices().iter().enumerate() {
        for (u, w) in vtx.weighted_neighbors() {
            if v < u {
                cost += w * hops.hop(assignment[v], assignment[u]) as f64;
            }
        }
    }
    cost
}

/// Outcome of a prefix of moves, ordered so that larger is better.
#[derive(Debug, Clone, Copy)]
struct Score {
    balanced: bool,
    gain: f64,
    deviation: f64,
}

impl Score {
    fn better_than(&self, other: &Score, tol: f64) -> bool {
        match (self.balanced, other.balanced) {
            (true, false) => true,
            (false, true) => false,
            (true, true) => self.gain > other.gain + tol,
            (false, false) => {
                self.deviation.total_cmp(&other.deviation) == Ordering::Less
            }
        }
    }
}

/// Per-run state shared by all passes.
struct Kl<'a> {
    graph: &'a Graph,
    hops: &'a HopMatrix,
    goals: &'a [f64],
    nsets: usize,
    /// Integer edge weights, row-parallel to `graph` (slot 0 unused).
    iwgts: Vec<Vec<i64>>,
    max_gain: i64,
    max_vwgt: f64,
    /// Smallest real gain difference that counts.
    tol: f64,
}

impl<'a> Kl<'a> {
    fn new(
        graph: &'a Graph,
        hops: &'a HopMatrix,
        goals: &'a [f64],
        ws: &Workspace,
    ) -> Result<Self, PartitionError> {
        let nsets = hops.len();
        let max_hop = (0..nsets)
            .flat_map(|a| (0..nsets).map(move |b| (a, b)))
            .map(|(a, b)| hops.hop(a, b) as f64)
            .fold(0.0, f64::max);
        let bound = graph
            .vertices()
            .iter()
            .map(|vtx| vtx.weighted_neighbors().map(|(_, w)| w).sum::<f64>())
            .fold(0.0, f64::max)
            * max_hop;
        let scale = if bound > 0.0 && (!graph.integral_ewgts() || bound > MAX_DVAL as f64) {
            MAX_DVAL as f64 / bound
        } else {
            1.0
        };
        let mut iwgts = ws.alloc_empty(graph.len())?;
        for vtx in graph.vertices() {
            let mut row = Vec::with_capacity(vtx.edges.len());
            row.push(0);
            row.extend(
                vtx.weighted_neighbors()
                    .map(|(_, w)| ((w * scale).round() as i64).max(1)),
            );
            iwgts.push(row);
        }
        let max_gain = iwgts
            .iter()
            .map(|row| row.iter().sum::<i64>())
            .max()
            .unwrap_or(0)
            * max_hop as i64;
        Ok(Self {
            graph,
            hops,
            goals,
            nsets,
            iwgts,
            max_gain: max_gain.max(1),
            max_vwgt: graph.max_vwgt() as f64,
            tol: GAIN_TOL * bound,
        })
    }

    fn dval(&self, v: usize, from: usize, to: usize, assignment: &[usize]) -> i64 {
        let vtx = self.graph.vertex(v);
        let mut d = 0i64;
        for k in 1..vtx.edges.len() {
            let su = assignment[vtx.edges[k]];
            let delta = self.hops.hop(from, su) - self.hops.hop(to, su);
            d += self.iwgts[v][k] * delta as i64;
        }
        d
    }

    /// `dval` on the unscaled edge weights.
    fn real_dval(&self, v: usize, from: usize, to: usize, assignment: &[usize]) -> f64 {
        self.graph
            .vertex(v)
            .weighted_neighbors()
            .map(|(u, w)| {
                let su = assignment[u];
                w * (self.hops.hop(from, su) - self.hops.hop(to, su)) as f64
            })
            .sum()
    }

    fn bucket_vertex(&self, b: &mut Buckets, v: usize, assignment: &[usize]) {
        let s = assignment[v];
        for t in (0..self.nsets).filter(|&t| t != s) {
            b.insert(v, s, t, self.dval(v, s, t, assignment));
        }
    }

    fn unbucket_vertex(&self, b: &mut Buckets, v: usize, from: usize) {
        for t in (0..self.nsets).filter(|&t| t != from) {
            b.remove(v, from, t);
        }
    }

    fn score(&self, weights: &[f64], gain: f64) -> Score {
        Score {
            balanced: is_balanced(weights, self.goals, self.max_vwgt),
            gain,
            deviation: balance_deviation(weights, self.goals),
        }
    }

    /// Pick the next move `(v, from, to, gain)`.
    fn select<R: Rng + ?Sized>(
        &self,
        b: &mut Buckets,
        weights: &[f64],
        random_ties: bool,
        rng: &mut R,
    ) -> Option<(usize, usize, usize, i64)> {
        let balanced = is_balanced(weights, self.goals, self.max_vwgt);
        let dev = balance_deviation(weights, self.goals);
        let mut best: Option<(usize, usize, usize, i64, f64, f64)> = None;
        let mut scratch = weights.to_vec();
        for strict in [true, false] {
            for s in 0..self.nsets {
                for t in (0..self.nsets).filter(|&t| t != s) {
                    let Some((v, gain)) = b.best(s, t) else {
                        continue;
                    };
                    let w = self.graph.vertex(v).vwgt as f64;
                    let allowed = self.goals[t] > 0.0
                        && if balanced {
                            weights[t] + w <= self.goals[t] + self.max_vwgt
                                && weights[s] - w >= self.goals[s] - self.max_vwgt
                        } else {
                            !strict || (weights[s] > self.goals[s] && weights[t] < self.goals[t])
                        };
                    if !allowed {
                        continue;
                    }
                    scratch[s] -= w;
                    scratch[t] += w;
                    let reduction = dev - balance_deviation(&scratch, self.goals);
                    scratch[s] = weights[s];
                    scratch[t] = weights[t];
                    let slack = (self.goals[t] - weights[t]) + (weights[s] - self.goals[s]);
                    let take = match best {
                        None => true,
                        Some((_, _, _, bg, br, bs)) => {
                            gain > bg
                                || (gain == bg
                                    && (reduction > br
                                        || (reduction == br
                                            && (slack > bs
                                                || (slack == bs
                                                    && random_ties
                                                    && rng.gen_bool(0.5))))))
                        }
                    };
                    if take {
                        best = Some((v, s, t, gain, reduction, slack));
                    }
                }
            }
            // Over-goal to under-goal moves were exhausted; relax.
            if best.is_some() || balanced {
                break;
            }
        }
        best.map(|(v, s, t, g, _, _)| (v, s, t, g))
    }

    /// One pass; returns the number of moves kept.
    fn pass<R: Rng + ?Sized>(
        &self,
        assignment: &mut [usize],
        weights: &mut [f64],
        cfg: &KlConfig,
        rng: &mut R,
        ws: &Workspace,
    ) -> Result<usize, PartitionError> {
        let _frame = ws.frame();
        let n = self.graph.len();
        let mut buckets = Buckets::new(n, self.nsets, self.max_gain, ws)?;
        for v in 0..n {
            self.bucket_vertex(&mut buckets, v, assignment);
        }
        let mut locked: Vec<bool> = ws.alloc(n, false)?;
        let mut moves: Vec<(usize, usize)> = ws.alloc_empty(n)?;

        let mut best = self.score(weights, 0.0);
        let mut best_len = 0;
        let mut cum = 0.0;
        let mut best_gain = 0.0;
        let mut bad = 0;
        let min_edge = self
            .graph
            .vertices()
            .iter()
            .flat_map(|vtx| vtx.weighted_neighbors().map(|(_, w)| w))
            .fold(f64::INFINITY, f64::min);
        let cutoff = cfg
            .loss_cutoff
            .map(|f| f * hop_cost(self.graph, assignment, self.hops).max(min_edge));

        while let Some((v, from, to, key)) = self.select(&mut buckets, weights, cfg.random_ties, rng) {
            let gain = self.real_dval(v, from, to, assignment);
            self.unbucket_vertex(&mut buckets, v, from);
            locked[v] = true;
            assignment[v] = to;
            let w = self.graph.vertex(v).vwgt as f64;
            weights[from] -= w;
            weights[to] += w;
            cum += gain;
            moves.push((v, from));
            log::trace!("KL move {v}: {from} -> {to}, key {key}, gain {gain:.3e}, total {cum:.3e}");

            for &u in self.graph.neighbors(v) {
                if locked[u] {
                    continue;
                }
                let su = assignment[u];
                self.unbucket_vertex(&mut buckets, u, su);
                self.bucket_vertex(&mut buckets, u, assignment);
            }

            let score = self.score(weights, cum);
            if score.better_than(&best, self.tol) {
                best = score;
                best_len = moves.len();
                best_gain = cum;
                bad = 0;
            } else {
                bad += 1;
            }
            if bad >= cfg.bad_moves {
                break;
            }
            if let Some(limit) = cutoff {
                if best.balanced && best_gain - cum > limit {
                    break;
                }
            }
        }

        for &(v, from) in moves[best_len..].iter().rev() {
            let w = self.graph.vertex(v).vwgt as f64;
            weights[assignment[v]] -= w;
            weights[from] += w;
            assignment[v] = from;
        }
        Ok(best_len)
    }
}

/// Refine `assignment` in place by KL passes against `hops` and `goals`.
///
/// `goals` and `hops` describe the sets of this step only; every entry of
/// `assignment` must be below `hops.len()`.
pub fn kl_refine<R: Rng + ?Sized>(
    graph: &Graph,
    assignment: &mut [usize],
    hops: &HopMatrix,
    goals: &[f64],
    cfg: &KlConfig,
    rng: &mut R,
    ws: &Workspace,
) -> Result<KlStats, PartitionError> {
    let initial_cost = hop_cost(graph, assignment, hops);
    let mut stats = KlStats {
        passes: 0,
        moves: 0,
        initial_cost,
        final_cost: initial_cost,
    };
    if graph.len() < 2 || hops.len() < 2 {
        return Ok(stats);
    }
    let _frame = ws.frame();
    let kl = Kl::new(graph, hops, goals, ws)?;
    let mut weights: Vec<f64> = ws.alloc(hops.len(), 0.0)?;
    for (v, &s) in assignment.iter().enumerate() {
        weights[s] += graph.vertex(v).vwgt as f64;
    }

    let mut bad_passes = 0;
    while stats.passes < cfg.max_passes {
        let _pass = ws.frame();
        let before = hop_cost(graph, assignment, hops);
        let was_balanced = is_balanced(&weights, goals, kl.max_vwgt);
        let saved = ws.alloc_copy(assignment)?;
        let saved_weights = ws.alloc_copy(&weights)?;
        let mut kept = kl.pass(assignment, &mut weights, cfg, rng, ws)?;
        stats.passes += 1;
        let mut after = hop_cost(graph, assignment, hops);
        if was_balanced && after > before {
            log::debug!(
                "KL pass {}: cost rose {before:.3e} -> {after:.3e}, undone",
                stats.passes
            );
            assignment.copy_from_slice(&saved);
            weights.copy_from_slice(&saved_weights);
            after = before;
            kept = 0;
        }
        stats.moves += kept;
        let balanced = is_balanced(&weights, goals, kl.max_vwgt);
        log::debug!(
            "KL pass {}: kept {kept} moves, cost {before:.3} -> {after:.3}, balanced {balanced}",
            stats.passes
        );
        if kept > 0 {
            bad_passes = 0;
            continue;
        }
        bad_passes += 1;
        if !balanced || bad_passes >= cfg.ntries_bad {
            break;
        }
    }
    stats.final_cost = hop_cost(graph, assignment, hops);
    Ok(stats)
}
