//! Recursive partitioning driver.
//!
//! Starting from the whole graph and the root block of the target, each
//! step divides the current (sub)graph into the `2^d` children of its
//! block, optionally refines the division with KL, then recurses into the
//! vertex-induced subgraph of every child. Leaves write their final set
//! number into the global assignment.

use crate::assign::{self, inertial, simple};
use crate::coarsen::multilevel::{multilevel_eigensolve, multilevel_kl};
use crate::config::{Eigensolver, GlobalMethod, LocalMethod, PartitionerConfig};
use crate::diagnostics::{Diagnostics, Timings, Warning};
use crate::eigen::eigensolve;
use crate::error::{PartitionError, Violation};
use crate::graph::Graph;
use crate::graph::check::check_graph;
use crate::graph::connect::{is_connected, make_connected, make_unconnected};
use crate::metrics::{PartitionMetrics, evaluate};
use crate::refine::kl_refine;
use crate::target::{Block, Split, Target, merge_goals};
use crate::workspace::Workspace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Result of [`partition`].
#[derive(Debug, Clone)]
pub struct Partition {
    /// Final set of every vertex, in `0..nsets`.
    pub assignment: Vec<usize>,
    pub nsets: usize,
    pub metrics: PartitionMetrics,
    pub diagnostics: Diagnostics,
}

/// Check every input rule and report all violations at once.
///
/// `goals` must have one finite, non-negative entry per final set with a
/// positive sum. `coords` (one slice per geometric dimension) is required
/// by [`GlobalMethod::Inertial`].
pub fn validate(
    graph: &Graph,
    target: &Target,
    goals: Option<&[f64]>,
    coords: Option<&[&[f64]]>,
    config: &PartitionerConfig,
) -> Result<(), PartitionError> {
    let mut out = config.violations();
    out.0.extend(target.violations(config.dims_per_step).0);

    if let Some(goals) = goals {
        let nsets = target.nsets();
        if goals.len() != nsets {
            out.push(Violation::GoalLength {
                expected: nsets,
                got: goals.len(),
            });
        }
        for (set, &value) in goals.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                out.push(Violation::GoalValue { set, value });
            }
        }
        if goals.iter().sum::<f64>() <= 0.0 {
            out.push(Violation::GoalSum);
        }
    }

    if config.global_method == GlobalMethod::Inertial {
        match coords {
            None => out.push(Violation::MissingCoordinates),
            Some(c) if c.is_empty() || c.len() > 3 => {
                out.push(Violation::CoordinateDims { got: c.len() })
            }
            Some(c) => {
                for (axis, values) in c.iter().enumerate() {
                    if values.len() != graph.len() {
                        out.push(Violation::CoordinateLength {
                            axis,
                            expected: graph.len(),
                            got: values.len(),
                        });
                    }
                }
            }
        }
    }

    for v in check_graph(graph) {
        out.push(v);
    }
    if !out.is_empty() {
        log::debug!("validation found {} violations", out.len());
    }
    out.into_result()
}

/// Partition `graph` into the sets of `target`.
///
/// `goals` gives the desired weight of every final set (equal shares when
/// `None`). Inputs are validated first; nothing is computed unless every
/// rule holds.
///
/// # Errors
/// [`PartitionError::InvalidInput`] listing every violated rule, or
/// [`PartitionError::OutOfMemory`] when the configured memory limit is hit.
pub fn partition(
    graph: &Graph,
    target: &Target,
    goals: Option<&[f64]>,
    coords: Option<&[&[f64]]>,
    config: &PartitionerConfig,
) -> Result<Partition, PartitionError> {
    validate(graph, target, goals, coords, config)?;
    let start = Instant::now();
    let nsets = target.nsets();
    let ws = Workspace::new(config.memory_limit);
    let goals = match goals {
        Some(g) => ws.alloc_copy(g)?,
        None => ws.alloc(nsets, graph.total_vwgt() as f64 / nsets as f64)?,
    };
    let mut assignment: Vec<usize> = ws.alloc(graph.len(), 0)?;
    let glob: Vec<usize> = {
        let mut g = ws.alloc_empty(graph.len())?;
        g.extend(0..graph.len());
        g
    };
    log::info!(
        "partitioning {} vertices / {} edges into {nsets} sets ({:?}, {:?})",
        graph.len(),
        graph.nedges(),
        config.global_method,
        config.local_method
    );

    let mut run = Run {
        cfg: config,
        target,
        goals: &goals,
        coords,
        ws: &ws,
        rng: SmallRng::seed_from_u64(config.rng_seed),
        diag: Diagnostics::default(),
    };
    run.recurse(graph, &glob, target.root(), &mut assignment)?;

    let mut diag = run.diag;
    let metrics = evaluate(graph, &assignment, &target.hop_matrix(&ws)?);
    diag.timings.total = start.elapsed();
    diag.peak_bytes = ws.peak();
    crate::debug_invariants!(
        crate::debug_invariants::DebugInvariants::validate_invariants(&ws),
        "workspace"
    );
    log::info!(
        "partition done: cut {} edges (weight {:.3}, hops {:.3}), imbalance {:.4}, {} warnings",
        metrics.cut_edges,
        metrics.cut_weight,
        metrics.hop_cut,
        metrics.imbalance,
        diag.warnings.len()
    );
    Ok(Partition {
        assignment,
        nsets,
        metrics,
        diagnostics: diag,
    })
}

struct Run<'a> {
    cfg: &'a PartitionerConfig,
    target: &'a Target,
    /// Goals of the final sets.
    goals: &'a [f64],
    coords: Option<&'a [&'a [f64]]>,
    ws: &'a Workspace,
    rng: SmallRng,
    diag: Diagnostics,
}

impl Run<'_> {
    /// Partition `graph`, whose vertex `l` is global vertex `glob[l]`, into
    /// the final sets of `block`.
    fn recurse(
        &mut self,
        graph: &Graph,
        glob: &[usize],
        block: Block,
        assignment: &mut [usize],
    ) -> Result<(), PartitionError> {
        let Some(split) = self.target.split(&block, self.cfg.dims_per_step) else {
            let set = self.target.leaf_set(&block).unwrap_or_default();
            for &g in glob {
                assignment[g] = set;
            }
            return Ok(());
        };
        if graph.is_empty() {
            return Ok(());
        }
        let ws = self.ws;
        let _frame = ws.frame();
        self.diag.levels += 1;
        let goals = scaled_goals(graph, &merge_goals(self.target, &split.children, self.goals));
        log::debug!(
            "step {}: {} vertices into {} children, goals {goals:?}",
            self.diag.levels,
            graph.len(),
            split.children.len()
        );

        let mut local = self.divide(graph, glob, &split, &goals)?;

        if self.cfg.local_method == LocalMethod::Kl
            && self.cfg.global_method != GlobalMethod::MultilevelKl
        {
            let t = Instant::now();
            let stats = kl_refine(
                graph,
                &mut local,
                &split.hops,
                &goals,
                &self.cfg.kl,
                &mut self.rng,
                ws,
            )?;
            self.diag.timings.kl += t.elapsed();
            log::debug!(
                "KL: {} passes, {} moves, cost {:.3} -> {:.3}",
                stats.passes,
                stats.moves,
                stats.initial_cost,
                stats.final_cost
            );
        }

        for (c, child) in split.children.iter().enumerate() {
            let keep: Vec<usize> = (0..graph.len()).filter(|&v| local[v] == c).collect();
            if keep.is_empty() {
                continue;
            }
            let (sub, _) = graph.subgraph(&keep, ws)?;
            let sub_glob: Vec<usize> = keep.iter().map(|&l| glob[l]).collect();
            self.recurse(&sub, &sub_glob, *child, assignment)?;
        }
        Ok(())
    }

    /// Child index of every vertex of `graph`.
    fn divide(
        &mut self,
        graph: &Graph,
        glob: &[usize],
        split: &Split,
        goals: &[f64],
    ) -> Result<Vec<usize>, PartitionError> {
        let ws = self.ws;
        let cfg = self.cfg;
        let mut warnings = Vec::new();
        let vwgts = graph.vwgts_f64(ws)?;
        let sets = match cfg.global_method {
            GlobalMethod::Spectral => spectral_divide(
                graph,
                split.ndims,
                goals,
                cfg,
                &mut self.rng,
                &mut warnings,
                &mut self.diag.timings,
                ws,
            )?,
            GlobalMethod::MultilevelKl => {
                let t = Instant::now();
                let mut inner = Timings::default();
                let sets = multilevel_kl(
                    graph,
                    &split.hops,
                    goals,
                    cfg,
                    &mut self.rng,
                    &mut warnings,
                    ws,
                    |coarse, rng, warnings| {
                        let coarse_goals = scaled_goals(coarse, goals);
                        spectral_divide(
                            coarse,
                            split.ndims,
                            &coarse_goals,
                            cfg,
                            rng,
                            warnings,
                            &mut inner,
                            ws,
                        )
                    },
                )?;
                let timings = &mut self.diag.timings;
                timings.eigen += inner.eigen;
                timings.assign += inner.assign;
                timings.coarsen += t.elapsed().saturating_sub(inner.eigen + inner.assign);
                sets
            }
            GlobalMethod::Inertial => {
                let t = Instant::now();
                let coords = self.coords.unwrap_or_default();
                let local: Vec<Vec<f64>> = coords
                    .iter()
                    .map(|axis| glob.iter().map(|&g| axis[g]).collect())
                    .collect();
                let views: Vec<&[f64]> = local.iter().map(Vec::as_slice).collect();
                let axes = inertial::inertial_vectors(&views, &vwgts, 1);
                let sets = assign::map_slabs(&axes[0], &vwgts, goals);
                self.diag.timings.assign += t.elapsed();
                sets
            }
            GlobalMethod::Linear => {
                let mut sets = vec![0; graph.len()];
                simple::linear(&vwgts, goals, &mut sets);
                sets
            }
            GlobalMethod::Random => {
                let mut sets = vec![0; graph.len()];
                simple::random(&vwgts, goals, &mut self.rng, &mut sets);
                sets
            }
            GlobalMethod::Scattered => {
                let mut sets = vec![0; graph.len()];
                simple::scattered(goals, &mut sets);
                sets
            }
        };
        self.diag.extend(warnings);
        Ok(sets)
    }
}

/// Goals rescaled to the weight actually present in `graph`.
fn scaled_goals(graph: &Graph, goals: &[f64]) -> Vec<f64> {
    let sum: f64 = goals.iter().sum();
    let total = graph.total_vwgt() as f64;
    if sum > 0.0 {
        goals.iter().map(|g| g * total / sum).collect()
    } else {
        vec![total / goals.len() as f64; goals.len()]
    }
}

/// Eigenvectors of `graph` mapped to `2^ndims` children.
///
/// Disconnected graphs are joined by phantom edges on a working copy when
/// configured; the copy is restored before returning. Graphs too small for
/// `ndims` eigenpairs are split linearly.
#[allow(clippy::too_many_arguments)]
fn spectral_divide<R: Rng + ?Sized>(
    graph: &Graph,
    ndims: usize,
    goals: &[f64],
    cfg: &PartitionerConfig,
    rng: &mut R,
    warnings: &mut Vec<Warning>,
    timings: &mut Timings,
    ws: &Workspace,
) -> Result<Vec<usize>, PartitionError> {
    let vwgts = graph.vwgts_f64(ws)?;
    if graph.len() < ndims + 1 {
        warnings.push(Warning::LinearFallback {
            vertices: graph.len(),
            eigenpairs: ndims,
        });
        let mut sets = vec![0; graph.len()];
        simple::linear(&vwgts, goals, &mut sets);
        return Ok(sets);
    }

    let t = Instant::now();
    let sol = {
        let _frame = ws.frame();
        let mut joined = None;
        if cfg.make_connected && !is_connected(graph) {
            let mut copy = graph.clone_in(ws)?;
            let undo = make_connected(&mut copy, ws)?;
            joined = Some((copy, undo));
        }
        let work = joined.as_ref().map_or(graph, |(g, _)| g);
        let sol = match cfg.eigen.solver {
            Eigensolver::Lanczos => eigensolve(work, ndims, &cfg.eigen, rng, ws),
            Eigensolver::MultilevelRqi => multilevel_eigensolve(work, ndims, cfg, rng, ws),
        };
        if let Some((mut copy, undo)) = joined {
            make_unconnected(&mut copy, undo);
            debug_assert!(copy == *graph, "phantom edges left behind");
        }
        sol?
    };
    timings.eigen += t.elapsed();
    for p in &sol.pairs {
        log::debug!("spectral: λ = {:.6e} (residual {:.3e})", p.value, p.residual);
    }
    warnings.extend(sol.warnings);

    let t = Instant::now();
    let vecs: Vec<Vec<f64>> = sol.pairs.into_iter().map(|p| p.vector).collect();
    let sets = assign::map_vectors(vecs, &vwgts, goals, &cfg.mapper, warnings);
    timings.assign += t.elapsed();
    Ok(sets)
}
