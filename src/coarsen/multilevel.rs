//! Multilevel drivers built on the coarsening hierarchy.
//!
//! Both drivers coarsen until the graph has at most `vmax` vertices (or a
//! step stops paying off), solve on the coarsest graph, then walk back up:
//! [`multilevel_eigensolve`] interpolates eigenvectors and sharpens them with
//! RQI at every level; [`multilevel_kl`] projects a partition and refines it
//! with Kernighan–Lin at every level.

use super::{CoarseLevel, coarsen_step, spring};
use crate::config::{COARSEN_RATIO_MIN, CoarsenConfig, PartitionerConfig};
use crate::diagnostics::Warning;
use crate::eigen::operator::{Laplacian, LinearOperator};
use crate::eigen::rqi::rqi;
use crate::eigen::{EigenPair, EigenSolution, dot, eigensolve, normalize, residual_target};
use crate::error::PartitionError;
use crate::graph::Graph;
use crate::refine::kl::kl_refine;
use crate::target::HopMatrix;
use crate::workspace::Workspace;
use rand::Rng;

/// Contractions from finest (`levels[0]`) to coarsest.
#[derive(Debug, Default)]
pub struct Hierarchy {
    pub levels: Vec<CoarseLevel>,
    /// Coarsening stopped because a step removed too few vertices.
    pub gave_up: bool,
}

impl Hierarchy {
    /// Graph that `levels[i]` was built from.
    pub fn fine_of<'a>(&'a self, i: usize, top: &'a Graph) -> &'a Graph {
        if i == 0 { top } else { &self.levels[i - 1].graph }
    }

    pub fn coarsest<'a>(&'a self, top: &'a Graph) -> &'a Graph {
        self.levels.last().map_or(top, |l| &l.graph)
    }
}

/// Coarsen until at most `vmax` vertices remain.
///
/// A step that keeps at least [`COARSEN_RATIO_MIN`] of its vertices ends
/// coarsening with a [`Warning::CoarsenGaveUp`].
pub fn build_hierarchy<R: Rng + ?Sized>(
    graph: &Graph,
    vmax: usize,
    cfg: &CoarsenConfig,
    rng: &mut R,
    warnings: &mut Vec<Warning>,
    ws: &Workspace,
) -> Result<Hierarchy, PartitionError> {
    let mut h = Hierarchy::default();
    loop {
        let current = h.coarsest(graph);
        let n = current.len();
        if n <= vmax {
            break;
        }
        let level = coarsen_step(current, cfg, rng, ws)?;
        let nc = level.graph.len();
        let stalled = nc as f64 >= COARSEN_RATIO_MIN * n as f64;
        h.levels.push(level);
        if stalled {
            warnings.push(Warning::CoarsenGaveUp {
                level: h.levels.len(),
                from: n,
                to: nc,
            });
            h.gave_up = true;
            break;
        }
    }
    Ok(h)
}

/// Eigenpairs by coarsening, Lanczos on the coarsest graph, and RQI
/// refinement of interpolated vectors on every finer level.
pub fn multilevel_eigensolve<R: Rng + ?Sized>(
    graph: &Graph,
    nev: usize,
    cfg: &PartitionerConfig,
    rng: &mut R,
    ws: &Workspace,
) -> Result<EigenSolution, PartitionError> {
    let mut warnings = Vec::new();
    let vmax = cfg.coarsen.vmax.max(nev + 1);
    let h = build_hierarchy(graph, vmax, &cfg.coarsen, rng, &mut warnings, ws)?;
    let coarsest = h.coarsest(graph);
    if coarsest.len() < nev + 1 {
        return Err(PartitionError::ProblemTooSmall {
            vertices: coarsest.len(),
            eigenpairs: nev,
        });
    }
    let mut sol = eigensolve(coarsest, nev, &cfg.eigen, rng, ws)?;
    warnings.append(&mut sol.warnings);
    if h.levels.is_empty() {
        sol.warnings = warnings;
        return Ok(sol);
    }

    let mut iterations = sol.iterations;
    let mut vectors: Vec<Vec<f64>> = sol.pairs.into_iter().map(|p| p.vector).collect();
    let mut values = Vec::new();
    let mut residuals = Vec::new();
    for i in (0..h.levels.len()).rev() {
        let fine = h.fine_of(i, graph);
        let op = Laplacian::new(fine, ws)?;
        let mut refined: Vec<Vec<f64>> = Vec::with_capacity(vectors.len());
        values.clear();
        residuals.clear();
        for x in &vectors {
            let x = spring::interpolate(&h.levels[i], fine, x, ws)?;
            let mut y = op.from_graph_space(&x, ws)?;
            op.deflate(&mut y);
            normalize(&mut y);
            let mut ay = vec![0.0; y.len()];
            op.apply(&y, &mut ay);
            let rho = dot(&y, &ay);
            let tol = residual_target(cfg.eigen.eigtol, rho, op.norm_bound());
            let res = rqi(&op, &mut y, &refined, tol, &cfg.eigen, &mut warnings, ws)?;
            iterations += res.steps;
            values.push(res.value);
            residuals.push(res.residual);
            refined.push(y);
        }
        log::debug!(
            "multilevel level {i}: {} vertices, eigenvalues {values:?}",
            fine.len()
        );
        vectors = refined
            .iter()
            .map(|y| op.to_graph_space(y, ws))
            .collect::<Result<_, _>>()?;
    }

    for (index, &residual) in residuals.iter().enumerate() {
        if residual > cfg.eigen.eigtol {
            warnings.push(Warning::EigenResidual {
                index,
                residual,
                tolerance: cfg.eigen.eigtol,
            });
        }
    }
    let mut pairs: Vec<EigenPair> = vectors
        .into_iter()
        .zip(values)
        .zip(residuals)
        .map(|((vector, value), residual)| EigenPair {
            value,
            vector,
            residual,
        })
        .collect();
    pairs.sort_by(|a, b| a.value.total_cmp(&b.value));
    Ok(EigenSolution {
        pairs,
        iterations,
        warnings,
    })
}

/// Partition by coarsening, dividing the coarsest graph with `divide`, and
/// refining with KL at every level on the way back.
#[allow(clippy::too_many_arguments)]
pub fn multilevel_kl<R, F>(
    graph: &Graph,
    hops: &HopMatrix,
    goals: &[f64],
    cfg: &PartitionerConfig,
    rng: &mut R,
    warnings: &mut Vec<Warning>,
    ws: &Workspace,
    divide: F,
) -> Result<Vec<usize>, PartitionError>
where
    R: Rng + ?Sized,
    F: FnOnce(&Graph, &mut R, &mut Vec<Warning>) -> Result<Vec<usize>, PartitionError>,
{
    let h = build_hierarchy(graph, cfg.coarsen.vmax, &cfg.coarsen, rng, warnings, ws)?;
    let coarsest = h.coarsest(graph);
    let mut assignment = divide(coarsest, rng, warnings)?;
    kl_refine(coarsest, &mut assignment, hops, goals, &cfg.kl, rng, ws)?;
    for i in (0..h.levels.len()).rev() {
        let fine = h.fine_of(i, graph);
        assignment = h.levels[i].project_assignment(&assignment);
        let stats = kl_refine(fine, &mut assignment, hops, goals, &cfg.kl, rng, ws)?;
        log::debug!(
            "multilevel KL level {i}: {} vertices, cut {:.3} -> {:.3}",
            fine.len(),
            stats.initial_cost,
            stats.final_cost
        );
    }
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EigenConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn path(n: usize) -> Graph {
        let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1)).collect();
        Graph::from_edges(n, &edges)
    }

    #[test]
    fn hierarchy_reaches_vmax() {
        let ws = Workspace::unlimited();
        let g = path(200);
        let mut rng = SmallRng::seed_from_u64(4);
        let mut warnings = Vec::new();
        let h = build_hierarchy(&g, 20, &CoarsenConfig::default(), &mut rng, &mut warnings, &ws)
            .unwrap();
        assert!(!h.levels.is_empty());
        assert!(h.gave_up || h.coarsest(&g).len() <= 20);
        for (i, level) in h.levels.iter().enumerate() {
            assert_eq!(level.nfine(), h.fine_of(i, &g).len());
        }
    }

    #[test]
    fn star_graph_gives_up() {
        // A star matches only one leaf per step.
        let ws = Workspace::unlimited();
        let edges: Vec<_> = (1..40).map(|i| (0, i)).collect();
        let g = Graph::from_edges(40, &edges);
        let mut rng = SmallRng::seed_from_u64(4);
        let mut warnings = Vec::new();
        let h = build_hierarchy(&g, 5, &CoarsenConfig::default(), &mut rng, &mut warnings, &ws)
            .unwrap();
        assert!(h.gave_up);
        assert!(matches!(warnings[0], Warning::CoarsenGaveUp { .. }));
    }

    #[test]
    fn multilevel_fiedler_value_matches_direct() {
        let ws = Workspace::unlimited();
        let g = path(120);
        let cfg = PartitionerConfig {
            eigen: EigenConfig {
                eigtol: 1e-6,
                ..Default::default()
            },
            coarsen: CoarsenConfig {
                vmax: 30,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(8);
        let sol = multilevel_eigensolve(&g, 1, &cfg, &mut rng, &ws).unwrap();
        let exact = 2.0 - 2.0 * (std::f64::consts::PI / 120.0).cos();
        assert!(
            (sol.pairs[0].value - exact).abs() < 1e-6,
            "{} vs {exact}",
            sol.pairs[0].value
        );
    }
}
