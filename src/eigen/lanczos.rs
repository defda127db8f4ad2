//! Lanczos iteration with full or selective orthogonalization.
//!
//! One recurrence serves every variant; they differ in what each new
//! residual is orthogonalized against and in which end of the spectrum is
//! monitored:
//!
//! | variant | operator | orthogonalize against | checked |
//! |---|---|---|---|
//! | `FullOrtho` | `A` | every Lanczos vector | every step |
//! | `FullOrthoInverse` | `A⁻¹` via SYMMLQ | every Lanczos vector | every step |
//! | `SelectiveBothEnds` | `A` | good Ritz vectors, both ends | adaptive pause |
//! | `SelectiveLeftEnd` | `A` | good Ritz vectors, left end | adaptive pause |
//! | `SelectiveLeftEndFixedPause` | `A` | good Ritz vectors, left end | fixed pause |
//!
//! A Ritz pair is converged when Paige's bound `|β_{j+1} s_j|` falls below
//! [`residual_target`]. Selective variants collect Ritz vectors whose bound
//! is below `sqrt(ε)·‖T‖` as "good" and keep later residuals orthogonal to
//! them.

use super::operator::{Laplacian, LinearOperator, Projected};
use super::symmlq::symmlq;
use super::tridiag::{ritz_values, tevec};
use super::{
    EigenPair, EigenSolution, ORTHO_LOSS_MINOR, ORTHO_LOSS_SUBSTANTIAL, axpy, checkeig, dot,
    normalize, orthogonalize, random_vector, residual_target,
};
use crate::config::{EigenConfig, LanczosVariant};
use crate::diagnostics::Warning;
use crate::error::PartitionError;
use crate::workspace::Workspace;
use rand::Rng;

/// Restart attempts after a lucky breakdown before the space is declared
/// exhausted.
const RESTART_TRIES: usize = 3;
/// Extra Ritz values examined beyond the requested ones when looking for
/// good Ritz vectors.
const GOOD_EXTRA: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
enum Ortho {
    Full,
    Selective { both_ends: bool, adaptive: bool },
}

struct Ritz {
    value: f64,
    vector: Vec<f64>,
    bound: f64,
}

struct Outcome {
    ritz: Vec<Ritz>,
    steps: usize,
    converged: bool,
    /// Largest Ritz value magnitude seen, an estimate of `‖op‖`.
    anorm: f64,
}

struct Recurrence<'a> {
    n: usize,
    null: &'a [f64],
    end: End,
    nev: usize,
    ortho: Ortho,
    eigtol: f64,
    max_steps: usize,
    pause: usize,
    norm_hint: f64,
}

/// The `nev` smallest nontrivial eigenpairs of `op`, in operator space.
pub fn lanczos<R: Rng + ?Sized>(
    op: &Laplacian<'_>,
    nev: usize,
    cfg: &EigenConfig,
    rng: &mut R,
    ws: &Workspace,
) -> Result<EigenSolution, PartitionError> {
    let variant = if op.dim() <= cfg.full_ortho_cutoff {
        LanczosVariant::FullOrtho
    } else {
        cfg.variant
    };
    let (mut sol, substantial) = solve_variant(op, nev, variant, cfg, rng, ws)?;
    if substantial && variant.is_selective() && cfg.fallback_on_orthogonality_loss {
        log::debug!("lanczos: re-solving with full orthogonalization after orthogonality loss");
        let (retry, _) = solve_variant(op, nev, LanczosVariant::FullOrtho, cfg, rng, ws)?;
        let mut warnings = std::mem::take(&mut sol.warnings);
        warnings.extend(retry.warnings);
        sol = EigenSolution {
            pairs: retry.pairs,
            iterations: sol.iterations + retry.iterations,
            warnings,
        };
    }
    Ok(sol)
}

fn solve_variant<R: Rng + ?Sized>(
    op: &Laplacian<'_>,
    nev: usize,
    variant: LanczosVariant,
    cfg: &EigenConfig,
    rng: &mut R,
    ws: &Workspace,
) -> Result<(EigenSolution, bool), PartitionError> {
    let n = op.dim();
    let max_steps = cfg
        .max_iterations
        .unwrap_or(n - 1)
        .clamp(nev, n - 1);
    let ortho = match variant {
        LanczosVariant::FullOrtho | LanczosVariant::FullOrthoInverse => Ortho::Full,
        LanczosVariant::SelectiveBothEnds => Ortho::Selective {
            both_ends: true,
            adaptive: true,
        },
        LanczosVariant::SelectiveLeftEnd => Ortho::Selective {
            both_ends: false,
            adaptive: true,
        },
        LanczosVariant::SelectiveLeftEndFixedPause => Ortho::Selective {
            both_ends: false,
            adaptive: false,
        },
    };
    let mut warnings = Vec::new();
    let inverse = variant == LanczosVariant::FullOrthoInverse;
    let rec = Recurrence {
        n,
        null: op.null_vector(),
        end: if inverse { End::Right } else { End::Left },
        nev,
        ortho,
        eigtol: cfg.eigtol,
        max_steps,
        pause: cfg.selective_pause.max(1),
        norm_hint: op.norm_bound(),
    };

    let outcome = if inverse {
        let inner = Projected {
            op,
            shift: 0.0,
            against: vec![op.null_vector()],
        };
        // Inner solves must be well below the outer tolerance.
        let rtol = cfg.eigtol * 1e-3;
        let apply = |x: &[f64], y: &mut [f64]| -> Result<(), PartitionError> {
            let sol = symmlq(&inner, x, rtol, cfg.symmlq_max_iterations, ws)?;
            if sol.hit_limit {
                warnings.push(Warning::SymmlqMaxIterations {
                    residual: sol.residual,
                });
            }
            y.copy_from_slice(&sol.x);
            Ok(())
        };
        recurrence(&rec, apply, rng, ws)?
    } else {
        let apply = |x: &[f64], y: &mut [f64]| -> Result<(), PartitionError> {
            op.apply(x, y);
            Ok(())
        };
        recurrence(&rec, apply, rng, ws)?
    };

    if !outcome.converged {
        warnings.push(Warning::LanczosMaxIterations {
            iterations: outcome.steps,
        });
    }
    log::debug!(
        "lanczos {:?}: {} steps, converged = {}",
        variant,
        outcome.steps,
        outcome.converged
    );

    let mut substantial = false;
    let mut pairs = Vec::with_capacity(outcome.ritz.len());
    for (index, r) in outcome.ritz.into_iter().enumerate() {
        let (value, predicted) = if inverse {
            let lambda = if r.value != 0.0 { 1.0 / r.value } else { 0.0 };
            // Bound on A⁻¹ scaled back to A: ‖Ay − λy‖ ≈ λ² ‖A⁻¹y − μy‖.
            (lambda, r.bound * lambda * lambda)
        } else {
            (r.value, r.bound)
        };
        let residual = checkeig(op, &r.vector, value);
        if residual > cfg.eigtol {
            warnings.push(Warning::EigenResidual {
                index,
                residual,
                tolerance: cfg.eigtol,
            });
        }
        let target = residual_target(cfg.eigtol, value, op.norm_bound());
        let floor = f64::EPSILON * op.norm_bound().max(outcome.anorm) * 10.0;
        let ratio = residual / predicted.max(floor);
        if residual > target && ratio > ORTHO_LOSS_MINOR {
            let big = ratio > ORTHO_LOSS_SUBSTANTIAL;
            substantial |= big;
            warnings.push(Warning::OrthogonalityLoss {
                index,
                ratio,
                substantial: big,
            });
        }
        pairs.push(EigenPair {
            value,
            vector: r.vector,
            residual,
        });
    }
    pairs.sort_by(|a, b| a.value.total_cmp(&b.value));
    Ok((
        EigenSolution {
            pairs,
            iterations: outcome.steps,
            warnings,
        },
        substantial,
    ))
}

fn recurrence<F, R>(
    rec: &Recurrence<'_>,
    mut apply: F,
    rng: &mut R,
    ws: &Workspace,
) -> Result<Outcome, PartitionError>
where
    F: FnMut(&[f64], &mut [f64]) -> Result<(), PartitionError>,
    R: Rng + ?Sized,
{
    let n = rec.n;
    let frame = ws.frame();
    let mut alpha: Vec<f64> = ws.alloc_empty(rec.max_steps)?;
    let mut beta: Vec<f64> = ws.alloc_empty(rec.max_steps)?;
    let mut basis: Vec<Vec<f64>> = Vec::new();
    let mut good: Vec<Vec<f64>> = Vec::new();
    let mut good_values: Vec<f64> = Vec::new();

    let first = fresh_vector(n, rec.null, &basis, rng, ws)?.unwrap_or_else(|| {
        // Only reachable for n = 1, which callers exclude.
        vec![0.0; n]
    });
    basis.push(first);

    let mut w: Vec<f64> = ws.alloc(n, 0.0)?;
    let mut pause = rec.pause;
    let mut next_check = pause;
    let mut anorm: f64 = 0.0;
    let mut converged = false;
    let mut b;

    loop {
        let j = basis.len() - 1;
        apply(&basis[j], &mut w)?;
        if j > 0 {
            axpy(-beta[j - 1], &basis[j - 1], &mut w);
        }
        let a = dot(&basis[j], &w);
        axpy(-a, &basis[j], &mut w);
        alpha.push(a);
        orthogonalize(&mut w, &[rec.null]);
        match rec.ortho {
            Ortho::Full => {
                orthogonalize(&mut w, &basis);
                orthogonalize(&mut w, &basis);
            }
            Ortho::Selective { .. } => orthogonalize(&mut w, &good),
        }
        b = super::norm(&w);
        let steps = alpha.len();

        let check = match rec.ortho {
            Ortho::Full => true,
            Ortho::Selective { .. } => steps >= next_check || steps >= rec.max_steps,
        };
        if check {
            let wanted = wanted_indices(steps, rec.nev, rec.end);
            let ritz = ritz_values(&alpha, &beta, &wanted);
            anorm = ritz.iter().fold(anorm, |m, t| m.max(t.abs()));
            let scale = anorm.max(rec.norm_hint);
            converged = steps >= rec.nev
                && ritz.iter().all(|&theta| {
                let s = tevec(&alpha, &beta, theta);
                let bound = (b * s.last().copied().unwrap_or(0.0)).abs();
                bound <= residual_target(rec.eigtol, theta, scale)
            });
            log::trace!("lanczos step {steps}: ritz {ritz:?}, |β| = {b:.3e}");

            if let Ortho::Selective {
                both_ends,
                adaptive,
            } = rec.ortho
            {
                let found = collect_good(
                    &alpha,
                    &beta,
                    b,
                    &basis,
                    both_ends,
                    rec.nev,
                    scale,
                    &mut good,
                    &mut good_values,
                    ws,
                )?;
                if adaptive {
                    pause = if found > 0 {
                        rec.pause
                    } else {
                        (pause + pause / 2 + 1).min(4 * rec.pause)
                    };
                }
                next_check = steps + pause;
            }
        }
        if converged || steps >= rec.max_steps {
            break;
        }

        let breakdown = f64::EPSILON * anorm.max(rec.norm_hint) * (n as f64).sqrt();
        if b <= breakdown {
            log::trace!("lanczos: invariant subspace after {steps} steps, restarting");
            let mut restarted = None;
            for _ in 0..RESTART_TRIES {
                if let Some(v) = fresh_vector(n, rec.null, &basis, rng, ws)? {
                    restarted = Some(v);
                    break;
                }
            }
            match restarted {
                Some(v) => {
                    beta.push(0.0);
                    basis.push(v);
                }
                None => break,
            }
        } else {
            beta.push(b);
            let mut v = ws.alloc_copy(&w)?;
            v.iter_mut().for_each(|x| *x /= b);
            basis.push(v);
        }
    }

    let steps = alpha.len();
    let wanted = wanted_indices(steps, rec.nev, rec.end);
    let values = ritz_values(&alpha, &beta, &wanted);
    let mut ritz = Vec::with_capacity(values.len());
    for theta in values {
        let s = tevec(&alpha, &beta, theta);
        let bound = (b * s.last().copied().unwrap_or(0.0)).abs();
        let mut y = vec![0.0; n];
        for (coef, v) in s.iter().zip(&basis) {
            axpy(*coef, v, &mut y);
        }
        orthogonalize(&mut y, &[rec.null]);
        normalize(&mut y);
        ritz.push(Ritz {
            value: theta,
            vector: y,
            bound,
        });
    }
    drop(frame);
    for r in &mut ritz {
        ws.charge(r.vector.len() * std::mem::size_of::<f64>())?;
    }
    Ok(Outcome {
        ritz,
        steps,
        converged,
        anorm,
    })
}

/// Ascending indices of the monitored Ritz values.
fn wanted_indices(steps: usize, nev: usize, end: End) -> Vec<usize> {
    let k = nev.min(steps);
    match end {
        End::Left => (0..k).collect(),
        End::Right => (steps - k..steps).collect(),
    }
}

/// Random unit vector orthogonal to `null` and `basis`, or `None` if
/// nothing of it survives orthogonalization.
fn fresh_vector<R: Rng + ?Sized>(
    n: usize,
    null: &[f64],
    basis: &[Vec<f64>],
    rng: &mut R,
    ws: &Workspace,
) -> Result<Option<Vec<f64>>, PartitionError> {
    let mut v = random_vector(n, rng, ws)?;
    let start = super::norm(&v);
    for _ in 0..2 {
        orthogonalize(&mut v, &[null]);
        orthogonalize(&mut v, basis);
    }
    let left = normalize(&mut v);
    Ok((left > 1e-8 * start).then_some(v))
}

/// Add newly converged Ritz vectors to the good set; returns how many.
#[allow(clippy::too_many_arguments)]
fn collect_good(
    alpha: &[f64],
    beta: &[f64],
    b: f64,
    basis: &[Vec<f64>],
    both_ends: bool,
    nev: usize,
    anorm: f64,
    good: &mut Vec<Vec<f64>>,
    good_values: &mut Vec<f64>,
    ws: &Workspace,
) -> Result<usize, PartitionError> {
    let steps = alpha.len();
    let k = (nev + GOOD_EXTRA).min(steps);
    let mut idx: Vec<usize> = (0..k).collect();
    if both_ends {
        idx.extend((steps - k..steps).filter(|i| *i >= k));
    }
    let thresh = f64::EPSILON.sqrt() * anorm;
    let same = 1e-8 * anorm.max(f64::MIN_POSITIVE);
    let mut found = 0;
    for theta in ritz_values(alpha, beta, &idx) {
        if good_values.iter().any(|g| (g - theta).abs() <= same) {
            continue;
        }
        let s = tevec(alpha, beta, theta);
        if (b * s.last().copied().unwrap_or(0.0)).abs() > thresh {
            continue;
        }
        let mut y = ws.alloc(basis[0].len(), 0.0)?;
        for (coef, v) in s.iter().zip(basis) {
            axpy(*coef, v, &mut y);
        }
        orthogonalize(&mut y, good);
        if normalize(&mut y) > 0.0 {
            good.push(y);
            good_values.push(theta);
            found += 1;
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn path(n: usize) -> Graph {
        let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1)).collect();
        Graph::from_edges(n, &edges)
    }

    fn solve(g: &Graph, variant: LanczosVariant, cutoff: usize) -> EigenSolution {
        let ws = Workspace::unlimited();
        let op = Laplacian::new(g, &ws).unwrap();
        let cfg = EigenConfig {
            variant,
            full_ortho_cutoff: cutoff,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        lanczos(&op, 2, &cfg, &mut rng, &ws).unwrap()
    }

    fn path_eigenvalue(n: usize, k: usize) -> f64 {
        2.0 - 2.0 * (k as f64 * std::f64::consts::PI / n as f64).cos()
    }

    #[test]
    fn full_ortho_finds_path_spectrum() {
        let g = path(40);
        let sol = solve(&g, LanczosVariant::FullOrtho, 0);
        for (k, p) in sol.pairs.iter().enumerate() {
            assert!((p.value - path_eigenvalue(40, k + 1)).abs() < 1e-6, "{p:?}");
            assert!(p.residual < 1e-3);
        }
    }

    #[test]
    fn every_variant_converges_on_a_path() {
        let g = path(60);
        for code in 1..=5 {
            let variant = LanczosVariant::from_code(code).unwrap();
            let sol = solve(&g, variant, 0);
            assert_eq!(sol.pairs.len(), 2);
            let l1 = path_eigenvalue(60, 1);
            assert!(
                (sol.pairs[0].value - l1).abs() < 1e-3 * l1 + 1e-8,
                "variant {code}: {} vs {l1}",
                sol.pairs[0].value
            );
            assert!(sol.pairs[0].residual < 1e-3, "variant {code}");
        }
    }

    #[test]
    fn disconnected_space_restarts() {
        // Two components: λ = 0 twice, the second found after breakdown.
        let g = Graph::from_edges(6, &[(0, 1), (1, 2), (3, 4), (4, 5)]);
        let sol = solve(&g, LanczosVariant::FullOrtho, 100);
        assert!(sol.pairs[0].value.abs() < 1e-8, "{:?}", sol.pairs[0]);
    }
}
