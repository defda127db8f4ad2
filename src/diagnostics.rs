//! Non-fatal conditions and timing collected during one run.
//!
//! Every [`Warning`] is also echoed through `log::warn!` when it is recorded,
//! so callers without a logger installed still get the full list back in
//! [`Diagnostics`].

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// An eigenpair finished with a residual above tolerance.
    EigenResidual {
        index: usize,
        residual: f64,
        tolerance: f64,
    },
    /// Actual residual far exceeds the Lanczos estimate.
    OrthogonalityLoss { index: usize, ratio: f64, substantial: bool },
    /// Lanczos hit its step limit before every requested pair converged.
    LanczosMaxIterations { iterations: usize },
    /// Rayleigh quotient iteration stopped at its step limit.
    RqiMaxSteps { residual: f64 },
    /// SYMMLQ stopped at its iteration limit.
    SymmlqMaxIterations { residual: f64 },
    /// A coarsening step removed too few vertices.
    CoarsenGaveUp { level: usize, from: usize, to: usize },
    /// The bipartite mapper was requested; recursive medians were used.
    MapperFallback,
    /// A subgraph was too small for the requested eigenpairs.
    LinearFallback { vertices: usize, eigenpairs: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EigenResidual {
                index,
                residual,
                tolerance,
            } => write!(
                f,
                "eigenpair {index} residual {residual:.3e} exceeds tolerance {tolerance:.3e}"
            ),
            Self::OrthogonalityLoss {
                index,
                ratio,
                substantial,
            } => write!(
                f,
                "{} orthogonality loss on eigenpair {index} (actual/predicted residual {ratio:.2})",
                if *substantial { "substantial" } else { "minor" }
            ),
            Self::LanczosMaxIterations { iterations } => {
                write!(f, "Lanczos stopped after {iterations} steps without converging")
            }
            Self::RqiMaxSteps { residual } => {
                write!(f, "RQI step limit reached with residual {residual:.3e}")
            }
            Self::SymmlqMaxIterations { residual } => {
                write!(f, "SYMMLQ iteration limit reached with residual {residual:.3e}")
            }
            Self::CoarsenGaveUp { level, from, to } => write!(
                f,
                "coarsening level {level} only reduced {from} vertices to {to}; solving directly"
            ),
            Self::MapperFallback => {
                write!(f, "bipartite matching mapper unavailable; using recursive median")
            }
            Self::LinearFallback {
                vertices,
                eigenpairs,
            } => write!(
                f,
                "{vertices} vertices cannot supply {eigenpairs} eigenpairs; using linear split"
            ),
        }
    }
}

/// Wall-clock time per phase, summed over all recursion levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timings {
    /// Multilevel KL outside the coarsest-graph solve: coarsening,
    /// projection and per-level refinement.
    pub coarsen: Duration,
    pub eigen: Duration,
    pub assign: Duration,
    pub kl: Duration,
    pub total: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub warnings: Vec<Warning>,
    pub timings: Timings,
    /// Recursion steps executed.
    pub levels: usize,
    /// Workspace high-water mark in bytes.
    pub peak_bytes: usize,
}

impl Diagnostics {
    pub fn warn(&mut self, w: Warning) {
        log::warn!("{w}");
        self.warnings.push(w);
    }

    pub fn extend(&mut self, ws: impl IntoIterator<Item = Warning>) {
        for w in ws {
            self.warn(w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_collected_in_order() {
        let mut d = Diagnostics::default();
        d.warn(Warning::MapperFallback);
        d.extend([Warning::RqiMaxSteps { residual: 0.5 }]);
        assert_eq!(d.warnings.len(), 2);
        assert!(d.warnings[1].to_string().contains("RQI"));
    }
}
