//! Partitioner configuration.
//!
//! All tuning knobs live in one immutable [`PartitionerConfig`] that is
//! threaded by reference through every routine. Nothing is read from global
//! state; two runs with equal configs and inputs produce equal assignments.

use crate::error::{Violation, Violations};
use serde::{Deserialize, Serialize};

/// Most eigenvectors (cut dimensions) used in one recursion step.
pub const MAXDIMS: usize = 3;
/// Largest supported hypercube dimension.
pub const MAXDIMS_TOT: usize = 11;
/// Most sets produced in one recursion step.
pub const MAXSETS: usize = 1 << MAXDIMS;
/// Coarsening gives up when a level keeps at least this fraction of vertices.
pub const COARSEN_RATIO_MIN: f64 = 0.7;

/// Method used to divide a (sub)graph at each recursion level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalMethod {
    /// Coarsen, partition the coarsest graph spectrally, refine with KL on the way up.
    MultilevelKl,
    /// Eigenvectors of the Laplacian mapped by the median mapper.
    Spectral,
    /// Principal axes of caller-supplied coordinates.
    Inertial,
    /// Contiguous blocks in vertex order.
    Linear,
    /// Balanced random blocks.
    Random,
    /// Round-robin by vertex index.
    Scattered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalMethod {
    Kl,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eigensolver {
    /// Lanczos directly on the (sub)graph.
    Lanczos,
    /// Lanczos on a coarsened graph, interpolated back and refined by RQI/SYMMLQ.
    MultilevelRqi,
}

/// Lanczos orthogonalization policy; numeric codes 1–5 match the classic
/// parameter file values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanczosVariant {
    FullOrtho,
    FullOrthoInverse,
    SelectiveBothEnds,
    SelectiveLeftEnd,
    SelectiveLeftEndFixedPause,
}

impl LanczosVariant {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::FullOrtho),
            2 => Some(Self::FullOrthoInverse),
            3 => Some(Self::SelectiveBothEnds),
            4 => Some(Self::SelectiveLeftEnd),
            5 => Some(Self::SelectiveLeftEndFixedPause),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::FullOrtho => 1,
            Self::FullOrthoInverse => 2,
            Self::SelectiveBothEnds => 3,
            Self::SelectiveLeftEnd => 4,
            Self::SelectiveLeftEndFixedPause => 5,
        }
    }

    pub fn is_selective(self) -> bool {
        matches!(
            self,
            Self::SelectiveBothEnds | Self::SelectiveLeftEnd | Self::SelectiveLeftEndFixedPause
        )
    }
}

/// How eigenvector coordinates become set indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedianType {
    /// Threshold every vector at zero.
    ZeroCut,
    /// Weighted median of every vector, independently.
    IndependentMedians,
    /// Nested medians, one dimension at a time.
    RecursiveMedian,
    /// Min-cost assignment; currently served by [`MedianType::RecursiveMedian`].
    BipartiteMatching,
}

impl MedianType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::ZeroCut),
            1 => Some(Self::IndependentMedians),
            2 => Some(Self::RecursiveMedian),
            3 => Some(Self::BipartiteMatching),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigenConfig {
    pub solver: Eigensolver,
    pub variant: LanczosVariant,
    /// Relative residual tolerance for eigenpairs.
    pub eigtol: f64,
    /// Lanczos step limit; `None` means the subspace dimension.
    pub max_iterations: Option<usize>,
    /// Problems this small always use full orthogonalization.
    pub full_ortho_cutoff: usize,
    /// Initial interval between good-Ritz-vector checks in selective variants.
    pub selective_pause: usize,
    pub rqi_max_steps: usize,
    /// SYMMLQ tolerance is `residual / rqi_factor`.
    pub rqi_factor: f64,
    pub symmlq_max_iterations: usize,
    /// Re-solve with full orthogonalization after substantial orthogonality loss.
    pub fallback_on_orthogonality_loss: bool,
}

impl Default for EigenConfig {
    fn default() -> Self {
        Self {
            solver: Eigensolver::Lanczos,
            variant: LanczosVariant::SelectiveBothEnds,
            eigtol: 1e-3,
            max_iterations: None,
            full_ortho_cutoff: 100,
            selective_pause: 10,
            rqi_max_steps: 25,
            rqi_factor: 10.0,
            symmlq_max_iterations: 400,
            fallback_on_orthogonality_loss: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoarsenConfig {
    /// Stop coarsening once a graph has at most this many vertices.
    pub vmax: usize,
    /// Scale simple edges by the spring reduction factor when contracting.
    pub spring_reduction: bool,
}

impl Default for CoarsenConfig {
    fn default() -> Self {
        Self {
            vmax: 50,
            spring_reduction: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KlConfig {
    /// Consecutive non-improving balanced passes before stopping.
    pub ntries_bad: usize,
    /// Consecutive moves without a new best before a pass stops.
    pub bad_moves: usize,
    /// Stop a pass once the running gain trails the best by this fraction of
    /// the starting cut (at least one edge).
    pub loss_cutoff: Option<f64>,
    /// Break exact ties between candidate moves randomly.
    pub random_ties: bool,
    pub max_passes: usize,
}

impl Default for KlConfig {
    fn default() -> Self {
        Self {
            ntries_bad: 1,
            bad_moves: 20,
            loss_cutoff: Some(0.5),
            random_ties: false,
            max_passes: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub median_type: MedianType,
    /// Rotate 2- and 3-dimensional embeddings before cutting.
    pub rotate: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            median_type: MedianType::RecursiveMedian,
            rotate: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionerConfig {
    pub global_method: GlobalMethod,
    pub local_method: LocalMethod,
    /// Eigenvectors (cut dimensions) per recursion step: 1 bisection,
    /// 2 quadrisection, 3 octasection.
    pub dims_per_step: usize,
    pub eigen: EigenConfig,
    pub coarsen: CoarsenConfig,
    pub kl: KlConfig,
    pub mapper: MapperConfig,
    /// Join disconnected subgraphs with phantom edges before spectral work.
    pub make_connected: bool,
    pub rng_seed: u64,
    /// Workspace byte budget; `None` is unbounded.
    pub memory_limit: Option<usize>,
}

impl Default for PartitionerConfig {
    fn default() -> Self {
        Self {
            global_method: GlobalMethod::Spectral,
            local_method: LocalMethod::Kl,
            dims_per_step: 1,
            eigen: EigenConfig::default(),
            coarsen: CoarsenConfig::default(),
            kl: KlConfig::default(),
            mapper: MapperConfig::default(),
            make_connected: true,
            rng_seed: 42,
            memory_limit: None,
        }
    }
}

impl PartitionerConfig {
    /// Whether the configured global method solves eigenproblems.
    pub fn uses_eigensolver(&self) -> bool {
        matches!(
            self.global_method,
            GlobalMethod::Spectral | GlobalMethod::MultilevelKl
        )
    }

    /// Rules that depend on the configuration alone.
    pub fn violations(&self) -> Violations {
        let mut out = Violations::default();
        if self.dims_per_step == 0 || self.dims_per_step > MAXDIMS {
            out.push(Violation::DimsPerStep(self.dims_per_step));
        }
        if self.global_method == GlobalMethod::MultilevelKl && self.local_method != LocalMethod::Kl
        {
            out.push(Violation::MultilevelWithoutKl);
        }
        let multilevel = self.global_method == GlobalMethod::MultilevelKl
            || (self.global_method == GlobalMethod::Spectral
                && self.eigen.solver == Eigensolver::MultilevelRqi);
        if multilevel && self.coarsen.vmax <= self.dims_per_step {
            out.push(Violation::VmaxTooSmall {
                vmax: self.coarsen.vmax,
                ndims: self.dims_per_step,
            });
        }
        if self.uses_eigensolver() && !(self.eigen.eigtol > 0.0) {
            out.push(Violation::EigenTolerance(self.eigen.eigtol));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PartitionerConfig::default().violations().is_empty());
    }

    #[test]
    fn every_violation_is_reported() {
        let cfg = PartitionerConfig {
            global_method: GlobalMethod::MultilevelKl,
            local_method: LocalMethod::None,
            dims_per_step: 4,
            coarsen: CoarsenConfig {
                vmax: 2,
                ..Default::default()
            },
            eigen: EigenConfig {
                eigtol: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let v = cfg.violations();
        assert_eq!(v.len(), 4, "{v}");
    }

    #[test]
    fn variant_codes_round_trip() {
        for code in 1..=5u8 {
            let v = LanczosVariant::from_code(code).unwrap();
            assert_eq!(v.code(), code);
        }
        assert!(LanczosVariant::from_code(6).is_none());
        assert_eq!(MedianType::from_code(2), Some(MedianType::RecursiveMedian));
    }
}
