#![cfg_attr(docsrs, feature(doc_cfg))]
//! # ug-partition
//!
//! ug-partition splits a weighted, undirected graph into a given number of
//! balanced sets with few cut edges, for load balancing unstructured-grid
//! PDE solvers. It partitions recursively, cutting each (sub)graph into two,
//! four or eight pieces per step.
//!
//! ## Features
//! - Spectral division from Laplacian eigenvectors: Lanczos with full or
//!   selective orthogonalization, shift-and-invert via SYMMLQ, and a
//!   multilevel solver that refines interpolated vectors by Rayleigh
//!   quotient iteration
//! - Graph coarsening by randomized matching with spring-model edge
//!   reduction
//! - Median, recursive-median and zero-cut mappers, with optional rotation
//!   of 2- and 3-dimensional embeddings
//! - Multi-way Kernighan–Lin refinement of a hop-weighted cut
//! - Multilevel KL, inertial, linear, random and scattered global methods
//! - Hypercube and mesh targets with per-set weight goals
//!
//! ## Determinism
//!
//! All randomized decisions use one `SmallRng` seeded from
//! [`PartitionerConfig::rng_seed`](config::PartitionerConfig::rng_seed), so
//! runs are reproducible. Logging goes through the `log` facade and never
//! influences the result.
//!
//! ## Usage
//!
//! ```
//! use ug_partition::prelude::*;
//!
//! // 4 × 2 grid
//! let edges = [(0, 1), (1, 2), (2, 3), (4, 5), (5, 6), (6, 7), (0, 4), (1, 5), (2, 6), (3, 7)];
//! let graph = Graph::from_edges(8, &edges);
//! let part = partition(&graph, &Target::hypercube(1), None, None, &PartitionerConfig::default())?;
//! assert_eq!(part.metrics.cut_edges, 2);
//! # Ok::<(), PartitionError>(())
//! ```

pub mod assign;
pub mod coarsen;
pub mod config;
pub mod debug_invariants;
pub mod diagnostics;
pub mod driver;
pub mod eigen;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod refine;
pub mod target;
pub mod workspace;

pub use debug_invariants::DebugInvariants;
pub use driver::{Partition, partition, validate};
pub use error::PartitionError;

/// A convenient prelude to import the most-used types.
pub mod prelude {
    pub use crate::config::{
        CoarsenConfig, EigenConfig, Eigensolver, GlobalMethod, KlConfig, LanczosVariant,
        LocalMethod, MapperConfig, MedianType, PartitionerConfig,
    };
    pub use crate::diagnostics::{Diagnostics, Warning};
    pub use crate::driver::{Partition, partition, validate};
    pub use crate::error::{GraphViolation, PartitionError, Violation, Violations};
    pub use crate::graph::Graph;
    pub use crate::metrics::PartitionMetrics;
    pub use crate::target::Target;
}
