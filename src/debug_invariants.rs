//! Structural self-checks for the data the partitioner builds internally.
//!
//! Input graphs are checked unconditionally by validation. Graphs and maps
//! derived from them (coarse levels, the workspace counters) are checked by
//! [`debug_invariants!`](crate::debug_invariants) only in debug builds or
//! with the `strict-invariants` feature.

use crate::coarsen::CoarseLevel;
use crate::error::{GraphViolation, PartitionError, Violations};
use crate::graph::Graph;
use crate::graph::check::check_graph;
use crate::workspace::Workspace;

/// Types that can validate their own structural invariants.
pub trait DebugInvariants {
    /// Return every violation found.
    fn validate_invariants(&self) -> Result<(), PartitionError>;

    /// Panic on a violation when invariant checking is compiled in.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "self-check");
    }
}

/// Run a fallible check and panic with `ctx` on error, in debug builds or
/// with `strict-invariants`.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

impl DebugInvariants for Graph {
    fn validate_invariants(&self) -> Result<(), PartitionError> {
        let mut out = Violations::default();
        for v in check_graph(self) {
            out.push(v);
        }
        out.into_result()
    }
}

/// The coarse graph is well formed and every fine vertex belongs to exactly
/// the coarse vertex that lists it.
impl DebugInvariants for CoarseLevel {
    fn validate_invariants(&self) -> Result<(), PartitionError> {
        let mut out = Violations::default();
        for v in check_graph(&self.graph) {
            out.push(v);
        }
        if self.merges.len() != self.graph.len() {
            out.push(GraphViolation::Malformed("merge list length differs from coarse graph"));
        }
        let nfine = self.v2cv.len();
        if self.mflag.len() != nfine || self.reduction.len() != nfine {
            out.push(GraphViolation::Malformed("fine maps differ in length"));
        }
        let mut seen = vec![false; nfine];
        for (c, m) in self.merges.iter().enumerate() {
            for v in m.members() {
                if v >= nfine || seen[v] || self.v2cv[v] != c {
                    out.push(GraphViolation::Malformed("fine vertex mapped inconsistently"));
                    continue;
                }
                seen[v] = true;
            }
        }
        if seen.iter().any(|&s| !s) {
            out.push(GraphViolation::Malformed("fine vertex missing from merge list"));
        }
        out.into_result()
    }
}

impl DebugInvariants for Workspace {
    fn validate_invariants(&self) -> Result<(), PartitionError> {
        let mut out = Violations::default();
        if self.in_use() > self.peak() {
            out.push(GraphViolation::Malformed("workspace usage above its peak"));
        }
        if self.limit().is_some_and(|l| self.peak() > l) {
            out.push(GraphViolation::Malformed("workspace peak above its limit"));
        }
        out.into_result()
    }
}
