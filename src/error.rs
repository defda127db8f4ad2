//! PartitionError: unified error type for ug-partition public APIs
//!
//! Every fallible routine in the crate returns `Result<_, PartitionError>`.
//! Allocation failures, validation failures and undersized eigenproblems are
//! the only conditions that stop a run; numerical trouble is reported as a
//! [`Warning`](crate::diagnostics::Warning) instead.

use std::fmt;
use thiserror::Error;

/// Unified error type for partitioning operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PartitionError {
    /// The workspace could not provide the requested allocation.
    #[error(
        "out of memory: requested {requested} bytes with {in_use} bytes in use (limit {})",
        fmt_limit(.limit)
    )]
    OutOfMemory {
        requested: usize,
        in_use: usize,
        limit: Option<usize>,
    },
    /// Input graph, target or configuration failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(Violations),
    /// The eigensolver was asked for more eigenpairs than the problem has.
    #[error("eigenproblem with {vertices} vertices cannot supply {eigenpairs} eigenpairs")]
    ProblemTooSmall { vertices: usize, eigenpairs: usize },
}

fn fmt_limit(limit: &Option<usize>) -> String {
    match limit {
        Some(l) => l.to_string(),
        None => "none".to_string(),
    }
}

/// A single violated validation rule.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Violation {
    #[error("dimensions per step {0} outside 1..={max}", max = crate::config::MAXDIMS)]
    DimsPerStep(usize),
    #[error("total hypercube dimension {0} exceeds {max}", max = crate::config::MAXDIMS_TOT)]
    DimsTotal(usize),
    #[error("{0} sets per step exceeds {max}", max = crate::config::MAXSETS)]
    SetsPerStep(usize),
    #[error("mesh target has a zero extent: {0:?}")]
    EmptyMesh([usize; 3]),
    #[error("multilevel KL needs the KL local method enabled")]
    MultilevelWithoutKl,
    #[error("coarsening threshold vmax={vmax} must exceed dimensions per step {ndims}")]
    VmaxTooSmall { vmax: usize, ndims: usize },
    #[error("inertial method requires vertex coordinates")]
    MissingCoordinates,
    #[error("coordinates have {got} dimensions, need 1..=3")]
    CoordinateDims { got: usize },
    #[error("coordinate array {axis} has {got} entries, expected {expected}")]
    CoordinateLength {
        axis: usize,
        expected: usize,
        got: usize,
    },
    #[error("goal vector has {got} entries, expected {expected}")]
    GoalLength { expected: usize, got: usize },
    #[error("goal for set {set} is negative or not finite: {value}")]
    GoalValue { set: usize, value: f64 },
    #[error("goals sum to zero")]
    GoalSum,
    #[error("eigen tolerance {0} must be positive")]
    EigenTolerance(f64),
    #[error("graph: {0}")]
    Graph(#[from] GraphViolation),
}

/// Structural problems found by [`check_graph`](crate::graph::check::check_graph).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphViolation {
    #[error("vertex {0} does not list itself first")]
    SelfNotFirst(usize),
    #[error("vertex {vertex} has neighbour {neighbor} out of range")]
    NeighborOutOfRange { vertex: usize, neighbor: usize },
    #[error("vertex {0} lists itself as a neighbour")]
    SelfLoop(usize),
    #[error("vertex {vertex} lists neighbour {neighbor} twice")]
    DuplicateEdge { vertex: usize, neighbor: usize },
    #[error("edge ({0}, {1}) has no reverse edge")]
    Asymmetric(usize, usize),
    #[error("edge ({0}, {1}) weight differs from its reverse")]
    WeightMismatch(usize, usize),
    #[error("vertex {0} has a non-positive weight")]
    VertexWeight(usize),
    #[error("edge ({0}, {1}) has a non-positive weight")]
    EdgeWeight(usize, usize),
    #[error("vertex {0} edge weights do not sum to zero")]
    RowSum(usize),
    #[error("CSR arrays malformed: {0}")]
    Malformed(&'static str),
    #[error("vertex {vertex} has {edges} edges but {weights} edge weights")]
    WeightCount {
        vertex: usize,
        edges: usize,
        weights: usize,
    },
}

/// Every violation found during validation, in discovery order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn push(&mut self, v: impl Into<Violation>) {
        self.0.push(v.into());
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }
    /// `Ok(())` when nothing was recorded, otherwise the collected list.
    pub fn into_result(self) -> Result<(), PartitionError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(PartitionError::InvalidInput(self))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
