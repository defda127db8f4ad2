//! Target architectures: how final set numbers are laid out and how far
//! apart two sets are.
//!
//! A hypercube of dimension `d` has `2^d` sets numbered so that each
//! recursion step shifts its child bits in below the bits chosen earlier;
//! the hop count between two sets is the Hamming distance of their numbers.
//! A mesh `x × y × z` numbers set `(i, j, k)` as `i + x·(j + y·k)`; each step
//! halves the longest axes of the current box and hops are Manhattan
//! distances.

use crate::config::{MAXDIMS, MAXDIMS_TOT, MAXSETS};
use crate::error::{PartitionError, Violation, Violations};
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Hypercube { ndims: usize },
    Mesh { extents: [usize; 3] },
}

/// The final sets still to be separated at one recursion node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    /// Sets `base .. base + 2^dims`.
    Cube { base: usize, dims: usize },
    /// Box of mesh cells with corner `lo` and size `len`.
    Box { lo: [usize; 3], len: [usize; 3] },
}

/// One recursion step: the children of a block and the hops between them.
#[derive(Debug, Clone)]
pub struct Split {
    /// Cut dimensions used; there are `2^ndims` children.
    pub ndims: usize,
    pub children: Vec<Block>,
    pub hops: HopMatrix,
}

impl Target {
    pub fn hypercube(ndims: usize) -> Self {
        Self::Hypercube { ndims }
    }

    pub fn mesh(x: usize, y: usize, z: usize) -> Self {
        Self::Mesh { extents: [x, y, z] }
    }

    pub fn nsets(&self) -> usize {
        match *self {
            Self::Hypercube { ndims } => 1usize << ndims.min(usize::BITS as usize - 1),
            Self::Mesh { extents } => extents.iter().product(),
        }
    }

    pub fn root(&self) -> Block {
        match *self {
            Self::Hypercube { ndims } => Block::Cube { base: 0, dims: ndims },
            Self::Mesh { extents } => Block::Box {
                lo: [0; 3],
                len: extents,
            },
        }
    }

    /// Final set numbers covered by `block`, ascending.
    pub fn final_sets(&self, block: &Block) -> Vec<usize> {
        match (*self, *block) {
            (_, Block::Cube { base, dims }) => (base..base + (1 << dims)).collect(),
            (Self::Mesh { extents }, Block::Box { lo, len }) => {
                let mut out = Vec::with_capacity(len.iter().product());
                for k in lo[2]..lo[2] + len[2] {
                    for j in lo[1]..lo[1] + len[1] {
                        for i in lo[0]..lo[0] + len[0] {
                            out.push(i + extents[0] * (j + extents[1] * k));
                        }
                    }
                }
                out
            }
            (Self::Hypercube { .. }, Block::Box { .. }) => Vec::new(),
        }
    }

    /// The single final set of a leaf block, `None` if more remain.
    pub fn leaf_set(&self, block: &Block) -> Option<usize> {
        let sets = self.final_sets(block);
        (sets.len() == 1).then(|| sets[0])
    }

    /// Split `block` using at most `dims_per_step` cut dimensions.
    /// Returns `None` for leaves.
    pub fn split(&self, block: &Block, dims_per_step: usize) -> Option<Split> {
        match *block {
            Block::Cube { base, dims } => {
                let d = dims_per_step.min(dims);
                if d == 0 {
                    return None;
                }
                let rest = dims - d;
                let children = (0..1usize << d)
                    .map(|c| Block::Cube {
                        base: base + (c << rest),
                        dims: rest,
                    })
                    .collect();
                Some(Split {
                    ndims: d,
                    children,
                    hops: HopMatrix::hamming(1 << d),
                })
            }
            Block::Box { lo, len } => {
                let mut axes: Vec<usize> = (0..3).filter(|&a| len[a] > 1).collect();
                axes.sort_by(|&a, &b| len[b].cmp(&len[a]).then(a.cmp(&b)));
                axes.truncate(dims_per_step);
                if axes.is_empty() {
                    return None;
                }
                let d = axes.len();
                let children = (0..1usize << d)
                    .map(|c| {
                        let (mut clo, mut clen) = (lo, len);
                        for (j, &a) in axes.iter().enumerate() {
                            let low = len[a] / 2;
                            if c >> j & 1 == 0 {
                                clen[a] = low;
                            } else {
                                clo[a] = lo[a] + low;
                                clen[a] = len[a] - low;
                            }
                        }
                        Block::Box { lo: clo, len: clen }
                    })
                    .collect();
                Some(Split {
                    ndims: d,
                    children,
                    hops: HopMatrix::hamming(1 << d),
                })
            }
        }
    }

    /// Hops between every pair of final sets, charged to `ws`.
    pub fn hop_matrix(&self, ws: &Workspace) -> Result<HopMatrix, PartitionError> {
        let n = self.nsets();
        let mut m = HopMatrix {
            n,
            data: ws.alloc(n.saturating_mul(n), 0)?,
        };
        match *self {
            Self::Hypercube { .. } => m.fill(|a, b| (a ^ b).count_ones() as i32),
            Self::Mesh { extents } => {
                let coord = |s: usize| {
                    [
                        s % extents[0],
                        (s / extents[0]) % extents[1],
                        s / (extents[0] * extents[1]),
                    ]
                };
                m.fill(|a, b| {
                    let (ca, cb) = (coord(a), coord(b));
                    (0..3).map(|i| ca[i].abs_diff(cb[i]) as i32).sum()
                });
            }
        }
        Ok(m)
    }

    pub fn violations(&self, dims_per_step: usize) -> Violations {
        let mut out = Violations::default();
        match *self {
            Self::Hypercube { ndims } => {
                if ndims > MAXDIMS_TOT {
                    out.push(Violation::DimsTotal(ndims));
                }
            }
            Self::Mesh { extents } => {
                if extents.contains(&0) {
                    out.push(Violation::EmptyMesh(extents));
                }
            }
        }
        if dims_per_step > MAXDIMS && dims_per_step < usize::BITS as usize {
            let sets = 1usize << dims_per_step;
            if sets > MAXSETS {
                out.push(Violation::SetsPerStep(sets));
            }
        }
        out
    }
}

/// Sum final-set goals over each child block.
pub fn merge_goals(target: &Target, children: &[Block], goals: &[f64]) -> Vec<f64> {
    children
        .iter()
        .map(|b| target.final_sets(b).iter().map(|&s| goals[s]).sum())
        .collect()
}

/// Dense `n × n` table of hop costs between sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopMatrix {
    n: usize,
    data: Vec<i32>,
}

impl HopMatrix {
    fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0; n * n],
        }
    }

    fn fill(&mut self, hop: impl Fn(usize, usize) -> i32) {
        let n = self.n;
        for a in 0..n {
            for b in 0..n {
                self.data[a * n + b] = hop(a, b);
            }
        }
    }

    /// Hamming distance between set numbers.
    pub fn hamming(n: usize) -> Self {
        let mut m = Self::zeros(n);
        m.fill(|a, b| (a ^ b).count_ones() as i32);
        m
    }


    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn hop(&self, a: usize, b: usize) -> i32 {
        self.data[a * self.n + b]
    }
}
