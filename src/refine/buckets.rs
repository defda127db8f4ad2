//! Bucket lists of integer move gains, one set of buckets per directed set
//! pair.
//!
//! Vertex `v` in set `s` sits in the buckets of every pair `(s, t)`, `t ≠ s`,
//! at index `gain + max_gain`. Each bucket is an intrusive doubly linked
//! list over nodes `v·nsets + t`, so insert and remove are O(1); the best
//! bucket of each pair is found by a top pointer that only moves down
//! lazily.

use crate::error::PartitionError;
use crate::workspace::Workspace;

const NIL: usize = usize::MAX;

#[derive(Debug)]
pub struct Buckets {
    nsets: usize,
    max_gain: i64,
    width: usize,
    heads: Vec<usize>,
    next: Vec<usize>,
    prev: Vec<usize>,
    /// Gain stored for each node, `None` when not in a bucket.
    gain: Vec<Option<i64>>,
    /// Highest bucket index that may be nonempty, per pair.
    top: Vec<Option<usize>>,
}

impl Buckets {
    pub fn new(
        nvtxs: usize,
        nsets: usize,
        max_gain: i64,
        ws: &Workspace,
    ) -> Result<Self, PartitionError> {
        let width = (2 * max_gain + 1) as usize;
        let npairs = nsets * nsets;
        Ok(Self {
            nsets,
            max_gain,
            width,
            heads: ws.alloc(npairs * width, NIL)?,
            next: ws.alloc(nvtxs * nsets, NIL)?,
            prev: ws.alloc(nvtxs * nsets, NIL)?,
            gain: ws.alloc(nvtxs * nsets, None)?,
            top: ws.alloc(npairs, None)?,
        })
    }

    #[inline]
    fn bucket(&self, from: usize, to: usize, gain: i64) -> usize {
        (from * self.nsets + to) * self.width + (gain.clamp(-self.max_gain, self.max_gain) + self.max_gain) as usize
    }

    pub fn insert(&mut self, v: usize, from: usize, to: usize, gain: i64) {
        let node = v * self.nsets + to;
        debug_assert!(self.gain[node].is_none(), "vertex {v} already bucketed");
        let g = gain.clamp(-self.max_gain, self.max_gain);
        let b = self.bucket(from, to, g);
        let head = self.heads[b];
        self.next[node] = head;
        self.prev[node] = NIL;
        if head != NIL {
            self.prev[head] = node;
        }
        self.heads[b] = node;
        self.gain[node] = Some(g);
        let idx = (g + self.max_gain) as usize;
        let pair = from * self.nsets + to;
        if self.top[pair].is_none_or(|t| t < idx) {
            self.top[pair] = Some(idx);
        }
    }

    pub fn remove(&mut self, v: usize, from: usize, to: usize) {
        let node = v * self.nsets + to;
        let Some(g) = self.gain[node].take() else {
            return;
        };
        let (p, n) = (self.prev[node], self.next[node]);
        if p != NIL {
            self.next[p] = n;
        } else {
            let b = self.bucket(from, to, g);
            self.heads[b] = n;
        }
        if n != NIL {
            self.prev[n] = p;
        }
        self.next[node] = NIL;
        self.prev[node] = NIL;
    }

    /// Best `(vertex, gain)` for moving from `from` to `to`.
    pub fn best(&mut self, from: usize, to: usize) -> Option<(usize, i64)> {
        let pair = from * self.nsets + to;
        let base = pair * self.width;
        while let Some(t) = self.top[pair] {
            let head = self.heads[base + t];
            if head != NIL {
                return Some((head / self.nsets, t as i64 - self.max_gain));
            }
            self.top[pair] = t.checked_sub(1);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_tracks_inserts_and_removals() {
        let ws = Workspace::unlimited();
        let mut b = Buckets::new(4, 2, 5, &ws).unwrap();
        b.insert(0, 0, 1, 2);
        b.insert(1, 0, 1, -3);
        b.insert(2, 1, 0, 4);
        assert_eq!(b.best(0, 1), Some((0, 2)));
        b.remove(0, 0, 1);
        assert_eq!(b.best(0, 1), Some((1, -3)));
        b.remove(1, 0, 1);
        assert_eq!(b.best(0, 1), None);
        assert_eq!(b.best(1, 0), Some((2, 4)));
    }

    #[test]
    fn gains_beyond_range_are_clamped() {
        let ws = Workspace::unlimited();
        let mut b = Buckets::new(1, 2, 3, &ws).unwrap();
        b.insert(0, 1, 0, 100);
        assert_eq!(b.best(1, 0), Some((0, 3)));
    }

    #[test]
    fn same_bucket_is_lifo() {
        let ws = Workspace::unlimited();
        let mut b = Buckets::new(3, 2, 2, &ws).unwrap();
        b.insert(0, 0, 1, 1);
        b.insert(1, 0, 1, 1);
        assert_eq!(b.best(0, 1), Some((1, 1)));
        b.remove(1, 0, 1);
        assert_eq!(b.best(0, 1), Some((0, 1)));
    }
}
