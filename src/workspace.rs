//! Allocation service for one partitioning run.
//!
//! A [`Workspace`] is created per top-level call and handed by reference to
//! every routine that allocates graph copies or solver buffers. It keeps a
//! running byte count with mark/release semantics: everything charged after a
//! [`Mark`] is released in one step, regardless of how many buffers were
//! handed out. Buffers themselves are ordinary `Vec`s and are freed by drop;
//! the workspace is the single place where an allocation can fail, so an
//! optional byte limit turns memory exhaustion into
//! [`PartitionError::OutOfMemory`] instead of an abort.

use crate::error::PartitionError;
use std::cell::Cell;
use std::mem::size_of;

/// Checkpoint returned by [`Workspace::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

#[derive(Debug, Default)]
pub struct Workspace {
    limit: Option<usize>,
    in_use: Cell<usize>,
    peak: Cell<usize>,
}

impl Workspace {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            in_use: Cell::new(0),
            peak: Cell::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Bytes charged and not yet released.
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    /// High-water mark of [`in_use`](Self::in_use).
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Charge `bytes` against the budget without allocating.
    pub fn charge(&self, bytes: usize) -> Result<(), PartitionError> {
        let in_use = self.in_use.get();
        let next = in_use.saturating_add(bytes);
        if let Some(limit) = self.limit {
            if next > limit {
                return Err(PartitionError::OutOfMemory {
                    requested: bytes,
                    in_use,
                    limit: Some(limit),
                });
            }
        }
        self.in_use.set(next);
        if next > self.peak.get() {
            self.peak.set(next);
        }
        Ok(())
    }

    /// Allocate a vector of `len` copies of `fill`.
    pub fn alloc<T: Clone>(&self, len: usize, fill: T) -> Result<Vec<T>, PartitionError> {
        let mut v = self.alloc_empty(len)?;
        v.resize(len, fill);
        Ok(v)
    }

    /// Allocate an empty vector with room for `cap` elements.
    pub fn alloc_empty<T>(&self, cap: usize) -> Result<Vec<T>, PartitionError> {
        let bytes = cap.saturating_mul(size_of::<T>());
        self.charge(bytes)?;
        let mut v = Vec::new();
        v.try_reserve_exact(cap)
            .map_err(|_| PartitionError::OutOfMemory {
                requested: bytes,
                in_use: self.in_use.get(),
                limit: self.limit,
            })?;
        Ok(v)
    }

    /// Copy a slice into a freshly charged vector.
    pub fn alloc_copy<T: Clone>(&self, src: &[T]) -> Result<Vec<T>, PartitionError> {
        let mut v = self.alloc_empty(src.len())?;
        v.extend_from_slice(src);
        Ok(v)
    }

    pub fn mark(&self) -> Mark {
        Mark(self.in_use.get())
    }

    /// Release everything charged since `mark`.
    pub fn release(&self, mark: Mark) {
        debug_assert!(mark.0 <= self.in_use.get(), "release past a newer mark");
        self.in_use.set(mark.0.min(self.in_use.get()));
    }

    /// Scoped mark that releases when dropped.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            ws: self,
            mark: self.mark(),
        }
    }
}

/// RAII guard from [`Workspace::frame`].
#[derive(Debug)]
pub struct Frame<'a> {
    ws: &'a Workspace,
    mark: Mark,
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.ws.release(self.mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_release_restores_usage() {
        let ws = Workspace::unlimited();
        let _a: Vec<u64> = ws.alloc(10, 0).unwrap();
        let m = ws.mark();
        let _b: Vec<u64> = ws.alloc(100, 0).unwrap();
        assert_eq!(ws.in_use(), 880);
        ws.release(m);
        assert_eq!(ws.in_use(), 80);
        assert_eq!(ws.peak(), 880);
    }

    #[test]
    fn limit_is_enforced() {
        let ws = Workspace::new(Some(100));
        assert!(ws.alloc::<u8>(60, 0).is_ok());
        let err = ws.alloc::<u8>(60, 0).unwrap_err();
        assert!(matches!(
            err,
            PartitionError::OutOfMemory { requested: 60, in_use: 60, limit: Some(100) }
        ));
    }

    #[test]
    fn frame_releases_on_drop() {
        let ws = Workspace::unlimited();
        {
            let _f = ws.frame();
            let _v: Vec<f64> = ws.alloc(4, 1.0).unwrap();
            assert_eq!(ws.in_use(), 32);
        }
        assert_eq!(ws.in_use(), 0);
    }
}
