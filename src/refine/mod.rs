//! Local refinement of a partition.

pub mod buckets;
pub mod kl;

pub use kl::{KlStats, hop_cost, kl_refine};
