//! Dense matrix encoding of taxonomy trees
//!
//! A tree with `L` leaves and depth `d` encodes to an `L x (d + 1)` matrix:
//! one row per root-to-leaf path, one column per level. Short paths are
//! padded with zeros, so a missing node and a zero payload look the same;
//! [`TaxTree::path_mask`](crate::TaxTree::path_mask) tells them apart.

mod encoder;
mod batch;

pub use batch::{stack_matrices, SampleBatch};
