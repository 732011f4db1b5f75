//! Core traits and wrapper implementations.

pub mod traits;
pub mod wrappers;

pub use traits::{Indexing, InnerProduct, MatVec};
pub use wrappers::DistributedInnerProduct;
