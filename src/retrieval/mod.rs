//! Candidate retrieval core
//!
//! Pools per-path results across query variants, normalizes and merges the
//! two score scales, and applies hard keyword filters.

mod filter;
mod merge;
mod pool;
mod rerank;

pub use filter::{apply_hard_filter, HardFilter};
pub use merge::{merge_pools, min_max_normalize, MergeWeights};
pub use pool::ResultPool;
pub use rerank::{apply_order, llm_rerank};
