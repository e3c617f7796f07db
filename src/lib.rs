//! Scout: hybrid candidate search and submission
//!
//! Orchestrates candidate retrieval against a hosted search index:
//! - Query expansion through a chat-completion model
//! - Dual-path retrieval (vector ANN + keyword BM25)
//! - Score normalization and weighted merge
//! - Hard keyword filtering and capped ranking
//! - Submission of ranked lists to an external grading service

pub mod backend;
pub mod config;
pub mod expand;
pub mod grading;
pub mod retrieval;
pub mod retry;
pub mod runner;
pub mod types;
pub mod util;

pub use config::Config;
pub use types::*;
