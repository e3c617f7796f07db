//! Backend trait definitions and error taxonomy
//!
//! The orchestrator only sees these traits; concrete HTTP clients live in
//! sibling modules, and tests substitute in-memory fakes.

use crate::retry::Retryable;
use crate::types::{CandidateId, Embedding};
use async_trait::async_trait;
use std::time::Duration;

/// Errors from hosted API calls
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP 429, kept distinct so backoff can be extended
    #[error("rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds, if the API provided one
        retry_after_ms: Option<u64>,
    },

    /// Response parsed but did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Client could not be constructed
    #[error("configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Build the appropriate error for a non-success response
    pub fn from_response(status: reqwest::StatusCode, retry_after: Option<u64>, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited {
                retry_after_ms: retry_after.map(|s| s * 1000),
            }
        } else {
            Self::Status {
                status: status.as_u16(),
                body,
            }
        }
    }
}

impl Retryable for BackendError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::RateLimited { .. } => true,
            Self::Malformed(_) | Self::Config(_) => false,
        }
    }

    fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_ms } => retry_after_ms.map(Duration::from_millis),
            _ => None,
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// One row returned by a retrieval path
#[derive(Debug, Clone)]
pub struct RetrievalHit {
    pub id: CandidateId,
    /// Path-local score, higher is better
    pub score: f32,
    /// Display name, when the index returns it
    pub name: Option<String>,
    /// Profile summary, when the index returns it
    pub summary: Option<String>,
}

/// Text-to-vector provider
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> BackendResult<Embedding>;

    fn dimensions(&self) -> usize;
}

/// Nearest-neighbor lookup over the candidate embedding index
#[async_trait]
pub trait VectorSearcher: Send + Sync {
    async fn vector_search(&self, embedding: &[f32], top_k: usize)
        -> BackendResult<Vec<RetrievalHit>>;
}

/// Term-relevance lookup over the candidate text index
#[async_trait]
pub trait KeywordSearcher: Send + Sync {
    async fn keyword_search(&self, text: &str, top_k: usize) -> BackendResult<Vec<RetrievalHit>>;
}

/// Hosted chat-completion model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one system+user exchange and return the completion text
    async fn complete(&self, system: &str, user: &str) -> BackendResult<String>;
}
