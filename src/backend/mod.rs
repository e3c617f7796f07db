//! Clients for the hosted services this orchestrator delegates to
//!
//! Embeddings, vector/keyword search, language-model calls, and grading are
//! all external; nothing here owns data or computes rankings itself.

mod embedding;
mod index;
mod llm;
mod traits;

pub use embedding::HttpEmbedder;
pub use index::IndexClient;
pub use llm::{parse_string_array, ChatClient};
pub use traits::{
    BackendError, BackendResult, ChatModel, Embedder, KeywordSearcher, RetrievalHit,
    VectorSearcher,
};

/// Turn a non-success response into the matching [`BackendError`], reading
/// the Retry-After header for 429s.
pub(crate) async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(BackendError::from_response(status, retry_after, body))
}
