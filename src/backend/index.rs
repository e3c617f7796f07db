//! Hosted search index client
//!
//! Both retrieval paths hit the same namespace query endpoint with a
//! different `rank_by` mode: ANN over the precomputed embedding vectors for
//! the vector path, BM25 over the profile summaries for the keyword path.

use super::traits::{BackendError, BackendResult, KeywordSearcher, RetrievalHit, VectorSearcher};
use super::check_status;
use crate::config::IndexApiConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const ATTRIBUTES: [&str; 3] = ["id", "name", "summary"];

/// Client for the hosted vector/keyword index
#[derive(Debug)]
pub struct IndexClient {
    client: reqwest::Client,
    query_url: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    rank_by: serde_json::Value,
    top_k: usize,
    include_attributes: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    id: String,
    /// Path-local relevance; absent on older index versions
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl IndexClient {
    pub fn new(config: &IndexApiConfig) -> BackendResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match config.resolve_api_key() {
            Some(key) => {
                let value = format!("Bearer {}", key);
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&value)
                        .map_err(|e| BackendError::Config(format!("Invalid API key format: {}", e)))?,
                );
            }
            None => warn!("No API key configured for index endpoint {}", config.endpoint),
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let query_url = format!(
            "{}/v1/namespaces/{}/query",
            config.endpoint.trim_end_matches('/'),
            config.namespace
        );
        debug!("Index client ready: {}", query_url);

        Ok(Self { client, query_url })
    }

    async fn query(&self, rank_by: serde_json::Value, top_k: usize) -> BackendResult<Vec<RetrievalHit>> {
        let request = QueryRequest {
            rank_by,
            top_k,
            include_attributes: &ATTRIBUTES,
        };

        let response = self.client.post(&self.query_url).json(&request).send().await?;
        let response = check_status(response).await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("index response: {}", e)))?;

        // Rows arrive best-first. When the index omits scores, fall back to
        // reciprocal-rank so downstream normalization still has an ordering
        // to work with.
        let hits = parsed
            .rows
            .into_iter()
            .enumerate()
            .map(|(rank, row)| RetrievalHit {
                score: row.score.unwrap_or(1.0 / (rank as f32 + 1.0)),
                id: row.id,
                name: row.name,
                summary: row.summary,
            })
            .collect();

        Ok(hits)
    }
}

#[async_trait]
impl VectorSearcher for IndexClient {
    async fn vector_search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> BackendResult<Vec<RetrievalHit>> {
        self.query(serde_json::json!(["vector", "ANN", embedding]), top_k)
            .await
    }
}

#[async_trait]
impl KeywordSearcher for IndexClient {
    async fn keyword_search(&self, text: &str, top_k: usize) -> BackendResult<Vec<RetrievalHit>> {
        self.query(serde_json::json!(["summary", "BM25", text]), top_k)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_joins_namespace() {
        let config = IndexApiConfig {
            endpoint: "https://idx.example.com/".to_string(),
            namespace: "candidates".to_string(),
            api_key: Some("k".to_string()),
            timeout_secs: 5,
        };
        let client = IndexClient::new(&config).unwrap();
        assert_eq!(
            client.query_url,
            "https://idx.example.com/v1/namespaces/candidates/query"
        );
    }

    #[test]
    fn test_rows_without_scores_get_reciprocal_rank() {
        let parsed: QueryResponse =
            serde_json::from_str(r#"{"rows":[{"id":"a"},{"id":"b"},{"id":"c"}]}"#).unwrap();
        let hits: Vec<RetrievalHit> = parsed
            .rows
            .into_iter()
            .enumerate()
            .map(|(rank, row)| RetrievalHit {
                score: row.score.unwrap_or(1.0 / (rank as f32 + 1.0)),
                id: row.id,
                name: row.name,
                summary: row.summary,
            })
            .collect();
        assert_eq!(hits[0].score, 1.0);
        assert_eq!(hits[1].score, 0.5);
        assert!(hits[0].score > hits[1].score && hits[1].score > hits[2].score);
    }
}
