//! HTTP embedding client for OpenAI-compatible APIs
//!
//! Works against any endpoint speaking the `/v1/embeddings` shape
//! (OpenAI, Voyage, Azure, text-embeddings-inference).

use super::traits::{BackendError, BackendResult, Embedder};
use super::check_status;
use crate::config::EmbeddingApiConfig;
use crate::types::Embedding;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Embedding client over an OpenAI-compatible endpoint
#[derive(Debug)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbeddingApiConfig,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingApiConfig) -> BackendResult<Self> {
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
            None => warn!("No API key configured for embedding endpoint {}", config.endpoint),
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            "Embedding client ready: endpoint={}, model={}, {} dimensions",
            config.endpoint, config.model, config.dimensions
        );

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> BackendResult<Embedding> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("embedding response: {}", e)))?;

        parsed.data.sort_by_key(|d| d.index);
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| BackendError::Malformed("no embedding returned".to_string()))?;

        if embedding.len() != self.config.dimensions {
            return Err(BackendError::Malformed(format!(
                "expected {} dimensions, got {}",
                self.config.dimensions,
                embedding.len()
            )));
        }

        Ok(normalize(&embedding))
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

/// Normalize an embedding vector to unit length
fn normalize(embedding: &Embedding) -> Embedding {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        embedding.iter().map(|x| x / norm).collect()
    } else {
        embedding.clone()
    }
}
