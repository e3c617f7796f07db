//! External API endpoint configuration
//!
//! All heavy lifting is delegated to hosted services; these sections hold
//! their endpoints, credentials, and per-request timeouts. API keys can be
//! left out of the file and supplied through environment variables instead.

use serde::{Deserialize, Serialize};

fn default_timeout() -> u64 {
    30
}

/// Hosted search index (vector + keyword paths over the same namespace)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexApiConfig {
    /// Base URL of the index service
    pub endpoint: String,
    /// Namespace holding the candidate records
    pub namespace: String,
    /// API key (optional, falls back to INDEX_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl IndexApiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("INDEX_API_KEY").ok())
    }
}

/// OpenAI-compatible embedding endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingApiConfig {
    /// API endpoint (e.g., "https://api.voyageai.com/v1/embeddings")
    pub endpoint: String,
    /// Model name (e.g., "voyage-3")
    pub model: String,
    /// Embedding dimensions reported by the model
    pub dimensions: usize,
    /// API key (optional, falls back to EMBEDDING_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl EmbeddingApiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("EMBEDDING_API_KEY").ok())
    }
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    500
}

/// Hosted chat-completion model used for query expansion and reranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmApiConfig {
    /// Chat-completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API key (optional, falls back to OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

impl LlmApiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

fn default_grading_timeout() -> u64 {
    // Grading a full submission is slow on the server side
    120
}

/// External grading endpoint (`POST /grade`, `POST /evaluate`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingApiConfig {
    /// Base URL of the grading service
    pub endpoint: String,
    /// Submitter email, sent as the Authorization header
    /// (optional, falls back to SUBMITTER_EMAIL)
    #[serde(default)]
    pub submitter_email: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_grading_timeout")]
    pub timeout_secs: u64,
}

impl GradingApiConfig {
    pub fn resolve_email(&self) -> Option<String> {
        self.submitter_email
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("SUBMITTER_EMAIL").ok().filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_defaults() {
        let config = LlmApiConfig::default();
        assert_eq!(config.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_email_from_config_wins() {
        let config = GradingApiConfig {
            endpoint: "https://grader.example.com".to_string(),
            submitter_email: Some("a@example.com".to_string()),
            timeout_secs: 120,
        };
        assert_eq!(config.resolve_email().as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_empty_email_treated_as_missing() {
        let config = GradingApiConfig {
            endpoint: "https://grader.example.com".to_string(),
            submitter_email: Some(String::new()),
            timeout_secs: 120,
        };
        // Falls through to the env var, which is unset here unless the
        // test environment provides it.
        if std::env::var("SUBMITTER_EMAIL").is_err() {
            assert!(config.resolve_email().is_none());
        }
    }
}
