//! Chat-completion client
//!
//! Used for query expansion and optional reranking. Callers treat every
//! failure as best-effort; nothing in the pipeline depends on this client
//! succeeding.

use super::traits::{BackendError, BackendResult, ChatModel};
use super::check_status;
use crate::config::LlmApiConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for an OpenAI-compatible chat-completions endpoint
#[derive(Debug)]
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmApiConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl ChatClient {
    pub fn new(config: LlmApiConfig) -> BackendResult<Self> {
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
            None => warn!("No API key configured for LLM endpoint {}", config.endpoint),
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to build HTTP client: {}", e)))?;

        debug!("Chat client ready: model={}", config.model);
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn complete(&self, system: &str, user: &str) -> BackendResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message { role: "system", content: system },
                Message { role: "user", content: user },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("chat response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| BackendError::Malformed("no completion returned".to_string()))
    }
}

/// Parse a completion that should contain a JSON array of strings.
///
/// Models frequently wrap JSON in markdown fences; strip those before
/// parsing. Returns None when no array can be recovered.
pub fn parse_string_array(text: &str) -> Option<Vec<String>> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(items) => Some(items),
        Err(_) => {
            // Last resort: find the first bracketed span
            let start = trimmed.find('[')?;
            let end = trimmed.rfind(']')?;
            serde_json::from_str::<Vec<String>>(&trimmed[start..=end]).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let parsed = parse_string_array(r#"["alpha", "beta"]"#).unwrap();
        assert_eq!(parsed, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_parse_fenced_array() {
        let text = "```json\n[\"one\", \"two\", \"three\"]\n```";
        let parsed = parse_string_array(text).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_parse_array_embedded_in_prose() {
        let text = "Here are the queries:\n[\"q1\", \"q2\"]\nHope that helps!";
        let parsed = parse_string_array(text).unwrap();
        assert_eq!(parsed, vec!["q1", "q2"]);
    }

    #[test]
    fn test_parse_garbage_returns_none() {
        assert!(parse_string_array("not json at all").is_none());
        assert!(parse_string_array("{\"a\": 1}").is_none());
    }
}
