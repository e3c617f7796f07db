//! Search tuning configuration

use crate::types::SearchStrategy;
use serde::{Deserialize, Serialize};

fn default_vector_weight() -> f32 {
    0.6
}

fn default_keyword_weight() -> f32 {
    0.4
}

fn default_result_cap() -> usize {
    10
}

fn default_pool_size() -> usize {
    50
}

fn default_workers() -> usize {
    4
}

fn default_expansion_count() -> usize {
    3
}

fn default_true() -> bool {
    true
}

/// Retry policy for external calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Multiplier applied after each failed attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Upper bound on any single delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> crate::retry::BackoffPolicy {
        crate::retry::BackoffPolicy {
            max_attempts: self.max_attempts,
            base_delay: std::time::Duration::from_millis(self.base_delay_ms),
            backoff_factor: self.backoff_factor,
            max_delay: std::time::Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Search configuration
///
/// The vector/keyword weights are deliberately tunable rather than fixed:
/// there is no single canonical weighting, only a vector-leaning default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Weight of the normalized vector-similarity score
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,
    /// Weight of the normalized keyword-relevance score
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,
    /// Final identifiers kept per category
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,
    /// Results requested from each retrieval path per query variant
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Bounded worker pool size for concurrent categories
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Default strategy when none is given on the command line
    #[serde(default)]
    pub strategy: SearchStrategy,
    /// Expand the base query into paraphrases via the language model
    #[serde(default = "default_true")]
    pub expansion: bool,
    /// Paraphrases requested per category (the base query is always kept)
    #[serde(default = "default_expansion_count")]
    pub expansion_count: usize,
    /// Apply required/excluded keyword filters before truncation
    #[serde(default = "default_true")]
    pub hard_filters: bool,
    /// Rerank the final list with the language model (best-effort)
    #[serde(default)]
    pub llm_rerank: bool,
    /// Retry policy for all external calls
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_weight: default_vector_weight(),
            keyword_weight: default_keyword_weight(),
            result_cap: default_result_cap(),
            pool_size: default_pool_size(),
            workers: default_workers(),
            strategy: SearchStrategy::default(),
            expansion: true,
            expansion_count: default_expansion_count(),
            hard_filters: true,
            llm_rerank: false,
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let config = SearchConfig::default();
        assert!((config.vector_weight + config.keyword_weight - 1.0).abs() < 1e-6);
        assert!(config.vector_weight > config.keyword_weight);
    }

    #[test]
    fn test_retry_config_to_policy() {
        let retry = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 250,
            backoff_factor: 3.0,
            max_delay_ms: 10_000,
        };
        let policy = retry.policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, std::time::Duration::from_millis(250));
        assert_eq!(policy.max_delay, std::time::Duration::from_secs(10));
    }
}
