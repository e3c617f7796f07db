//! Configuration for scout
//!
//! Loaded once at startup into an immutable object that is passed to each
//! component at construction. There is no ambient global configuration;
//! environment variables are consulted only as documented credential
//! fallbacks when clients are built.

mod api;
mod category;
mod search;

pub use api::{EmbeddingApiConfig, GradingApiConfig, IndexApiConfig, LlmApiConfig};
pub use category::CategoryConfig;
pub use search::{RetryConfig, SearchConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// Log output format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Log verbosity floor; unknown values are rejected at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level when no -v flag is given
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn tracing_level(&self) -> tracing::Level {
        match self.level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hosted search index
    pub index: IndexApiConfig,
    /// Embedding provider
    pub embedding: EmbeddingApiConfig,
    /// Chat-completion model (expansion, rerank)
    #[serde(default)]
    pub llm: LlmApiConfig,
    /// Grading endpoint
    pub grading: GradingApiConfig,
    /// Search tuning
    #[serde(default)]
    pub search: SearchConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Job categories to evaluate
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        for (what, endpoint) in [
            ("index", &self.index.endpoint),
            ("embedding", &self.embedding.endpoint),
            ("llm", &self.llm.endpoint),
            ("grading", &self.grading.endpoint),
        ] {
            if Url::parse(endpoint).is_err() {
                errors.push(format!("{} endpoint is not a valid URL: '{}'", what, endpoint));
            }
        }

        if self.index.namespace.is_empty() {
            errors.push("index namespace must not be empty".to_string());
        }
        if self.embedding.dimensions == 0 {
            errors.push("embedding dimensions must be positive".to_string());
        }

        let search = &self.search;
        if !(0.0..=1.0).contains(&search.vector_weight)
            || !(0.0..=1.0).contains(&search.keyword_weight)
        {
            errors.push("search weights must be between 0.0 and 1.0".to_string());
        }
        if (search.vector_weight + search.keyword_weight - 1.0).abs() > 1e-6 {
            errors.push(format!(
                "vector_weight + keyword_weight must equal 1.0, got {}",
                search.vector_weight + search.keyword_weight
            ));
        }
        if search.result_cap == 0 {
            errors.push("result_cap must be positive".to_string());
        }
        if search.pool_size < search.result_cap {
            errors.push(format!(
                "pool_size ({}) must be at least result_cap ({})",
                search.pool_size, search.result_cap
            ));
        }
        if search.workers == 0 {
            errors.push("workers must be positive".to_string());
        }
        if search.expansion_count == 0 || search.expansion_count > 8 {
            errors.push("expansion_count must be between 1 and 8".to_string());
        }
        if search.retry.max_attempts == 0 {
            errors.push("retry max_attempts must be positive".to_string());
        }
        if search.retry.backoff_factor < 1.0 {
            errors.push("retry backoff_factor must be at least 1.0".to_string());
        }

        if self.categories.is_empty() {
            errors.push("at least one category must be configured".to_string());
        }
        let mut names = HashSet::new();
        for category in &self.categories {
            if category.name.is_empty() {
                errors.push("category name must not be empty".to_string());
            }
            if category.query.is_empty() {
                errors.push(format!("category '{}' has an empty query", category.name));
            }
            if !names.insert(category.name.as_str()) {
                errors.push(format!("duplicate category name '{}'", category.name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "))
        }
    }

    /// TOML template written by `scout init`
    pub fn template() -> String {
        let config = Config {
            index: IndexApiConfig {
                endpoint: "https://api.example-index.com".to_string(),
                namespace: "candidates".to_string(),
                api_key: None,
                timeout_secs: 30,
            },
            embedding: EmbeddingApiConfig {
                endpoint: "https://api.voyageai.com/v1/embeddings".to_string(),
                model: "voyage-3".to_string(),
                dimensions: 1024,
                api_key: None,
                timeout_secs: 30,
            },
            llm: LlmApiConfig::default(),
            grading: GradingApiConfig {
                endpoint: "https://grader.example.com".to_string(),
                submitter_email: None,
                timeout_secs: 120,
            },
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
            categories: vec![CategoryConfig {
                name: "tax_lawyer.yml".to_string(),
                query: "tax attorney JD top law school tax controversy".to_string(),
                keywords: vec!["tax attorney".to_string(), "JD".to_string()],
                required: vec!["tax".to_string()],
                excluded: vec![],
            }],
        };
        // Serializing a valid default cannot fail
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
