//! Query expansion via the hosted language model
//!
//! Best-effort by contract: any failure (timeout, rate limit, malformed
//! response) degrades to the original query text. Callers never see an
//! error from this module.

use crate::backend::{parse_string_array, ChatModel};
use crate::retry::{retry_with_backoff, BackoffPolicy};
use crate::util::truncate_for_display;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a recruiting search assistant. Given a job \
category and a base search query, produce paraphrased search queries that would \
surface strong candidates a literal match might miss. Respond with a JSON array \
of strings and nothing else.";

/// Outcome of an expansion attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// Model produced paraphrases; base text first, variants after
    Expanded(Vec<String>),
    /// Model unavailable or unusable; only the base text
    Fallback(String),
}

impl Expansion {
    /// Query texts to dispatch, base text always first
    pub fn texts(&self) -> Vec<String> {
        match self {
            Self::Expanded(texts) => texts.clone(),
            Self::Fallback(text) => vec![text.clone()],
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, Self::Expanded(_))
    }
}

/// Expand `base` into up to `count` paraphrases for `category`.
pub async fn expand_query(
    model: &dyn ChatModel,
    policy: &BackoffPolicy,
    category: &str,
    base: &str,
    count: usize,
) -> Expansion {
    let user = format!(
        "Job category: {}\nBase query: {}\nReturn {} paraphrased queries.",
        category, base, count
    );

    let completion = retry_with_backoff(policy, "query expansion", || {
        model.complete(SYSTEM_PROMPT, &user)
    })
    .await;

    let text = match completion {
        Ok(text) => text,
        Err(e) => {
            warn!("Query expansion failed for '{}': {}. Using base query", category, e);
            return Expansion::Fallback(base.to_string());
        }
    };

    let Some(variants) = parse_string_array(&text) else {
        warn!(
            "Query expansion for '{}' returned unparseable text: {}. Using base query",
            category,
            truncate_for_display(&text, 120)
        );
        return Expansion::Fallback(base.to_string());
    };

    let mut texts = vec![base.to_string()];
    for variant in variants {
        let variant = variant.trim().to_string();
        if variant.is_empty() || texts.contains(&variant) {
            continue;
        }
        texts.push(variant);
        if texts.len() > count {
            break;
        }
    }

    if texts.len() == 1 {
        return Expansion::Fallback(base.to_string());
    }

    debug!("Expanded '{}' into {} query variants", category, texts.len());
    Expansion::Expanded(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendResult};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedModel(BackendResult<String>);

    #[async_trait]
    impl crate::backend::ChatModel for FixedModel {
        async fn complete(&self, _system: &str, _user: &str) -> BackendResult<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(BackendError::Malformed("boom".to_string())),
            }
        }
    }

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_expansion_keeps_base_first_and_dedups() {
        let model = FixedModel(Ok(
            r#"["tax counsel big law", "tax attorney JD", "tax counsel big law"]"#.to_string(),
        ));
        let expansion = expand_query(&model, &policy(), "tax_lawyer.yml", "tax attorney JD", 3).await;

        let texts = expansion.texts();
        assert!(expansion.is_expanded());
        assert_eq!(texts[0], "tax attorney JD");
        // "tax attorney JD" variant collides with the base, duplicate dropped
        assert_eq!(texts.len(), 2);
    }

    #[tokio::test]
    async fn test_model_error_falls_back() {
        let model = FixedModel(Err(BackendError::Malformed("x".to_string())));
        let expansion = expand_query(&model, &policy(), "cat", "base query", 3).await;
        assert_eq!(expansion, Expansion::Fallback("base query".to_string()));
        assert_eq!(expansion.texts(), vec!["base query"]);
    }

    #[tokio::test]
    async fn test_unparseable_response_falls_back() {
        let model = FixedModel(Ok("I cannot help with that.".to_string()));
        let expansion = expand_query(&model, &policy(), "cat", "base query", 3).await;
        assert!(!expansion.is_expanded());
    }

    #[tokio::test]
    async fn test_variant_count_is_bounded() {
        let model = FixedModel(Ok(r#"["a","b","c","d","e","f"]"#.to_string()));
        let expansion = expand_query(&model, &policy(), "cat", "base", 2).await;
        // base + at most 2 paraphrases
        assert_eq!(expansion.texts().len(), 3);
    }
}
