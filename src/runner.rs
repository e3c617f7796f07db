//! Search orchestration
//!
//! Fans categories out across a bounded worker pool. Each category's task
//! owns its working set (pool, merge buffer) privately; the only shared
//! write is a single insert into the result map after the task joins, so
//! an interrupted run never leaves a category half-published.

use crate::backend::{
    BackendResult, ChatClient, ChatModel, Embedder, HttpEmbedder, IndexClient, KeywordSearcher,
    RetrievalHit, VectorSearcher,
};
use crate::config::{CategoryConfig, Config};
use crate::expand::{expand_query, Expansion};
use crate::retrieval::{
    apply_hard_filter, llm_rerank, merge_pools, HardFilter, MergeWeights, ResultPool,
};
use crate::retry::retry_with_backoff;
use crate::types::{RetrievalPath, ScoredCandidate, SearchStrategy, SubmissionPayload};
use crate::util::truncate_for_display;
use anyhow::Result;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Result of one category's search
#[derive(Debug)]
pub struct CategoryOutcome {
    pub category: String,
    /// Ranked, filtered, capped candidate list
    pub ranked: Vec<ScoredCandidate>,
    /// Distinct candidates pooled from the vector path
    pub pooled_vector: usize,
    /// Distinct candidates pooled from the keyword path
    pub pooled_keyword: usize,
    /// Whether query expansion produced extra variants
    pub expanded: bool,
    pub elapsed_ms: u64,
}

/// Aggregated results of a full run
#[derive(Debug)]
pub struct RunSummary {
    /// Outcomes keyed by category name
    pub outcomes: BTreeMap<String, CategoryOutcome>,
    /// Configured category names, in file order
    pub categories: Vec<String>,
    result_cap: usize,
}

impl RunSummary {
    /// Categories that produced no candidates (total retrieval failure or
    /// a panicked task). Surfaced in the run summary, never a crash.
    pub fn empty_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|name| {
                self.outcomes
                    .get(*name)
                    .map(|o| o.ranked.is_empty())
                    .unwrap_or(true)
            })
            .map(String::as_str)
            .collect()
    }

    /// Build the grading payload. Empty categories are omitted.
    pub fn submission_payload(&self) -> SubmissionPayload {
        let mut payload = SubmissionPayload::default();
        for outcome in self.outcomes.values() {
            if outcome.ranked.is_empty() {
                continue;
            }
            let ids = outcome.ranked.iter().map(|c| c.id.clone()).collect();
            payload.insert(outcome.category.clone(), ids, self.result_cap);
        }
        payload
    }
}

/// Orchestrates retrieval, merge, filtering, and ranking per category
pub struct SearchRunner {
    embedder: Arc<dyn Embedder>,
    vector: Arc<dyn VectorSearcher>,
    keyword: Arc<dyn KeywordSearcher>,
    chat: Option<Arc<dyn ChatModel>>,
    config: Arc<Config>,
}

impl SearchRunner {
    /// Build against the real hosted backends
    pub fn from_config(config: Config) -> Result<Self> {
        let index = Arc::new(IndexClient::new(&config.index)?);
        let embedder = Arc::new(HttpEmbedder::new(config.embedding.clone())?);

        // The chat model is best-effort everywhere it is used, so a client
        // that cannot be built just disables expansion and rerank.
        let chat: Option<Arc<dyn ChatModel>> =
            if config.search.expansion || config.search.llm_rerank {
                match ChatClient::new(config.llm.clone()) {
                    Ok(client) => Some(Arc::new(client)),
                    Err(e) => {
                        warn!("Chat client unavailable, expansion/rerank disabled: {}", e);
                        None
                    }
                }
            } else {
                None
            };

        Ok(Self {
            embedder,
            vector: index.clone(),
            keyword: index,
            chat,
            config: Arc::new(config),
        })
    }

    /// Build from explicit backends (tests inject fakes here)
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector: Arc<dyn VectorSearcher>,
        keyword: Arc<dyn KeywordSearcher>,
        chat: Option<Arc<dyn ChatModel>>,
        config: Config,
    ) -> Self {
        Self {
            embedder,
            vector,
            keyword,
            chat,
            config: Arc::new(config),
        }
    }

    /// Run all configured categories through a bounded worker pool.
    pub async fn run(self: &Arc<Self>, strategy: SearchStrategy) -> RunSummary {
        let workers = self.config.search.workers;
        let categories = self.config.categories.clone();
        info!(
            "Running {} categories with {} workers ({:?} strategy)",
            categories.len(),
            workers,
            strategy
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut join_set = JoinSet::new();

        for category in categories.iter().cloned() {
            let runner = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // Never closed while tasks are running; if it somehow is,
                // run unthrottled rather than dropping the category.
                let _permit = semaphore.acquire_owned().await.ok();
                runner.search_category(&category, strategy).await
            });
        }

        let mut outcomes = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    info!(
                        "{}: {} candidates ({} vector / {} keyword pooled) in {}ms",
                        outcome.category,
                        outcome.ranked.len(),
                        outcome.pooled_vector,
                        outcome.pooled_keyword,
                        outcome.elapsed_ms
                    );
                    outcomes.insert(outcome.category.clone(), outcome);
                }
                Err(e) => warn!("Category task failed: {}", e),
            }
        }

        let summary = RunSummary {
            outcomes,
            categories: categories.into_iter().map(|c| c.name).collect(),
            result_cap: self.config.search.result_cap,
        };

        let empty = summary.empty_categories();
        if !empty.is_empty() {
            warn!("Categories with no results: {}", empty.join(", "));
        }
        summary
    }

    /// Search one category: expand, fan out both paths across all query
    /// variants, pool, merge, filter, truncate, optionally rerank.
    pub async fn search_category(
        &self,
        category: &CategoryConfig,
        strategy: SearchStrategy,
    ) -> CategoryOutcome {
        let start = Instant::now();
        let search = &self.config.search;
        let policy = search.retry.policy();

        let expansion = match (&self.chat, search.expansion) {
            (Some(chat), true) => {
                expand_query(
                    chat.as_ref(),
                    &policy,
                    &category.name,
                    &category.query,
                    search.expansion_count,
                )
                .await
            }
            _ => Expansion::Fallback(category.query.clone()),
        };
        let variants = expansion.texts();

        let mut pool = ResultPool::new();

        if strategy.uses_vector() {
            let futures = variants
                .iter()
                .map(|text| self.vector_variant(text, search.pool_size, &policy));
            for (text, result) in variants.iter().zip(join_all(futures).await) {
                match result {
                    Ok(hits) => pool.add_hits(RetrievalPath::Vector, hits),
                    Err(e) => warn!(
                        "Vector path failed for '{}' ({}): {}",
                        truncate_for_display(text, 60),
                        category.name,
                        e
                    ),
                }
            }
        }

        if strategy.uses_keyword() {
            // Configured keyword terms ride along with the expanded variants
            let mut texts: Vec<String> = variants.clone();
            for keyword in category.keyword_texts() {
                if !texts.contains(&keyword) {
                    texts.push(keyword);
                }
            }

            let futures = texts.iter().map(|text| {
                retry_with_backoff(&policy, "keyword search", || {
                    self.keyword.keyword_search(text, search.pool_size)
                })
            });
            for (text, result) in texts.iter().zip(join_all(futures).await) {
                match result {
                    Ok(hits) => pool.add_hits(RetrievalPath::Keyword, hits),
                    Err(e) => warn!(
                        "Keyword path failed for '{}' ({}): {}",
                        truncate_for_display(text, 60),
                        category.name,
                        e
                    ),
                }
            }
        }

        if pool.is_empty() {
            warn!("No results from any path for '{}'", category.name);
            return CategoryOutcome {
                category: category.name.clone(),
                ranked: Vec::new(),
                pooled_vector: 0,
                pooled_keyword: 0,
                expanded: expansion.is_expanded(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            };
        }

        let weights = MergeWeights {
            vector: search.vector_weight,
            keyword: search.keyword_weight,
        };
        let mut ranked = merge_pools(&pool, weights);

        if search.hard_filters {
            let filter = HardFilter::from_category(category);
            ranked = apply_hard_filter(ranked, pool.records(), &filter);
        }

        ranked.truncate(search.result_cap);

        if search.llm_rerank {
            if let Some(chat) = &self.chat {
                llm_rerank(chat.as_ref(), &policy, &category.name, &mut ranked, pool.records())
                    .await;
            }
        }

        debug!(
            "'{}': merged {} vector + {} keyword pooled candidates into {}",
            category.name,
            pool.vector_len(),
            pool.keyword_len(),
            ranked.len()
        );

        CategoryOutcome {
            category: category.name.clone(),
            pooled_vector: pool.vector_len(),
            pooled_keyword: pool.keyword_len(),
            expanded: expansion.is_expanded(),
            elapsed_ms: start.elapsed().as_millis() as u64,
            ranked,
        }
    }

    /// One vector-path call: embed the variant, then nearest-neighbor
    /// lookup. Both legs go through the shared retry policy.
    async fn vector_variant(
        &self,
        text: &str,
        top_k: usize,
        policy: &crate::retry::BackoffPolicy,
    ) -> BackendResult<Vec<RetrievalHit>> {
        let embedding =
            retry_with_backoff(policy, "embedding", || self.embedder.embed(text)).await?;
        retry_with_backoff(policy, "vector search", || {
            self.vector.vector_search(&embedding, top_k)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(category: &str, ids: &[&str]) -> CategoryOutcome {
        CategoryOutcome {
            category: category.to_string(),
            ranked: ids
                .iter()
                .map(|id| ScoredCandidate {
                    id: id.to_string(),
                    vector_score: None,
                    keyword_score: None,
                    combined_score: 0.0,
                    matched_by: vec![],
                })
                .collect(),
            pooled_vector: ids.len(),
            pooled_keyword: 0,
            expanded: false,
            elapsed_ms: 1,
        }
    }

    #[test]
    fn test_summary_omits_empty_categories_from_payload() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert("a.yml".to_string(), outcome("a.yml", &["x", "y"]));
        outcomes.insert("b.yml".to_string(), outcome("b.yml", &[]));

        let summary = RunSummary {
            outcomes,
            categories: vec!["a.yml".to_string(), "b.yml".to_string(), "c.yml".to_string()],
            result_cap: 10,
        };

        let payload = summary.submission_payload();
        assert_eq!(payload.config_candidates.len(), 1);
        assert!(payload.config_candidates.contains_key("a.yml"));

        // b.yml ran empty, c.yml never joined
        assert_eq!(summary.empty_categories(), vec!["b.yml", "c.yml"]);
    }

    #[test]
    fn test_payload_respects_cap() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert("a.yml".to_string(), outcome("a.yml", &["1", "2", "3", "4"]));

        let summary = RunSummary {
            outcomes,
            categories: vec!["a.yml".to_string()],
            result_cap: 2,
        };
        let payload = summary.submission_payload();
        assert_eq!(payload.config_candidates["a.yml"].len(), 2);
    }
}
