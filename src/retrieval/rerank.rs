//! Optional LLM reranking of the final list
//!
//! Best-effort, like expansion: the model is asked to reorder the capped
//! list, and any failure (or nonsense output) leaves the merged order
//! untouched. Ids the model invents are ignored; ids it omits keep their
//! prior relative order at the tail.

use crate::backend::{parse_string_array, ChatModel};
use crate::retry::{retry_with_backoff, BackoffPolicy};
use crate::types::{CandidateId, CandidateRecord, ScoredCandidate};
use crate::util::truncate_for_display;
use std::collections::HashMap;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a recruiting assistant. Given a job category \
and candidate profiles, order the candidate ids from best fit to worst fit. \
Respond with a JSON array of candidate id strings and nothing else.";

/// Reorder `ranked` in place according to the model's preference.
pub async fn llm_rerank(
    model: &dyn ChatModel,
    policy: &BackoffPolicy,
    category: &str,
    ranked: &mut Vec<ScoredCandidate>,
    records: &HashMap<CandidateId, CandidateRecord>,
) {
    if ranked.len() < 2 {
        return;
    }

    let profiles: Vec<String> = ranked
        .iter()
        .map(|candidate| {
            let summary = records
                .get(&candidate.id)
                .map(|r| truncate_for_display(&r.summary, 300))
                .unwrap_or_default();
            format!("- id: {}\n  profile: {}", candidate.id, summary)
        })
        .collect();

    let user = format!(
        "Job category: {}\nCandidates:\n{}",
        category,
        profiles.join("\n")
    );

    let completion = retry_with_backoff(policy, "llm rerank", || {
        model.complete(SYSTEM_PROMPT, &user)
    })
    .await;

    let text = match completion {
        Ok(text) => text,
        Err(e) => {
            warn!("Rerank failed for '{}': {}. Keeping merged order", category, e);
            return;
        }
    };

    let Some(order) = parse_string_array(&text) else {
        warn!("Rerank for '{}' returned unparseable text. Keeping merged order", category);
        return;
    };

    apply_order(ranked, &order);
    debug!("Reranked {} candidates for '{}'", ranked.len(), category);
}

/// Reorder `ranked` so ids listed in `order` come first, in that order.
/// Unknown ids in `order` are skipped; unlisted candidates keep their prior
/// relative order at the end. Length and membership never change.
pub fn apply_order(ranked: &mut Vec<ScoredCandidate>, order: &[String]) {
    let mut remaining: Vec<ScoredCandidate> = std::mem::take(ranked);
    let mut reordered: Vec<ScoredCandidate> = Vec::with_capacity(remaining.len());

    for id in order {
        if let Some(pos) = remaining.iter().position(|c| &c.id == id) {
            reordered.push(remaining.remove(pos));
        }
    }
    reordered.append(&mut remaining);

    *ranked = reordered;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str) -> ScoredCandidate {
        ScoredCandidate {
            id: id.to_string(),
            vector_score: None,
            keyword_score: None,
            combined_score: 0.0,
            matched_by: vec![],
        }
    }

    fn ids(ranked: &[ScoredCandidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_apply_order_reorders() {
        let mut ranked = vec![scored("a"), scored("b"), scored("c")];
        apply_order(&mut ranked, &["c".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(ids(&ranked), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_unknown_ids_ignored_missing_ids_appended() {
        let mut ranked = vec![scored("a"), scored("b"), scored("c")];
        apply_order(&mut ranked, &["ghost".to_string(), "b".to_string()]);
        // "b" promoted, "a" and "c" keep their relative order behind it
        assert_eq!(ids(&ranked), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_membership_is_preserved() {
        let mut ranked = vec![scored("a"), scored("b")];
        apply_order(&mut ranked, &["b".to_string(), "b".to_string()]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ids(&ranked), vec!["b", "a"]);
    }
}
