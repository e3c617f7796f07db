//! Score normalization and weighted merge
//!
//! Vector similarity and BM25 relevance live on unrelated scales, so each
//! path is min-max normalized over its own pooled set before the weighted
//! combination. Combining the raw scores directly is a correctness bug, not
//! a tuning choice.

use super::pool::ResultPool;
use crate::types::{CandidateId, RetrievalPath, ScoredCandidate};
use std::collections::HashMap;

/// Merge weights; must sum to 1.0 (validated at config load)
#[derive(Debug, Clone, Copy)]
pub struct MergeWeights {
    pub vector: f32,
    pub keyword: f32,
}

impl Default for MergeWeights {
    fn default() -> Self {
        Self {
            vector: 0.6,
            keyword: 0.4,
        }
    }
}

/// Min-max normalize a pooled score set into [0, 1].
///
/// A single-element set (or one where all scores are equal) maps to the
/// constant 1.0 rather than dividing by a zero range.
pub fn min_max_normalize(scores: &HashMap<CandidateId, f32>) -> HashMap<CandidateId, f32> {
    if scores.is_empty() {
        return HashMap::new();
    }

    let min = scores.values().copied().fold(f32::MAX, f32::min);
    let max = scores.values().copied().fold(f32::MIN, f32::max);
    let range = max - min;

    scores
        .iter()
        .map(|(id, &score)| {
            let normalized = if range > 0.0 { (score - min) / range } else { 1.0 };
            (id.clone(), normalized)
        })
        .collect()
}

/// Merge both paths' pooled results into one ranked list.
///
/// A candidate found by only one path contributes 0 for the missing path.
/// Output is sorted descending by combined score; exact ties break by
/// identifier ascending so repeated runs produce byte-identical output.
/// Truncation to the result cap happens after filtering, in the caller.
pub fn merge_pools(pool: &ResultPool, weights: MergeWeights) -> Vec<ScoredCandidate> {
    let vector_norm = min_max_normalize(pool.vector_scores());
    let keyword_norm = min_max_normalize(pool.keyword_scores());

    let mut ids: Vec<&CandidateId> = pool
        .vector_scores()
        .keys()
        .chain(pool.keyword_scores().keys())
        .collect();
    ids.sort();
    ids.dedup();

    let mut merged: Vec<ScoredCandidate> = ids
        .into_iter()
        .map(|id| {
            let vector_score = pool.vector_scores().get(id).copied();
            let keyword_score = pool.keyword_scores().get(id).copied();

            let nv = vector_norm.get(id).copied().unwrap_or(0.0);
            let nk = keyword_norm.get(id).copied().unwrap_or(0.0);

            let mut matched_by = Vec::with_capacity(2);
            if vector_score.is_some() {
                matched_by.push(RetrievalPath::Vector);
            }
            if keyword_score.is_some() {
                matched_by.push(RetrievalPath::Keyword);
            }

            ScoredCandidate {
                id: id.clone(),
                vector_score,
                keyword_score,
                combined_score: weights.vector * nv + weights.keyword * nk,
                matched_by,
            }
        })
        .collect();

    merged.sort_by(|a, b| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| a.id.cmp(&b.id))
    });

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RetrievalHit;

    fn hit(id: &str, score: f32) -> RetrievalHit {
        RetrievalHit {
            id: id.to_string(),
            score,
            name: None,
            summary: None,
        }
    }

    fn pool_from(vector: &[(&str, f32)], keyword: &[(&str, f32)]) -> ResultPool {
        let mut pool = ResultPool::new();
        pool.add_hits(
            RetrievalPath::Vector,
            vector.iter().map(|(id, s)| hit(id, *s)).collect(),
        );
        pool.add_hits(
            RetrievalPath::Keyword,
            keyword.iter().map(|(id, s)| hit(id, *s)).collect(),
        );
        pool
    }

    #[test]
    fn test_normalized_scores_in_unit_range() {
        let pool = pool_from(&[("a", 12.0), ("b", -3.0), ("c", 4.5)], &[]);
        let normalized = min_max_normalize(pool.vector_scores());
        for value in normalized.values() {
            assert!((0.0..=1.0).contains(value));
        }
        assert_eq!(normalized["a"], 1.0);
        assert_eq!(normalized["b"], 0.0);
    }

    #[test]
    fn test_singleton_normalizes_to_constant() {
        let pool = pool_from(&[("only", 0.37)], &[]);
        let normalized = min_max_normalize(pool.vector_scores());
        assert_eq!(normalized["only"], 1.0);
    }

    #[test]
    fn test_equal_scores_normalize_to_constant() {
        let pool = pool_from(&[("a", 2.0), ("b", 2.0)], &[]);
        let normalized = min_max_normalize(pool.vector_scores());
        assert_eq!(normalized["a"], 1.0);
        assert_eq!(normalized["b"], 1.0);
    }

    #[test]
    fn test_spec_scenario_merge_order() {
        // vector [(A,0.9),(B,0.5),(C,0.1)], keyword [(B,0.8),(C,0.6)],
        // weights 0.6/0.4:
        //   vector norms:  A=1.0, B=0.5, C=0.0
        //   keyword norms: B=1.0, C=0.0
        //   combined: A=0.6, B=0.3+0.4=0.7, C=0.0
        let pool = pool_from(&[("A", 0.9), ("B", 0.5), ("C", 0.1)], &[("B", 0.8), ("C", 0.6)]);
        let mut merged = merge_pools(&pool, MergeWeights::default());

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].id, "B");
        assert!((merged[0].combined_score - 0.7).abs() < 1e-6);
        assert_eq!(merged[1].id, "A");
        assert!((merged[1].combined_score - 0.6).abs() < 1e-6);
        assert_eq!(merged[2].id, "C");
        assert!(merged[2].combined_score.abs() < 1e-6);

        merged.truncate(2);
        let top: Vec<&str> = merged.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(top, vec!["B", "A"]);
    }

    #[test]
    fn test_single_path_candidate_uses_zero_for_missing_term() {
        let pool = pool_from(&[("a", 1.0), ("b", 0.0)], &[]);
        let merged = merge_pools(&pool, MergeWeights::default());
        let a = merged.iter().find(|c| c.id == "a").unwrap();
        assert!(a.keyword_score.is_none());
        assert_eq!(a.matched_by, vec![RetrievalPath::Vector]);
        // keyword term contributes exactly zero
        assert!((a.combined_score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_exact_ties_break_by_id_ascending() {
        // Both score 1.0 on their own path, so combined is weight-equal
        // only if weights are equal; use 0.5/0.5 to force the collision.
        let pool = pool_from(&[("zeta", 1.0)], &[("alpha", 1.0)]);
        let weights = MergeWeights {
            vector: 0.5,
            keyword: 0.5,
        };
        let merged = merge_pools(&pool, weights);
        assert_eq!(merged[0].combined_score, merged[1].combined_score);
        assert_eq!(merged[0].id, "alpha");
        assert_eq!(merged[1].id, "zeta");
    }

    #[test]
    fn test_merge_is_deterministic() {
        let pool = pool_from(
            &[("a", 0.8), ("b", 0.8), ("c", 0.2)],
            &[("c", 1.0), ("d", 1.0)],
        );
        let first = merge_pools(&pool, MergeWeights::default());
        let second = merge_pools(&pool, MergeWeights::default());
        let first_ids: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
        let second_ids: Vec<&str> = second.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_no_duplicate_ids_in_output() {
        let pool = pool_from(&[("a", 0.9), ("b", 0.4)], &[("a", 2.0), ("b", 1.0)]);
        let merged = merge_pools(&pool, MergeWeights::default());
        assert_eq!(merged.len(), 2);
        let a = merged.iter().find(|c| c.id == "a").unwrap();
        assert_eq!(
            a.matched_by,
            vec![RetrievalPath::Vector, RetrievalPath::Keyword]
        );
    }
}
