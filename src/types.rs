//! Core types shared across the search pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque candidate identifier, assigned by the external document store
pub type CandidateId = String;

/// Dense embedding vector
pub type Embedding = Vec<f32>;

/// A candidate profile as returned by the hosted index.
///
/// Records are created during an offline data-load step and never mutated
/// here; we only reference them by id and read their text for filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Opaque identifier
    pub id: CandidateId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free-text profile summary
    #[serde(default)]
    pub summary: String,
}

impl CandidateRecord {
    /// Lowercased text used for keyword-presence checks
    pub fn search_text(&self) -> String {
        format!("{} {}", self.name, self.summary).to_lowercase()
    }
}

/// Which retrieval path produced a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPath {
    Vector,
    Keyword,
}

impl RetrievalPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for RetrievalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search strategy selecting which retrieval paths run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Vector similarity only
    Vector,
    /// Keyword (BM25) relevance only
    Keyword,
    /// Both paths, merged with normalized weighted scores
    Hybrid,
}

impl SearchStrategy {
    pub fn uses_vector(&self) -> bool {
        matches!(self, Self::Vector | Self::Hybrid)
    }

    pub fn uses_keyword(&self) -> bool {
        matches!(self, Self::Keyword | Self::Hybrid)
    }
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::Hybrid
    }
}

/// A candidate with per-path and combined scores, built transiently during merge
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub id: CandidateId,
    /// Best raw vector-similarity score seen, if found by that path
    pub vector_score: Option<f32>,
    /// Best raw keyword-relevance score seen, if found by that path
    pub keyword_score: Option<f32>,
    /// Weighted sum of normalized per-path scores
    pub combined_score: f32,
    /// Paths that found this candidate
    pub matched_by: Vec<RetrievalPath>,
}

/// Wire payload for the grading endpoint:
/// `{"config_candidates": {category: [ids...]}}`
///
/// A `BTreeMap` keeps serialization byte-stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub config_candidates: BTreeMap<String, Vec<CandidateId>>,
}

impl SubmissionPayload {
    /// Insert one category's ranked identifier list, deduplicated (first
    /// occurrence wins, preserving rank order) and truncated to `cap`.
    pub fn insert(&mut self, category: impl Into<String>, ids: Vec<CandidateId>, cap: usize) {
        let mut seen = std::collections::HashSet::new();
        let unique: Vec<CandidateId> = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .take(cap)
            .collect();
        self.config_candidates.insert(category.into(), unique);
    }

    pub fn total_candidates(&self) -> usize {
        self.config_candidates.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.config_candidates.is_empty()
    }
}

/// Per-category evaluation result from the `/evaluate` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationReport {
    #[serde(default)]
    pub average_final_score: f64,
    #[serde(default)]
    pub individual_results: Vec<serde_json::Value>,
    #[serde(default)]
    pub average_soft_scores: Vec<serde_json::Value>,
    #[serde(default)]
    pub average_hard_scores: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_text_is_lowercased() {
        let record = CandidateRecord {
            id: "c1".to_string(),
            name: "Jane Roe".to_string(),
            summary: "Tax Attorney, JD".to_string(),
        };
        assert_eq!(record.search_text(), "jane roe tax attorney, jd");
    }

    #[test]
    fn test_strategy_paths() {
        assert!(SearchStrategy::Hybrid.uses_vector());
        assert!(SearchStrategy::Hybrid.uses_keyword());
        assert!(!SearchStrategy::Vector.uses_keyword());
        assert!(!SearchStrategy::Keyword.uses_vector());
    }

    #[test]
    fn test_submission_payload_caps_and_dedups() {
        let mut payload = SubmissionPayload::default();
        let ids: Vec<CandidateId> = vec!["a", "b", "a", "c", "d"]
            .into_iter()
            .map(String::from)
            .collect();
        payload.insert("tax_lawyer.yml", ids, 3);

        let list = &payload.config_candidates["tax_lawyer.yml"];
        assert_eq!(list, &vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(payload.total_candidates(), 3);
    }

    #[test]
    fn test_submission_payload_wire_shape() {
        let mut payload = SubmissionPayload::default();
        payload.insert("bankers.yml", vec!["x1".to_string(), "x2".to_string()], 10);

        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"config_candidates":{"bankers.yml":["x1","x2"]}}"#);
    }
}
