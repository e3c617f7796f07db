//! Hard keyword filtering
//!
//! Drops candidates whose profile text is missing a required term or
//! contains an excluded term. This is literal, case-insensitive substring
//! matching and nothing more: it can detect that "JD" appears in a summary,
//! not verify that anyone holds the degree. That limitation is part of the
//! contract and must not be "fixed" into something stronger.

use crate::config::CategoryConfig;
use crate::types::{CandidateId, CandidateRecord, ScoredCandidate};
use std::collections::HashMap;
use tracing::debug;

/// Required/excluded terms for one category, lowercased at construction
#[derive(Debug, Clone, Default)]
pub struct HardFilter {
    required: Vec<String>,
    excluded: Vec<String>,
}

impl HardFilter {
    pub fn new(required: &[String], excluded: &[String]) -> Self {
        Self {
            required: required.iter().map(|t| t.to_lowercase()).collect(),
            excluded: excluded.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn from_category(category: &CategoryConfig) -> Self {
        Self::new(&category.required, &category.excluded)
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.excluded.is_empty()
    }

    /// Whether a profile passes. A candidate with no profile text fails any
    /// required term and passes exclusions, consistent with matching
    /// against empty text.
    pub fn passes(&self, record: Option<&CandidateRecord>) -> bool {
        let text = record.map(|r| r.search_text()).unwrap_or_default();

        self.required.iter().all(|term| text.contains(term))
            && !self.excluded.iter().any(|term| text.contains(term))
    }
}

/// Apply the filter to a ranked list. Pure filter: relative order of the
/// survivors is untouched. Runs before truncation.
pub fn apply_hard_filter(
    ranked: Vec<ScoredCandidate>,
    records: &HashMap<CandidateId, CandidateRecord>,
    filter: &HardFilter,
) -> Vec<ScoredCandidate> {
    if filter.is_empty() {
        return ranked;
    }

    let before = ranked.len();
    let kept: Vec<ScoredCandidate> = ranked
        .into_iter()
        .filter(|candidate| filter.passes(records.get(&candidate.id)))
        .collect();

    if kept.len() < before {
        debug!("Hard filter kept {} of {} candidates", kept.len(), before);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, summary: &str) -> CandidateRecord {
        CandidateRecord {
            id: id.to_string(),
            name: String::new(),
            summary: summary.to_string(),
        }
    }

    fn scored(id: &str, combined: f32) -> ScoredCandidate {
        ScoredCandidate {
            id: id.to_string(),
            vector_score: Some(combined),
            keyword_score: None,
            combined_score: combined,
            matched_by: vec![],
        }
    }

    fn records(entries: &[(&str, &str)]) -> HashMap<CandidateId, CandidateRecord> {
        entries
            .iter()
            .map(|(id, summary)| (id.to_string(), record(id, summary)))
            .collect()
    }

    #[test]
    fn test_missing_required_term_excludes_top_candidate() {
        let filter = HardFilter::new(&["jd".to_string()], &[]);
        let records = records(&[
            ("top", "corporate associate, strong M&A record"),
            ("second", "tax attorney, JD, big law"),
        ]);

        let ranked = vec![scored("top", 0.99), scored("second", 0.5)];
        let kept = apply_hard_filter(ranked, &records, &filter);

        // Rank does not save a candidate that fails the filter
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "second");
    }

    #[test]
    fn test_excluded_term_removes_regardless_of_score() {
        let filter = HardFilter::new(&[], &["paralegal".to_string()]);
        let records = records(&[
            ("a", "senior paralegal, 10 years"),
            ("b", "tax attorney"),
        ]);

        let kept = apply_hard_filter(vec![scored("a", 1.0), scored("b", 0.1)], &records, &filter);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "b");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let filter = HardFilter::new(&["MD".to_string()], &[]);
        let records = records(&[("a", "physician, md, internal medicine")]);
        assert!(filter.passes(records.get("a")));
    }

    #[test]
    fn test_filter_preserves_order() {
        let filter = HardFilter::new(&["tax".to_string()], &[]);
        let records = records(&[
            ("a", "tax partner"),
            ("b", "litigation"),
            ("c", "tax associate"),
            ("d", "tax counsel"),
        ]);

        let ranked = vec![scored("a", 0.9), scored("b", 0.8), scored("c", 0.7), scored("d", 0.6)];
        let kept = apply_hard_filter(ranked, &records, &filter);
        let ids: Vec<&str> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_missing_record_fails_required_terms() {
        let filter = HardFilter::new(&["jd".to_string()], &[]);
        assert!(!filter.passes(None));

        let exclusions_only = HardFilter::new(&[], &["intern".to_string()]);
        assert!(exclusions_only.passes(None));
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let filter = HardFilter::default();
        let ranked = vec![scored("a", 0.9), scored("b", 0.8)];
        let kept = apply_hard_filter(ranked.clone(), &HashMap::new(), &filter);
        assert_eq!(kept.len(), ranked.len());
    }
}
