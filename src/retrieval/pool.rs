//! Pooling of retrieval results across query variants
//!
//! A candidate may be found by several query variants and by both paths.
//! Pooling deduplicates by identifier, keeping the best raw score seen per
//! path, and collects whatever profile attributes the index returned.

use crate::backend::RetrievalHit;
use crate::types::{CandidateId, CandidateRecord, RetrievalPath};
use std::collections::HashMap;

/// Per-category working set, private to that category's task
#[derive(Debug, Default)]
pub struct ResultPool {
    vector: HashMap<CandidateId, f32>,
    keyword: HashMap<CandidateId, f32>,
    records: HashMap<CandidateId, CandidateRecord>,
}

impl ResultPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one path's hits for one query variant into the pool
    pub fn add_hits(&mut self, path: RetrievalPath, hits: Vec<RetrievalHit>) {
        for hit in hits {
            let scores = match path {
                RetrievalPath::Vector => &mut self.vector,
                RetrievalPath::Keyword => &mut self.keyword,
            };
            scores
                .entry(hit.id.clone())
                .and_modify(|best| {
                    if hit.score > *best {
                        *best = hit.score;
                    }
                })
                .or_insert(hit.score);

            // Keep the first non-empty profile seen per id
            let record = self.records.entry(hit.id.clone()).or_insert_with(|| {
                CandidateRecord {
                    id: hit.id.clone(),
                    name: String::new(),
                    summary: String::new(),
                }
            });
            if record.name.is_empty() {
                if let Some(name) = &hit.name {
                    record.name = name.clone();
                }
            }
            if record.summary.is_empty() {
                if let Some(summary) = &hit.summary {
                    record.summary = summary.clone();
                }
            }
        }
    }

    pub fn vector_scores(&self) -> &HashMap<CandidateId, f32> {
        &self.vector
    }

    pub fn keyword_scores(&self) -> &HashMap<CandidateId, f32> {
        &self.keyword
    }

    pub fn records(&self) -> &HashMap<CandidateId, CandidateRecord> {
        &self.records
    }

    pub fn vector_len(&self) -> usize {
        self.vector.len()
    }

    pub fn keyword_len(&self) -> usize {
        self.keyword.len()
    }

    /// True when neither path found anything across all variants
    pub fn is_empty(&self) -> bool {
        self.vector.is_empty() && self.keyword.is_empty()
    }
}
