//! Job category definitions

use serde::{Deserialize, Serialize};

/// One job-role bucket with its query terms and keyword filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category name as the grading endpoint knows it (e.g., "tax_lawyer.yml")
    pub name: String,
    /// Base free-text query describing the role
    pub query: String,
    /// Extra keyword-path query terms; the base query is used when empty
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Hard filter: terms the profile text must contain
    #[serde(default)]
    pub required: Vec<String>,
    /// Hard filter: terms that disqualify a profile
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl CategoryConfig {
    /// Keyword-path query texts: configured keywords, or the base query
    pub fn keyword_texts(&self) -> Vec<String> {
        if self.keywords.is_empty() {
            vec![self.query.clone()]
        } else {
            self.keywords.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_texts_fall_back_to_query() {
        let category = CategoryConfig {
            name: "radiology.yml".to_string(),
            query: "board certified radiologist".to_string(),
            keywords: vec![],
            required: vec![],
            excluded: vec![],
        };
        assert_eq!(category.keyword_texts(), vec!["board certified radiologist"]);

        let with_keywords = CategoryConfig {
            keywords: vec!["radiologist".to_string(), "MRI".to_string()],
            ..category
        };
        assert_eq!(with_keywords.keyword_texts(), vec!["radiologist", "MRI"]);
    }
}
